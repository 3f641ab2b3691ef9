pub mod compose;
pub mod docker;
pub mod health;
pub mod orchestrate;
pub mod redis;
pub mod runner;
