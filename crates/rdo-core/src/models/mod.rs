pub mod compose_file;
pub mod config;
pub mod plan;
pub mod report;
pub mod service;

pub use compose_file::{ComposeFile, ComposeService};
pub use config::Config;
pub use plan::{DeployMode, DeploymentPlan};
pub use report::{Phase, Severity, StatusEvent, VerificationReport, VerificationResult};
pub use service::{ServiceRole, ServiceSpec};
