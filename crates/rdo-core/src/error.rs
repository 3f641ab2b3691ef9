use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("missing required variables: {}", .0.join(", "))]
    MissingVars(Vec<String>),

    #[error("invalid value for {name}: {reason}")]
    MalformedValue { name: String, reason: String },

    #[error("compose file not found at {0}")]
    ComposeFileNotFound(PathBuf),

    #[error("invalid compose file: {0}")]
    InvalidComposeFile(String),

    #[error("dependency cycle involving service '{0}'")]
    DependencyCycle(String),

    #[error("image build failed: {0}")]
    Build(String),

    #[error("failed to activate '{service}': {reason}")]
    Activation { service: String, reason: String },

    #[error("service '{service}' not healthy after {attempts} attempts (last state: {last_state})")]
    HealthTimeout {
        service: String,
        attempts: u32,
        last_state: String,
    },

    #[error("docker operation failed: {0}")]
    Docker(String),

    #[error("compose operation failed: {0}")]
    Compose(String),

    #[error("redis command failed: {0}")]
    Redis(String),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
