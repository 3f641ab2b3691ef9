pub mod backup;
pub mod build;
pub mod cli;
pub mod deploy;
pub mod init;
pub mod logs;
pub mod status;
pub mod stop;
pub mod test;
pub mod validate;

use std::collections::HashMap;

use rdo_core::models::{ComposeFile, Config, DeployMode, DeploymentPlan};

/// Configuration input is a flat variable map: entries from `.env` (written
/// by `rdo init`, also read by compose itself), with the process environment
/// taking precedence. Collected once here; the core never reads the
/// environment on its own.
pub(crate) fn collect_env() -> HashMap<String, String> {
    let mut vars = HashMap::new();
    if let Ok(contents) = std::fs::read_to_string(".env") {
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                vars.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
    }
    vars.extend(std::env::vars());
    vars
}

pub(crate) struct Stack {
    pub config: Config,
    pub plan: DeploymentPlan,
}

/// Validate configuration and compute the activation plan. Side-effect-free:
/// everything after this is allowed to touch the world, nothing before.
pub(crate) fn load_stack(mode: DeployMode, profiles: &[&str]) -> anyhow::Result<Stack> {
    let vars = collect_env();
    let config = Config::from_env(&vars, mode)?;
    let compose = ComposeFile::load(&config.compose_file)?;
    let plan = DeploymentPlan::compute(&compose, profiles)?;
    Ok(Stack { config, plan })
}
