use rdo_core::models::DeployMode;
use rdo_core::services::redis;

use crate::cmd::load_stack;

pub async fn run() -> anyhow::Result<()> {
    let stack = load_stack(DeployMode::Basic, &[])?;
    let primary = stack
        .plan
        .primary()
        .ok_or_else(|| anyhow::anyhow!("plan has no primary service"))?;
    let status = redis::attach_cli(&primary.container, &stack.config.password).await?;
    if !status.success() {
        std::process::exit(status.code().unwrap_or(1));
    }
    Ok(())
}
