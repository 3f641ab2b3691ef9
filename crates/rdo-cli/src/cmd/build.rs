use rdo_core::models::DeployMode;
use rdo_core::services::docker;
use rdo_core::services::runner::SystemRunner;

use crate::cmd::load_stack;
use crate::output;

pub async fn run() -> anyhow::Result<()> {
    let stack = load_stack(DeployMode::Basic, &[])?;
    let revision = docker::source_revision(&SystemRunner).await;
    output::info(&format!("building image '{}'", stack.config.image_name));
    let image =
        docker::build_image(&SystemRunner, &stack.config.image_name, revision.as_deref()).await?;
    output::success(&format!("built {image}"));
    Ok(())
}
