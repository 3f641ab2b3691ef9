use rdo_core::models::DeployMode;
use rdo_core::services::orchestrate::Orchestrator;
use rdo_core::services::runner::SystemRunner;

use crate::cmd::load_stack;
use crate::output;

pub async fn run() -> anyhow::Result<()> {
    let stack = load_stack(DeployMode::Basic, &[])?;
    let (tx, printer) = output::spawn_printer();
    let orch = Orchestrator::new(SystemRunner, stack.config, stack.plan, tx);
    let result = orch.teardown().await;
    drop(orch);
    let _ = printer.await;
    result?;
    Ok(())
}
