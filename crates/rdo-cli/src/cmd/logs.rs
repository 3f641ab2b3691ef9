use rdo_core::models::DeployMode;
use rdo_core::services::orchestrate::Orchestrator;
use rdo_core::services::runner::SystemRunner;

use crate::cmd::load_stack;

pub async fn run(service: Option<&str>, lines: u32) -> anyhow::Result<()> {
    let stack = load_stack(DeployMode::Basic, &[])?;
    let (tx, printer) = crate::output::spawn_printer();
    let orch = Orchestrator::new(SystemRunner, stack.config, stack.plan, tx);
    let result = orch.service_logs(service, lines).await;
    drop(orch);
    let _ = printer.await;

    print!("{}", result?);
    Ok(())
}
