use rdo_core::models::DeployMode;
use rdo_core::services::orchestrate::Orchestrator;
use rdo_core::services::runner::SystemRunner;

use crate::cmd::load_stack;
use crate::output;

pub async fn run(mode: DeployMode, profiles: &[&str]) -> anyhow::Result<()> {
    let stack = load_stack(mode, profiles)?;
    let (tx, printer) = output::spawn_printer();
    let mut orch = Orchestrator::new(SystemRunner, stack.config, stack.plan, tx);
    let result = orch.deploy().await;
    drop(orch);
    let _ = printer.await;

    let report = result?;
    if !report.results.is_empty() {
        output::info(&format!(
            "replication: {}/{} replicas in sync",
            report.matched_count(),
            report.results.len()
        ));
    }
    Ok(())
}
