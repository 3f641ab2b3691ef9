use rdo_core::models::DeployMode;
use rdo_core::services::orchestrate::Orchestrator;
use rdo_core::services::runner::SystemRunner;

use crate::cmd::load_stack;
use crate::output;

pub async fn run() -> anyhow::Result<()> {
    let stack = load_stack(DeployMode::Basic, &[])?;
    let (tx, printer) = output::spawn_printer();
    let orch = Orchestrator::new(SystemRunner, stack.config, stack.plan, tx);
    let result = orch.status().await;
    drop(orch);
    let _ = printer.await;

    let status = result?;
    if status.services.is_empty() {
        output::info("no services running");
        return Ok(());
    }
    let width = status
        .services
        .iter()
        .map(|s| s.service.len())
        .max()
        .unwrap_or(0);
    for entry in &status.services {
        output::info(&format!(
            "{:width$}  {}  {}",
            entry.service, entry.state, entry.status
        ));
    }
    match status.replication {
        Some(info) => output::success(&format!(
            "primary role: {}, connected replicas: {}",
            info.role, info.connected_replicas
        )),
        None => output::warning("primary is not running; no replication info"),
    }
    Ok(())
}
