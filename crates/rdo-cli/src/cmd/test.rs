use rdo_core::models::DeployMode;
use rdo_core::services::orchestrate::{Orchestrator, PROBE_KEY, PROBE_VALUE};
use rdo_core::services::runner::SystemRunner;

use crate::cmd::load_stack;
use crate::output;

/// Replication probe against a running stack. A mismatch is a warning, not
/// a failure: asynchronous replication makes transient lag expected.
pub async fn run() -> anyhow::Result<()> {
    let stack = load_stack(DeployMode::Basic, &[])?;
    let (tx, printer) = output::spawn_printer();
    let mut orch = Orchestrator::new(SystemRunner, stack.config, stack.plan, tx);
    let result = orch.verify_replication(PROBE_KEY, PROBE_VALUE).await;
    drop(orch);
    let _ = printer.await;

    let report = result?;
    if report.all_matched() {
        output::success(&format!(
            "all {} replica(s) in sync",
            report.results.len()
        ));
    } else {
        output::warning(&format!(
            "{}/{} replica(s) in sync",
            report.matched_count(),
            report.results.len()
        ));
    }
    Ok(())
}
