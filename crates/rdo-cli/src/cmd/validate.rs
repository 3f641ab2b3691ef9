use rdo_core::models::DeployMode;

use crate::cmd::load_stack;
use crate::output;

pub fn run(mode: DeployMode) -> anyhow::Result<()> {
    let stack = load_stack(mode, mode.profiles())?;
    output::success(&format!(
        "configuration valid for mode '{mode}': {} service(s) planned",
        stack.plan.services().len()
    ));
    for spec in stack.plan.services() {
        output::info(&format!("  {} ({})", spec.name, spec.role));
    }
    if let Some(quorum) = stack.config.sentinel_quorum {
        output::info(&format!("sentinel quorum: {quorum}"));
    }
    if which::which("docker").is_err() {
        output::warning("docker not found on PATH; deployment will fail until it is installed");
    }
    Ok(())
}
