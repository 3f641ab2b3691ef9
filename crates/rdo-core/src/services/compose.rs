use std::path::Path;

use serde::Deserialize;

use crate::error::{OrchestratorError, Result};
use crate::services::runner::{CmdOutput, CommandRunner};

/// One row of `docker compose ps --format json`.
#[derive(Debug, Clone, Deserialize)]
pub struct PsEntry {
    #[serde(rename = "Service", default)]
    pub service: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "State", default)]
    pub state: String,
    #[serde(rename = "Status", default)]
    pub status: String,
}

fn base_args<'a>(file: &'a str, profiles: &'a [String]) -> Vec<&'a str> {
    let mut args = vec!["compose", "-f", file];
    for profile in profiles {
        args.push("--profile");
        args.push(profile.as_str());
    }
    args
}

async fn run_compose<R: CommandRunner>(runner: &R, args: &[&str]) -> Result<CmdOutput> {
    runner.run("docker", args).await
}

/// Start one service. `--no-deps` keeps the activation order the plan's,
/// not compose's.
pub async fn up_service<R: CommandRunner>(
    runner: &R,
    file: &Path,
    profiles: &[String],
    service: &str,
) -> Result<()> {
    let file = file.to_string_lossy();
    let mut args = base_args(&file, profiles);
    args.extend_from_slice(&["up", "-d", "--no-deps", service]);
    let out = run_compose(runner, &args).await?;
    if !out.success() {
        return Err(OrchestratorError::Activation {
            service: service.to_string(),
            reason: format!("exit {}: {}", out.code, out.stderr.trim()),
        });
    }
    Ok(())
}

/// Stop and remove everything associated with the plan. Idempotent: a stack
/// that is already gone is not an error.
pub async fn down<R: CommandRunner>(runner: &R, file: &Path, profiles: &[String]) -> Result<()> {
    let file = file.to_string_lossy();
    let mut args = base_args(&file, profiles);
    args.extend_from_slice(&["down", "--remove-orphans"]);
    let out = run_compose(runner, &args).await?;
    if !out.success() {
        let stderr = out.stderr.to_lowercase();
        if stderr.contains("no such") || stderr.contains("not found") {
            return Ok(());
        }
        return Err(OrchestratorError::Compose(format!(
            "docker compose down exited {}: {}",
            out.code,
            out.stderr.trim()
        )));
    }
    Ok(())
}

pub async fn ps<R: CommandRunner>(
    runner: &R,
    file: &Path,
    profiles: &[String],
) -> Result<Vec<PsEntry>> {
    let file = file.to_string_lossy();
    let mut args = base_args(&file, profiles);
    args.extend_from_slice(&["ps", "-a", "--format", "json"]);
    let out = run_compose(runner, &args).await?;
    if !out.success() {
        return Err(OrchestratorError::Compose(format!(
            "docker compose ps exited {}: {}",
            out.code,
            out.stderr.trim()
        )));
    }
    parse_ps_output(&out.stdout)
}

/// Newer compose emits one JSON object per line; older versions emit a
/// single JSON array. Accept both.
pub fn parse_ps_output(stdout: &str) -> Result<Vec<PsEntry>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }
    let mut entries = Vec::new();
    for line in trimmed.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(line)?);
    }
    Ok(entries)
}
