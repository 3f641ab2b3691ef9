use std::sync::LazyLock;

use regex::Regex;

use crate::error::{OrchestratorError, Result};
use crate::services::runner::{CmdOutput, CommandRunner};

const SENTINEL_PORT: &str = "26379";

static ROLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"role:(\w+)").unwrap());
static CONNECTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"connected_slaves:(\d+)").unwrap());
static BGSAVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rdb_bgsave_in_progress:(\d+)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationInfo {
    pub role: String,
    pub connected_replicas: u32,
}

async fn redis_cli<R: CommandRunner>(
    runner: &R,
    container: &str,
    password: &str,
    command: &[&str],
) -> Result<CmdOutput> {
    let mut args = vec![
        "exec",
        container,
        "redis-cli",
        "--no-auth-warning",
        "-a",
        password,
    ];
    args.extend_from_slice(command);
    runner.run("docker", &args).await
}

/// Health predicate for storage-role services.
pub async fn ping<R: CommandRunner>(runner: &R, container: &str, password: &str) -> Result<bool> {
    let out = redis_cli(runner, container, password, &["ping"]).await?;
    Ok(out.success() && out.stdout.trim() == "PONG")
}

/// Sentinels listen on their own port and take no auth.
pub async fn sentinel_ping<R: CommandRunner>(runner: &R, container: &str) -> Result<bool> {
    let out = runner
        .run(
            "docker",
            &["exec", container, "redis-cli", "-p", SENTINEL_PORT, "ping"],
        )
        .await?;
    Ok(out.success() && out.stdout.trim() == "PONG")
}

pub async fn set<R: CommandRunner>(
    runner: &R,
    container: &str,
    password: &str,
    key: &str,
    value: &str,
) -> Result<()> {
    let out = redis_cli(runner, container, password, &["set", key, value]).await?;
    if !out.success() || out.stdout.trim() != "OK" {
        return Err(OrchestratorError::Redis(format!(
            "set {key} on {container} failed: {}",
            pick_detail(&out)
        )));
    }
    Ok(())
}

/// Read a key; `Ok(None)` when the key is absent or the instance is
/// unreachable (verification treats both as a mismatch, not an error).
pub async fn get<R: CommandRunner>(
    runner: &R,
    container: &str,
    password: &str,
    key: &str,
) -> Result<Option<String>> {
    let out = redis_cli(runner, container, password, &["get", key]).await?;
    if !out.success() {
        return Ok(None);
    }
    let value = out.stdout.trim();
    if value.is_empty() {
        Ok(None)
    } else {
        Ok(Some(value.to_string()))
    }
}

pub async fn del<R: CommandRunner>(
    runner: &R,
    container: &str,
    password: &str,
    key: &str,
) -> Result<()> {
    let out = redis_cli(runner, container, password, &["del", key]).await?;
    if !out.success() {
        return Err(OrchestratorError::Redis(format!(
            "del {key} on {container} failed: {}",
            pick_detail(&out)
        )));
    }
    Ok(())
}

pub async fn replication_info<R: CommandRunner>(
    runner: &R,
    container: &str,
    password: &str,
) -> Result<ReplicationInfo> {
    let out = redis_cli(runner, container, password, &["info", "replication"]).await?;
    if !out.success() {
        return Err(OrchestratorError::Redis(format!(
            "info replication on {container} failed: {}",
            pick_detail(&out)
        )));
    }
    Ok(parse_replication_info(&out.stdout))
}

/// `INFO replication` comes back CRLF-terminated; the regexes don't care.
pub fn parse_replication_info(text: &str) -> ReplicationInfo {
    let role = ROLE_RE
        .captures(text)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let connected_replicas = CONNECTED_RE
        .captures(text)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0);
    ReplicationInfo {
        role,
        connected_replicas,
    }
}

pub async fn bgsave<R: CommandRunner>(runner: &R, container: &str, password: &str) -> Result<()> {
    let out = redis_cli(runner, container, password, &["bgsave"]).await?;
    if !out.success() {
        return Err(OrchestratorError::Redis(format!(
            "bgsave on {container} failed: {}",
            pick_detail(&out)
        )));
    }
    Ok(())
}

/// Whether a background save is still running, per `INFO persistence`.
pub async fn bgsave_in_progress<R: CommandRunner>(
    runner: &R,
    container: &str,
    password: &str,
) -> Result<bool> {
    let out = redis_cli(runner, container, password, &["info", "persistence"]).await?;
    if !out.success() {
        return Err(OrchestratorError::Redis(format!(
            "info persistence on {container} failed: {}",
            pick_detail(&out)
        )));
    }
    Ok(BGSAVE_RE
        .captures(&out.stdout)
        .map(|c| &c[1] == "1")
        .unwrap_or(false))
}

/// Attach an interactive redis-cli with inherited stdio. Bypasses the
/// runner seam on purpose: an interactive session has no output to capture.
pub async fn attach_cli(container: &str, password: &str) -> Result<std::process::ExitStatus> {
    tokio::process::Command::new("docker")
        .args([
            "exec",
            "-it",
            container,
            "redis-cli",
            "--no-auth-warning",
            "-a",
            password,
        ])
        .stdin(std::process::Stdio::inherit())
        .stdout(std::process::Stdio::inherit())
        .stderr(std::process::Stdio::inherit())
        .status()
        .await
        .map_err(|e| OrchestratorError::Redis(format!("failed to attach redis-cli: {e}")))
}

fn pick_detail(out: &CmdOutput) -> String {
    let stderr = out.stderr.trim();
    if stderr.is_empty() {
        format!("exit {}", out.code)
    } else {
        stderr.to_string()
    }
}
