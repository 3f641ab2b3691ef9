use chrono::Utc;
use serde::Deserialize;

use crate::error::{OrchestratorError, Result};
use crate::services::runner::{CmdOutput, CommandRunner};

/// A named, tagged image produced by a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub name: String,
    pub tag: String,
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.tag)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContainerState {
    #[serde(rename = "Running")]
    pub running: bool,
    #[serde(rename = "Status")]
    pub status: String,
}

async fn run_docker<R: CommandRunner>(runner: &R, args: &[&str]) -> Result<CmdOutput> {
    runner.run("docker", args).await
}

/// Build and tag the image, stamping build timestamp and source revision
/// into the image metadata. Also moves the `latest` tag so the composition
/// descriptor picks up the fresh build.
pub async fn build_image<R: CommandRunner>(
    runner: &R,
    image_name: &str,
    source_revision: Option<&str>,
) -> Result<ImageRef> {
    let tag = Utc::now().format("%Y%m%d-%H%M%S").to_string();
    let image = ImageRef {
        name: image_name.to_string(),
        tag,
    };
    let tagged = image.to_string();
    let timestamp_arg = format!("BUILD_TIMESTAMP={}", Utc::now().to_rfc3339());
    let revision_arg = format!("SOURCE_REVISION={}", source_revision.unwrap_or("unknown"));

    let out = run_docker(
        runner,
        &[
            "build",
            "-t",
            &tagged,
            "--build-arg",
            &timestamp_arg,
            "--build-arg",
            &revision_arg,
            ".",
        ],
    )
    .await?;
    if !out.success() {
        return Err(OrchestratorError::Build(format!(
            "docker build exited {}: {}",
            out.code,
            out.stderr.trim()
        )));
    }

    let latest = format!("{image_name}:latest");
    let out = run_docker(runner, &["tag", &tagged, &latest]).await?;
    if !out.success() {
        return Err(OrchestratorError::Build(format!(
            "docker tag exited {}: {}",
            out.code,
            out.stderr.trim()
        )));
    }
    Ok(image)
}

/// Current source revision for build stamping, if the working tree is a
/// git checkout.
pub async fn source_revision<R: CommandRunner>(runner: &R) -> Option<String> {
    let out = runner
        .run("git", &["rev-parse", "--short", "HEAD"])
        .await
        .ok()?;
    if out.success() && !out.stdout.trim().is_empty() {
        Some(out.stdout.trim().to_string())
    } else {
        None
    }
}

/// Last `lines` of a container's combined log output. Docker writes container
/// logs to stderr as well; both streams are returned.
pub async fn logs_tail<R: CommandRunner>(
    runner: &R,
    container: &str,
    lines: u32,
) -> Result<String> {
    let tail = lines.to_string();
    let out = run_docker(runner, &["logs", "--tail", &tail, container]).await?;
    if !out.success() {
        return Err(OrchestratorError::Docker(format!(
            "docker logs {container} exited {}: {}",
            out.code,
            out.stderr.trim()
        )));
    }
    let mut combined = out.stdout;
    if !out.stderr.is_empty() {
        combined.push_str(&out.stderr);
    }
    Ok(combined)
}

/// Inspect a container's state. `Ok(None)` when the container does not exist.
pub async fn container_state<R: CommandRunner>(
    runner: &R,
    container: &str,
) -> Result<Option<ContainerState>> {
    let out = run_docker(
        runner,
        &["inspect", "--format", "{{json .State}}", container],
    )
    .await?;
    if !out.success() {
        return Ok(None);
    }
    let state: ContainerState = serde_json::from_str(out.stdout.trim())?;
    Ok(Some(state))
}

pub async fn container_running<R: CommandRunner>(runner: &R, container: &str) -> Result<bool> {
    Ok(container_state(runner, container)
        .await?
        .map(|s| s.running)
        .unwrap_or(false))
}

/// Copy a file out of a container.
pub async fn copy_from<R: CommandRunner>(
    runner: &R,
    container: &str,
    source: &str,
    destination: &str,
) -> Result<()> {
    let from = format!("{container}:{source}");
    let out = run_docker(runner, &["cp", &from, destination]).await?;
    if !out.success() {
        return Err(OrchestratorError::Docker(format!(
            "docker cp exited {}: {}",
            out.code,
            out.stderr.trim()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_ref_display() {
        let image = ImageRef {
            name: "rdo-redis".into(),
            tag: "20260829-120000".into(),
        };
        assert_eq!(image.to_string(), "rdo-redis:20260829-120000");
    }

    #[test]
    fn container_state_parses_inspect_json() {
        let state: ContainerState =
            serde_json::from_str(r#"{"Running":true,"Status":"running","Pid":42}"#).unwrap();
        assert!(state.running);
        assert_eq!(state.status, "running");
    }
}
