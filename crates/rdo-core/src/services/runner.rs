use std::future::Future;

use tokio::process::Command;

use crate::error::{OrchestratorError, Result};

/// Captured outcome of one external command.
#[derive(Debug, Clone)]
pub struct CmdOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// The orchestrator's only way of effecting or observing the world:
/// run a named executable and capture exit code, stdout, and stderr.
/// Behind a trait so the engine can be exercised against a scripted fake.
pub trait CommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
    ) -> impl Future<Output = Result<CmdOutput>> + Send;
}

/// Runs commands through `tokio::process`. A non-zero exit is not an error
/// here; callers decide what a failed command means.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CmdOutput> {
        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| OrchestratorError::Spawn {
                program: program.to_string(),
                source: e,
            })?;
        Ok(CmdOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let out = SystemRunner.run("sh", &["-c", "echo hello"]).await.unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn nonzero_exit_is_not_an_error() {
        let out = SystemRunner.run("sh", &["-c", "exit 3"]).await.unwrap();
        assert!(!out.success());
        assert_eq!(out.code, 3);
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let err = SystemRunner
            .run("rdo-no-such-program", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Spawn { .. }));
    }
}
