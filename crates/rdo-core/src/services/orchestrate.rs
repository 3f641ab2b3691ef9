use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;

use crate::error::{OrchestratorError, Result};
use crate::models::config::Config;
use crate::models::plan::{DeploymentPlan, ALL_PROFILES};
use crate::models::report::{Phase, Severity, StatusEvent, VerificationReport, VerificationResult};
use crate::models::service::{ServiceRole, ServiceSpec};
use crate::services::compose::{self, PsEntry};
use crate::services::docker;
use crate::services::health::{HealthPolicy, HealthPoll};
use crate::services::redis::{self, ReplicationInfo};
use crate::services::runner::CommandRunner;

/// Throwaway key/value written to the primary to observe propagation.
/// Deleted unconditionally after verification.
pub const PROBE_KEY: &str = "test_key";
pub const PROBE_VALUE: &str = "replication_works";

const BGSAVE_POLL: HealthPolicy = HealthPolicy {
    max_attempts: 30,
    interval: Duration::from_secs(2),
};

#[derive(Debug, Clone)]
pub struct StackStatus {
    pub services: Vec<PsEntry>,
    pub replication: Option<ReplicationInfo>,
}

/// Sequences build, activate, health-gate, verify, and report for one plan.
///
/// Single-threaded and strictly sequential: each step completes or fails
/// before the next begins. Progress is emitted as status events over an
/// unbounded channel; the frontend decides how to render them.
pub struct Orchestrator<R: CommandRunner> {
    runner: R,
    config: Config,
    plan: DeploymentPlan,
    phase: Phase,
    events: mpsc::UnboundedSender<StatusEvent>,
}

impl<R: CommandRunner> Orchestrator<R> {
    pub fn new(
        runner: R,
        config: Config,
        plan: DeploymentPlan,
        events: mpsc::UnboundedSender<StatusEvent>,
    ) -> Self {
        Self {
            runner,
            config,
            plan,
            phase: Phase::Init,
            events,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn plan(&self) -> &DeploymentPlan {
        &self.plan
    }

    fn set_phase(&mut self, phase: Phase) {
        tracing::debug!(from = %self.phase, to = %phase, "phase transition");
        self.phase = phase;
    }

    fn emit(&self, severity: Severity, message: impl Into<String>) {
        let _ = self.events.send(StatusEvent {
            severity,
            message: message.into(),
        });
    }

    /// Full flow: build, activate in dependency order, health-gate every
    /// service, verify replication when the plan has replicas. Any error
    /// moves the invocation to `Failed`; services already started stay up.
    pub async fn deploy(&mut self) -> Result<VerificationReport> {
        match self.deploy_inner().await {
            Ok(report) => Ok(report),
            Err(e) => {
                self.set_phase(Phase::Failed);
                Err(e)
            }
        }
    }

    async fn deploy_inner(&mut self) -> Result<VerificationReport> {
        self.set_phase(Phase::Validated);
        let names: Vec<&str> = self
            .plan
            .services()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        self.emit(
            Severity::Info,
            format!("plan: {} service(s): {}", names.len(), names.join(", ")),
        );

        let revision = docker::source_revision(&self.runner).await;
        self.emit(
            Severity::Info,
            format!("building image '{}'", self.config.image_name),
        );
        let image =
            docker::build_image(&self.runner, &self.config.image_name, revision.as_deref()).await?;
        self.set_phase(Phase::Built);
        self.emit(Severity::Success, format!("built {image}"));

        self.activate().await?;
        self.await_all_healthy().await?;

        let report = if self.plan.replicas().count() > 0 {
            self.verify_replication(PROBE_KEY, PROBE_VALUE).await?
        } else {
            self.set_phase(Phase::Reported);
            VerificationReport::default()
        };
        self.set_phase(Phase::Done);
        self.emit(Severity::Success, "deployment complete");
        Ok(report)
    }

    /// Start every planned service, one at a time, in plan order. A failure
    /// aborts the remaining activations but does not retract services that
    /// already started; the operator runs teardown.
    pub async fn activate(&mut self) -> Result<()> {
        self.set_phase(Phase::Activating);
        let services = self.plan.services().to_vec();
        for spec in &services {
            self.emit(
                Severity::Info,
                format!("starting '{}' ({})", spec.name, spec.role),
            );
            compose::up_service(
                &self.runner,
                &self.config.compose_file,
                self.plan.profiles(),
                &spec.name,
            )
            .await?;
        }
        Ok(())
    }

    /// Health-gate every planned service. The first timeout aborts the
    /// remaining waits, after dumping that service's recent logs once.
    pub async fn await_all_healthy(&mut self) -> Result<()> {
        self.set_phase(Phase::AwaitingHealth);
        let services = self.plan.services().to_vec();
        for spec in &services {
            let policy = self.policy_for(spec.role);
            self.emit(
                Severity::Info,
                format!(
                    "waiting for '{}' (up to {} attempts at {}s intervals)",
                    spec.name,
                    policy.max_attempts,
                    policy.interval.as_secs_f32()
                ),
            );
            let poll = HealthPoll::new(spec.name.clone(), policy);
            match poll.run(|| self.probe(spec)).await {
                Ok(attempt) => self.emit(
                    Severity::Success,
                    format!("'{}' healthy after {attempt} attempt(s)", spec.name),
                ),
                Err(e) => {
                    self.dump_diagnostics(&spec.name, &spec.container).await;
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Write the probe value to the primary, wait the propagation delay,
    /// read it back from every replica. Mismatches only warn; the probe key
    /// is removed from the primary unconditionally, including on mismatch
    /// or when a replica is unreachable.
    pub async fn verify_replication(
        &mut self,
        key: &str,
        value: &str,
    ) -> Result<VerificationReport> {
        self.set_phase(Phase::Verifying);
        let primary = self.primary()?;
        let replicas: Vec<ServiceSpec> = self.plan.replicas().cloned().collect();

        self.emit(
            Severity::Info,
            format!("writing probe key '{key}' to '{}'", primary.name),
        );
        if let Err(e) = redis::set(
            &self.runner,
            &primary.container,
            &self.config.password,
            key,
            value,
        )
        .await
        {
            let _ = redis::del(&self.runner, &primary.container, &self.config.password, key).await;
            return Err(e);
        }

        tokio::time::sleep(self.config.propagation_delay).await;

        let mut results = Vec::new();
        for replica in &replicas {
            let observed = redis::get(
                &self.runner,
                &replica.container,
                &self.config.password,
                key,
            )
            .await
            .ok()
            .flatten();
            let matched = observed.as_deref() == Some(value);
            if matched {
                self.emit(
                    Severity::Success,
                    format!("'{}' replicated the probe value", replica.name),
                );
            } else {
                self.emit(
                    Severity::Warning,
                    format!(
                        "'{}' did not replicate the probe value (observed: {})",
                        replica.name,
                        observed.as_deref().unwrap_or("<nothing>")
                    ),
                );
            }
            results.push(VerificationResult {
                replica: replica.name.clone(),
                expected: value.to_string(),
                observed,
                matched,
            });
        }

        if let Err(e) =
            redis::del(&self.runner, &primary.container, &self.config.password, key).await
        {
            self.emit(Severity::Warning, format!("failed to remove probe key: {e}"));
        }

        self.set_phase(Phase::Reported);
        Ok(VerificationReport { results })
    }

    /// Stop and remove every service associated with the plan. All known
    /// profiles are passed so nothing stays out of scope; safe to call
    /// repeatedly or after a partial activation.
    pub async fn teardown(&self) -> Result<()> {
        let profiles = all_profiles();
        compose::down(&self.runner, &self.config.compose_file, &profiles).await?;
        self.emit(Severity::Success, "stack stopped and removed");
        Ok(())
    }

    pub async fn status(&self) -> Result<StackStatus> {
        let profiles = all_profiles();
        let services = compose::ps(&self.runner, &self.config.compose_file, &profiles).await?;
        let mut replication = None;
        if let Some(primary) = self.plan.primary() {
            let running = docker::container_running(&self.runner, &primary.container)
                .await
                .unwrap_or(false);
            if running {
                replication = redis::replication_info(
                    &self.runner,
                    &primary.container,
                    &self.config.password,
                )
                .await
                .ok();
            }
        }
        Ok(StackStatus {
            services,
            replication,
        })
    }

    /// Trigger a background save on the primary, wait for it to finish, and
    /// copy the dump file to a timestamped path under `dest_dir`.
    pub async fn backup(&self, dest_dir: &Path) -> Result<PathBuf> {
        let primary = self.primary()?;
        if !redis::ping(&self.runner, &primary.container, &self.config.password).await? {
            return Err(OrchestratorError::Redis(
                "primary is not responding; cannot back up".into(),
            ));
        }
        std::fs::create_dir_all(dest_dir)?;

        self.emit(Severity::Info, "triggering background save on primary");
        redis::bgsave(&self.runner, &primary.container, &self.config.password).await?;
        let poll = HealthPoll::new(primary.name.clone(), BGSAVE_POLL);
        poll.run(|| async {
            redis::bgsave_in_progress(&self.runner, &primary.container, &self.config.password)
                .await
                .map(|in_progress| !in_progress)
        })
        .await?;

        let dest = dest_dir.join(format!(
            "redis-{}.rdb",
            Utc::now().format("%Y%m%d-%H%M%S")
        ));
        docker::copy_from(
            &self.runner,
            &primary.container,
            "/data/dump.rdb",
            &dest.to_string_lossy(),
        )
        .await?;
        self.emit(
            Severity::Success,
            format!("backup written to {}", dest.display()),
        );
        Ok(dest)
    }

    /// Tail the container log of one planned service (the primary when no
    /// name is given).
    pub async fn service_logs(&self, service: Option<&str>, lines: u32) -> Result<String> {
        let container = match service {
            None => self.primary()?.container,
            Some(name) => self
                .plan
                .services()
                .iter()
                .find(|s| s.name == name)
                .map(|s| s.container.clone())
                .ok_or_else(|| {
                    OrchestratorError::Docker(format!("unknown service '{name}'"))
                })?,
        };
        docker::logs_tail(&self.runner, &container, lines).await
    }

    fn primary(&self) -> Result<ServiceSpec> {
        self.plan
            .primary()
            .cloned()
            .ok_or_else(|| OrchestratorError::Redis("deployment plan has no primary".into()))
    }

    fn policy_for(&self, role: ServiceRole) -> HealthPolicy {
        let interval = match role {
            ServiceRole::App => self.config.app_health_interval,
            _ => self.config.health_interval,
        };
        HealthPolicy {
            max_attempts: self.config.health_max_attempts,
            interval,
        }
    }

    async fn probe(&self, spec: &ServiceSpec) -> Result<bool> {
        match spec.role {
            ServiceRole::Primary | ServiceRole::Replica => {
                redis::ping(&self.runner, &spec.container, &self.config.password).await
            }
            ServiceRole::Sentinel => redis::sentinel_ping(&self.runner, &spec.container).await,
            ServiceRole::App | ServiceRole::LoadBalancer => {
                docker::container_running(&self.runner, &spec.container).await
            }
        }
    }

    /// Best-effort log tail on health timeout. Emitted once per failed
    /// service, right before the timeout propagates.
    async fn dump_diagnostics(&self, service: &str, container: &str) {
        self.emit(
            Severity::Warning,
            format!(
                "'{}' failed its health check; last {} log lines:",
                service, self.config.log_tail_lines
            ),
        );
        match docker::logs_tail(&self.runner, container, self.config.log_tail_lines).await {
            Ok(logs) if !logs.trim().is_empty() => {
                for line in logs.lines() {
                    self.emit(Severity::Info, format!("  {line}"));
                }
            }
            Ok(_) => self.emit(Severity::Warning, "no log output captured"),
            Err(e) => self.emit(Severity::Warning, format!("could not read logs: {e}")),
        }
    }
}

fn all_profiles() -> Vec<String> {
    ALL_PROFILES.iter().map(|p| p.to_string()).collect()
}
