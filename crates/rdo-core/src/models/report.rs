use serde::{Deserialize, Serialize};

/// Per-invocation lifecycle. Transitions are strictly forward except
/// `Failed`, which absorbs from any non-terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Init,
    Validated,
    Built,
    Activating,
    AwaitingHealth,
    Verifying,
    Reported,
    Done,
    Failed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Init => "init",
            Phase::Validated => "validated",
            Phase::Built => "built",
            Phase::Activating => "activating",
            Phase::AwaitingHealth => "awaiting-health",
            Phase::Verifying => "verifying",
            Phase::Reported => "reported",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// A human-readable progress line emitted by the engine and printed by the
/// frontend with a severity prefix.
#[derive(Debug, Clone)]
pub struct StatusEvent {
    pub severity: Severity,
    pub message: String,
}

/// Outcome of the probe read-back on one replica. Report-only: never gates
/// deployment success.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub replica: String,
    pub expected: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed: Option<String>,
    pub matched: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub results: Vec<VerificationResult>,
}

impl VerificationReport {
    pub fn all_matched(&self) -> bool {
        self.results.iter().all(|r| r.matched)
    }

    pub fn matched_count(&self) -> usize {
        self.results.iter().filter(|r| r.matched).count()
    }
}
