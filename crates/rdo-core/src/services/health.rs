use std::future::Future;
use std::time::Duration;

use crate::error::{OrchestratorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

/// Bounded fixed-interval poll of a boolean health predicate.
///
/// The first success short-circuits; exhausting `max_attempts` yields a
/// timeout error carrying the last observed state. A probe error counts as
/// a failed attempt, not an abort — the target may simply not exist yet.
#[derive(Debug, Clone)]
pub struct HealthPoll {
    pub service: String,
    pub policy: HealthPolicy,
}

impl HealthPoll {
    pub fn new(service: impl Into<String>, policy: HealthPolicy) -> Self {
        Self {
            service: service.into(),
            policy,
        }
    }

    /// Run the poll; returns the attempt number that succeeded (1-based).
    pub async fn run<F, Fut>(&self, mut probe: F) -> Result<u32>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let mut last_state = String::from("no response");
        for attempt in 1..=self.policy.max_attempts {
            match probe().await {
                Ok(true) => {
                    tracing::debug!(service = %self.service, attempt, "healthy");
                    return Ok(attempt);
                }
                Ok(false) => last_state = "not ready".to_string(),
                Err(e) => last_state = e.to_string(),
            }
            if attempt < self.policy.max_attempts {
                tokio::time::sleep(self.policy.interval).await;
            }
        }
        Err(OrchestratorError::HealthTimeout {
            service: self.service.clone(),
            attempts: self.policy.max_attempts,
            last_state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast_policy(max_attempts: u32) -> HealthPolicy {
        HealthPolicy {
            max_attempts,
            interval: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn succeeds_on_exact_attempt() {
        let calls = Cell::new(0u32);
        let poll = HealthPoll::new("redis-primary", fast_policy(10));
        let attempt = poll
            .run(|| {
                calls.set(calls.get() + 1);
                let healthy = calls.get() >= 4;
                async move { Ok(healthy) }
            })
            .await
            .unwrap();
        assert_eq!(attempt, 4);
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn first_success_short_circuits() {
        let calls = Cell::new(0u32);
        let poll = HealthPoll::new("redis-primary", fast_policy(30));
        let attempt = poll
            .run(|| {
                calls.set(calls.get() + 1);
                async { Ok(true) }
            })
            .await
            .unwrap();
        assert_eq!(attempt, 1);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn exhausts_exactly_max_attempts() {
        let calls = Cell::new(0u32);
        let poll = HealthPoll::new("redis-primary", fast_policy(5));
        let err = poll
            .run(|| {
                calls.set(calls.get() + 1);
                async { Ok(false) }
            })
            .await
            .unwrap_err();
        assert_eq!(calls.get(), 5);
        match err {
            OrchestratorError::HealthTimeout {
                service,
                attempts,
                last_state,
            } => {
                assert_eq!(service, "redis-primary");
                assert_eq!(attempts, 5);
                assert_eq!(last_state, "not ready");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn probe_error_counts_as_failed_attempt() {
        let calls = Cell::new(0u32);
        let poll = HealthPoll::new("sentinel-1", fast_policy(3));
        let err = poll
            .run(|| {
                calls.set(calls.get() + 1);
                async {
                    Err(OrchestratorError::Redis("connection refused".into()))
                }
            })
            .await
            .unwrap_err();
        assert_eq!(calls.get(), 3);
        assert!(matches!(
            err,
            OrchestratorError::HealthTimeout { ref last_state, .. }
                if last_state.contains("connection refused")
        ));
    }

    #[tokio::test]
    async fn bounded_wall_clock() {
        let poll = HealthPoll::new("redis-primary", fast_policy(10));
        let start = std::time::Instant::now();
        let _ = poll.run(|| async { Ok(false) }).await;
        // 10 attempts at 1ms must finish well within the test timeout;
        // generous bound to avoid flaking on slow machines.
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
