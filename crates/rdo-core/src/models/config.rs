use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::error::{OrchestratorError, Result};
use crate::models::plan::DeployMode;

static MAXMEMORY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\d+(kb|mb|gb)$").unwrap());

const MAXMEMORY_POLICIES: &[&str] = &[
    "noeviction",
    "allkeys-lru",
    "allkeys-lfu",
    "allkeys-random",
    "volatile-lru",
    "volatile-lfu",
    "volatile-random",
    "volatile-ttl",
];

/// Validated configuration, built once from an explicit variable map and
/// threaded through every call. The core never reads the process
/// environment directly.
#[derive(Debug, Clone)]
pub struct Config {
    pub password: String,
    pub port: u16,
    pub maxmemory: String,
    pub maxmemory_policy: String,
    pub image_name: String,
    pub compose_file: PathBuf,
    pub replica_count: u32,
    pub sentinel_quorum: Option<u32>,
    pub health_max_attempts: u32,
    /// Poll interval for storage-role services.
    pub health_interval: Duration,
    /// App-role services start slower and poll at a longer interval.
    pub app_health_interval: Duration,
    /// Fixed delay between the probe write and the replica read-back.
    pub propagation_delay: Duration,
    pub log_tail_lines: u32,
}

impl Config {
    /// Validate and build a configuration for the given mode.
    ///
    /// Pure: performs no side effects, reports every missing variable at
    /// once, and rejects malformed values before any build or deploy step
    /// can run.
    pub fn from_env(vars: &HashMap<String, String>, mode: DeployMode) -> Result<Config> {
        let mut required = vec!["REDIS_PASSWORD", "REDIS_MAXMEMORY"];
        if mode.needs_sentinel() {
            required.push("SENTINEL_QUORUM");
        }
        let missing: Vec<String> = required
            .iter()
            .filter(|name| vars.get(**name).map_or(true, |v| v.is_empty()))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(OrchestratorError::MissingVars(missing));
        }

        let maxmemory = vars["REDIS_MAXMEMORY"].clone();
        if !MAXMEMORY_RE.is_match(&maxmemory) {
            return Err(OrchestratorError::MalformedValue {
                name: "REDIS_MAXMEMORY".into(),
                reason: format!("'{maxmemory}' does not match <digits><kb|mb|gb>"),
            });
        }

        let maxmemory_policy =
            lookup(vars, "REDIS_MAXMEMORY_POLICY").unwrap_or_else(|| "allkeys-lru".to_string());
        if !MAXMEMORY_POLICIES.contains(&maxmemory_policy.as_str()) {
            return Err(OrchestratorError::MalformedValue {
                name: "REDIS_MAXMEMORY_POLICY".into(),
                reason: format!("'{maxmemory_policy}' is not a known eviction policy"),
            });
        }

        let sentinel_quorum = if mode.needs_sentinel() {
            Some(parse_var(vars, "SENTINEL_QUORUM", 2)?)
        } else {
            None
        };

        Ok(Config {
            password: vars["REDIS_PASSWORD"].clone(),
            port: parse_var(vars, "REDIS_PORT", 6379u16)?,
            maxmemory,
            maxmemory_policy,
            image_name: lookup(vars, "REDIS_IMAGE").unwrap_or_else(|| "rdo-redis".to_string()),
            compose_file: PathBuf::from(
                lookup(vars, "COMPOSE_FILE").unwrap_or_else(|| "docker-compose.yml".to_string()),
            ),
            replica_count: parse_var(vars, "REDIS_REPLICA_COUNT", 2u32)?,
            sentinel_quorum,
            health_max_attempts: parse_var(vars, "HEALTH_MAX_ATTEMPTS", 30u32)?,
            health_interval: Duration::from_secs(parse_var(vars, "HEALTH_INTERVAL_SECS", 5u64)?),
            app_health_interval: Duration::from_secs(parse_var(
                vars,
                "APP_HEALTH_INTERVAL_SECS",
                10u64,
            )?),
            propagation_delay: Duration::from_secs(parse_var(
                vars,
                "PROPAGATION_DELAY_SECS",
                2u64,
            )?),
            log_tail_lines: parse_var(vars, "LOG_TAIL_LINES", 20u32)?,
        })
    }
}

fn lookup(vars: &HashMap<String, String>, name: &str) -> Option<String> {
    vars.get(name).filter(|v| !v.is_empty()).cloned()
}

fn parse_var<T: std::str::FromStr>(
    vars: &HashMap<String, String>,
    name: &str,
    default: T,
) -> Result<T> {
    match lookup(vars, name) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| OrchestratorError::MalformedValue {
            name: name.to_string(),
            reason: format!("'{raw}' is not a valid number"),
        }),
    }
}
