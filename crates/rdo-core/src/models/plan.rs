use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{OrchestratorError, Result};
use crate::models::compose_file::ComposeFile;
use crate::models::service::{ServiceRole, ServiceSpec, ROLE_LABEL};

/// Every activation profile the composition descriptor may use. Teardown and
/// status always pass the full set so no service is left out of scope.
pub const ALL_PROFILES: &[&str] = &["sentinel", "monitoring", "loadbalancer"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeployMode {
    Basic,
    Sentinel,
    Full,
}

impl DeployMode {
    pub fn profiles(self) -> &'static [&'static str] {
        match self {
            DeployMode::Basic => &[],
            DeployMode::Sentinel => &["sentinel"],
            DeployMode::Full => &["sentinel", "loadbalancer"],
        }
    }

    pub fn needs_sentinel(self) -> bool {
        !matches!(self, DeployMode::Basic)
    }
}

impl std::fmt::Display for DeployMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeployMode::Basic => "basic",
            DeployMode::Sentinel => "sentinel",
            DeployMode::Full => "full",
        };
        f.write_str(s)
    }
}

/// An immutable activation plan: the subset of services selected by the
/// requested profiles, ordered by the declared dependency edges.
#[derive(Debug, Clone)]
pub struct DeploymentPlan {
    profiles: Vec<String>,
    services: Vec<ServiceSpec>,
}

impl DeploymentPlan {
    /// Select the services active under `profiles` and order them: declared
    /// `depends_on` edges first, then role rank (storage before monitors
    /// before balancers), then name, so the order is deterministic.
    pub fn compute(compose: &ComposeFile, profiles: &[&str]) -> Result<DeploymentPlan> {
        let mut specs = Vec::new();
        for (name, svc) in &compose.services {
            let active = svc.profiles.is_empty()
                || svc.profiles.iter().any(|p| profiles.contains(&p.as_str()));
            if !active {
                continue;
            }
            let role_value = svc.labels.get(ROLE_LABEL).ok_or_else(|| {
                OrchestratorError::InvalidComposeFile(format!(
                    "service '{name}' has no {ROLE_LABEL} label"
                ))
            })?;
            let role = ServiceRole::parse(role_value).ok_or_else(|| {
                OrchestratorError::InvalidComposeFile(format!(
                    "service '{name}' has unknown role '{role_value}'"
                ))
            })?;
            specs.push(ServiceSpec {
                name: name.clone(),
                role,
                container: svc.container_name.clone().unwrap_or_else(|| name.clone()),
                depends_on: svc.depends_on.names(),
                profiles: svc.profiles.clone(),
            });
        }

        let primaries = specs
            .iter()
            .filter(|s| s.role == ServiceRole::Primary)
            .count();
        if primaries != 1 {
            return Err(OrchestratorError::InvalidComposeFile(format!(
                "expected exactly one primary service, found {primaries}"
            )));
        }

        let services = topo_sort(specs)?;
        Ok(DeploymentPlan {
            profiles: profiles.iter().map(|p| p.to_string()).collect(),
            services,
        })
    }

    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    /// Services in activation order.
    pub fn services(&self) -> &[ServiceSpec] {
        &self.services
    }

    pub fn primary(&self) -> Option<&ServiceSpec> {
        self.services
            .iter()
            .find(|s| s.role == ServiceRole::Primary)
    }

    pub fn replicas(&self) -> impl Iterator<Item = &ServiceSpec> {
        self.services
            .iter()
            .filter(|s| s.role == ServiceRole::Replica)
    }
}

/// Kahn's algorithm with a sorted ready set. Edges pointing at services
/// excluded by the profile selection are ignored.
fn topo_sort(specs: Vec<ServiceSpec>) -> Result<Vec<ServiceSpec>> {
    let names: HashSet<String> = specs.iter().map(|s| s.name.clone()).collect();
    let mut indegree: HashMap<String, usize> = HashMap::new();
    let mut dependents: HashMap<String, Vec<String>> = HashMap::new();

    for spec in &specs {
        let deps: Vec<&String> = spec
            .depends_on
            .iter()
            .filter(|d| names.contains(*d))
            .collect();
        indegree.insert(spec.name.clone(), deps.len());
        for dep in deps {
            dependents
                .entry(dep.clone())
                .or_default()
                .push(spec.name.clone());
        }
    }

    let mut by_name: HashMap<String, ServiceSpec> =
        specs.into_iter().map(|s| (s.name.clone(), s)).collect();
    let mut ready: Vec<String> = indegree
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(n, _)| n.clone())
        .collect();
    let mut ordered = Vec::with_capacity(by_name.len());

    while !ready.is_empty() {
        ready.sort_by_key(|name| {
            let rank = by_name[name].role.start_rank();
            (rank, name.clone())
        });
        let name = ready.remove(0);
        for dependent in dependents.remove(&name).unwrap_or_default() {
            let d = indegree.get_mut(&dependent).unwrap();
            *d -= 1;
            if *d == 0 {
                ready.push(dependent);
            }
        }
        ordered.push(by_name.remove(&name).unwrap());
    }

    if let Some(stuck) = by_name.keys().min() {
        return Err(OrchestratorError::DependencyCycle(stuck.clone()));
    }
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_compose() -> ComposeFile {
        ComposeFile::parse(
            r#"
services:
  redis-primary:
    labels:
      orchestrator.role: primary
  redis-replica-1:
    depends_on: [redis-primary]
    labels:
      orchestrator.role: replica
  redis-replica-2:
    depends_on: [redis-primary]
    labels:
      orchestrator.role: replica
  sentinel-1:
    profiles: ["sentinel"]
    depends_on: [redis-primary]
    labels:
      orchestrator.role: sentinel
  haproxy:
    profiles: ["loadbalancer"]
    depends_on: [redis-primary, redis-replica-1, redis-replica-2]
    labels:
      orchestrator.role: loadbalancer
"#,
        )
        .unwrap()
    }

    #[test]
    fn basic_profile_selects_storage_only() {
        let plan = DeploymentPlan::compute(&sample_compose(), &[]).unwrap();
        let names: Vec<&str> = plan.services().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["redis-primary", "redis-replica-1", "redis-replica-2"]);
    }

    #[test]
    fn full_profiles_order_storage_then_monitor_then_balancer() {
        let plan =
            DeploymentPlan::compute(&sample_compose(), &["sentinel", "loadbalancer"]).unwrap();
        let names: Vec<&str> = plan.services().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "redis-primary",
                "redis-replica-1",
                "redis-replica-2",
                "sentinel-1",
                "haproxy"
            ]
        );
    }

    #[test]
    fn primary_and_replicas_accessors() {
        let plan = DeploymentPlan::compute(&sample_compose(), &[]).unwrap();
        assert_eq!(plan.primary().unwrap().name, "redis-primary");
        assert_eq!(plan.replicas().count(), 2);
    }

    #[test]
    fn missing_role_label_rejected() {
        let compose = ComposeFile::parse(
            r#"
services:
  redis-primary:
    labels:
      orchestrator.role: primary
  mystery: {}
"#,
        )
        .unwrap();
        let err = DeploymentPlan::compute(&compose, &[]).unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidComposeFile(ref msg) if msg.contains("mystery")));
    }

    #[test]
    fn two_primaries_rejected() {
        let compose = ComposeFile::parse(
            r#"
services:
  a:
    labels:
      orchestrator.role: primary
  b:
    labels:
      orchestrator.role: primary
"#,
        )
        .unwrap();
        assert!(matches!(
            DeploymentPlan::compute(&compose, &[]),
            Err(OrchestratorError::InvalidComposeFile(_))
        ));
    }

    #[test]
    fn dependency_cycle_detected() {
        let compose = ComposeFile::parse(
            r#"
services:
  primary:
    labels:
      orchestrator.role: primary
  a:
    depends_on: [b]
    labels:
      orchestrator.role: replica
  b:
    depends_on: [a]
    labels:
      orchestrator.role: replica
"#,
        )
        .unwrap();
        let err = DeploymentPlan::compute(&compose, &[]).unwrap_err();
        assert!(matches!(err, OrchestratorError::DependencyCycle(ref name) if name == "a"));
    }

    #[test]
    fn edges_to_inactive_services_ignored() {
        let compose = ComposeFile::parse(
            r#"
services:
  primary:
    labels:
      orchestrator.role: primary
  exporter:
    profiles: ["monitoring"]
    labels:
      orchestrator.role: app
  haproxy:
    profiles: ["loadbalancer"]
    depends_on: [exporter]
    labels:
      orchestrator.role: loadbalancer
"#,
        )
        .unwrap();
        // exporter is inactive under the loadbalancer profile; the dangling
        // edge must not wedge haproxy at indegree 1.
        let plan = DeploymentPlan::compute(&compose, &["loadbalancer"]).unwrap();
        let names: Vec<&str> = plan.services().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["primary", "haproxy"]);
    }

    #[test]
    fn mode_profiles() {
        assert!(DeployMode::Basic.profiles().is_empty());
        assert_eq!(DeployMode::Sentinel.profiles(), &["sentinel"]);
        assert_eq!(DeployMode::Full.profiles(), &["sentinel", "loadbalancer"]);
        assert!(!DeployMode::Basic.needs_sentinel());
        assert!(DeployMode::Full.needs_sentinel());
    }
}
