use serde::{Deserialize, Serialize};

/// The label on a compose service that declares its role to the orchestrator.
pub const ROLE_LABEL: &str = "orchestrator.role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceRole {
    Primary,
    Replica,
    Sentinel,
    App,
    LoadBalancer,
}

impl ServiceRole {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "primary" => Some(Self::Primary),
            "replica" => Some(Self::Replica),
            "sentinel" => Some(Self::Sentinel),
            "app" => Some(Self::App),
            "loadbalancer" => Some(Self::LoadBalancer),
            _ => None,
        }
    }

    /// Activation rank: storage roles start before monitors, monitors
    /// before app and load-balancer roles. Used as a tie-break on top of
    /// the declared dependency edges.
    pub fn start_rank(self) -> u8 {
        match self {
            Self::Primary => 0,
            Self::Replica => 1,
            Self::Sentinel => 2,
            Self::App => 3,
            Self::LoadBalancer => 4,
        }
    }
}

impl std::fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Primary => "primary",
            Self::Replica => "replica",
            Self::Sentinel => "sentinel",
            Self::App => "app",
            Self::LoadBalancer => "loadbalancer",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    pub name: String,
    pub role: ServiceRole,
    /// Container name the external tools address (defaults to the service name).
    pub container: String,
    pub depends_on: Vec<String>,
    pub profiles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_roles() {
        assert_eq!(ServiceRole::parse("primary"), Some(ServiceRole::Primary));
        assert_eq!(
            ServiceRole::parse("loadbalancer"),
            Some(ServiceRole::LoadBalancer)
        );
        assert_eq!(ServiceRole::parse("database"), None);
    }

    #[test]
    fn rank_orders_storage_before_monitors_before_balancers() {
        assert!(ServiceRole::Primary.start_rank() < ServiceRole::Sentinel.start_rank());
        assert!(ServiceRole::Sentinel.start_rank() < ServiceRole::LoadBalancer.start_rank());
    }
}
