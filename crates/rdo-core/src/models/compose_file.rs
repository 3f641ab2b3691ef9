use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{OrchestratorError, Result};

/// Minimal model of the composition descriptor: the orchestrator only needs
/// service names, role labels, activation profiles, and dependency edges.
#[derive(Debug, Clone, Deserialize)]
pub struct ComposeFile {
    pub services: BTreeMap<String, ComposeService>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComposeService {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub container_name: Option<String>,
    #[serde(default)]
    pub profiles: Vec<String>,
    #[serde(default)]
    pub depends_on: DependsOn,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// Compose allows `depends_on` as either a plain list or a map with
/// per-dependency conditions; only the names matter here.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DependsOn {
    List(Vec<String>),
    Map(BTreeMap<String, serde_yaml::Value>),
}

impl Default for DependsOn {
    fn default() -> Self {
        DependsOn::List(Vec::new())
    }
}

impl DependsOn {
    pub fn names(&self) -> Vec<String> {
        match self {
            DependsOn::List(names) => names.clone(),
            DependsOn::Map(map) => map.keys().cloned().collect(),
        }
    }
}

impl ComposeFile {
    pub fn load(path: &Path) -> Result<ComposeFile> {
        if !path.exists() {
            return Err(OrchestratorError::ComposeFileNotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<ComposeFile> {
        let file: ComposeFile = serde_yaml::from_str(contents)
            .map_err(|e| OrchestratorError::InvalidComposeFile(e.to_string()))?;
        if file.services.is_empty() {
            return Err(OrchestratorError::InvalidComposeFile(
                "no services defined".into(),
            ));
        }
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_and_map_depends_on() {
        let yaml = r#"
services:
  a:
    image: redis:7
    depends_on:
      - b
  b:
    depends_on:
      c:
        condition: service_started
  c: {}
"#;
        let file = ComposeFile::parse(yaml).unwrap();
        assert_eq!(file.services["a"].depends_on.names(), vec!["b"]);
        assert_eq!(file.services["b"].depends_on.names(), vec!["c"]);
        assert!(file.services["c"].depends_on.names().is_empty());
    }

    #[test]
    fn parse_profiles_and_labels() {
        let yaml = r#"
services:
  sentinel-1:
    profiles: ["sentinel"]
    labels:
      orchestrator.role: sentinel
"#;
        let file = ComposeFile::parse(yaml).unwrap();
        let svc = &file.services["sentinel-1"];
        assert_eq!(svc.profiles, vec!["sentinel"]);
        assert_eq!(
            svc.labels.get("orchestrator.role").map(String::as_str),
            Some("sentinel")
        );
    }

    #[test]
    fn empty_services_rejected() {
        let yaml = "services: {}\n";
        assert!(matches!(
            ComposeFile::parse(yaml),
            Err(OrchestratorError::InvalidComposeFile(_))
        ));
    }

    #[test]
    fn missing_file_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docker-compose.yml");
        assert!(matches!(
            ComposeFile::load(&path),
            Err(OrchestratorError::ComposeFileNotFound(_))
        ));
    }
}
