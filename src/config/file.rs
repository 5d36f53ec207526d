// src/config/file.rs
// Config file support: ~/.litterbox/config.toml

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::editor::HistoryPolicy;
use crate::error::{AgentError, Result};

/// One layer of configuration. Every field is optional so layers can be
/// stacked: CLI args > environment > config file > defaults.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    /// Interface to bind
    pub host: Option<String>,

    /// Listen port
    pub port: Option<u16>,

    /// Default directory for uploads without an explicit `path`
    pub upload_dir: Option<PathBuf>,

    /// Undo snapshots kept per file
    pub history_capacity: Option<usize>,

    /// When str_replace / insert record undo snapshots
    pub history_policy: Option<HistoryPolicy>,

    /// Largest accepted upload request body, in bytes
    pub max_upload_bytes: Option<usize>,

    /// Shell used by /exec
    pub shell: Option<String>,

    /// Default tracing filter when RUST_LOG is unset
    pub log_level: Option<String>,
}

impl PartialConfig {
    /// Load a config file.
    ///
    /// With `explicit` set the file must exist; otherwise the default
    /// location is tried and a missing file yields an empty layer.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = config_path();
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = std::fs::read_to_string(&path).map_err(|e| {
            AgentError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| AgentError::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Fill every unset field from `lower`
    pub fn or(self, lower: PartialConfig) -> PartialConfig {
        PartialConfig {
            host: self.host.or(lower.host),
            port: self.port.or(lower.port),
            upload_dir: self.upload_dir.or(lower.upload_dir),
            history_capacity: self.history_capacity.or(lower.history_capacity),
            history_policy: self.history_policy.or(lower.history_policy),
            max_upload_bytes: self.max_upload_bytes.or(lower.max_upload_bytes),
            shell: self.shell.or(lower.shell),
            log_level: self.log_level.or(lower.log_level),
        }
    }
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".litterbox")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = PartialConfig::default();
        assert!(config.port.is_none());
        assert!(config.history_policy.is_none());
    }

    #[test]
    fn test_config_path() {
        let path = config_path();
        assert!(path.to_string_lossy().contains(".litterbox"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn test_parse_toml() {
        let config = PartialConfig::parse(
            r#"
            port = 9000
            upload_dir = "/srv/uploads"
            history_capacity = 25
            history_policy = "on_mutation"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, Some(9000));
        assert_eq!(config.upload_dir, Some(PathBuf::from("/srv/uploads")));
        assert_eq!(config.history_capacity, Some(25));
        assert_eq!(config.history_policy, Some(HistoryPolicy::OnMutation));
        assert!(config.host.is_none());
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        assert!(PartialConfig::parse("prot = 1").is_err());
    }

    #[test]
    fn test_or_prefers_upper_layer() {
        let cli = PartialConfig {
            port: Some(1),
            ..Default::default()
        };
        let file = PartialConfig {
            port: Some(2),
            shell: Some("bash".into()),
            ..Default::default()
        };

        let merged = cli.or(file);
        assert_eq!(merged.port, Some(1));
        assert_eq!(merged.shell.as_deref(), Some("bash"));
    }

    #[test]
    fn test_load_explicit_missing_file_errors() {
        let dir = TempDir::new().unwrap();
        let err = PartialConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agent.toml");
        std::fs::write(&path, "shell = \"bash\"\n").unwrap();

        let config = PartialConfig::load(Some(&path)).unwrap();
        assert_eq!(config.shell.as_deref(), Some("bash"));
    }
}
