// src/config/mod.rs
// Resolved agent configuration

pub mod file;

pub use file::{config_path, PartialConfig};

use serde::Serialize;
use std::path::PathBuf;

use crate::editor::{HistoryPolicy, DEFAULT_HISTORY_CAPACITY};
use crate::error::{AgentError, Result};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_UPLOAD_DIR: &str = "/tmp";
/// 32 MiB, matching the multipart form limit clients expect
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 << 20;
pub const DEFAULT_SHELL: &str = "sh";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentConfig {
    // ── Server
    pub host: String,
    pub port: u16,

    // ── Transfers
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,

    // ── Editor
    pub history_capacity: usize,
    pub history_policy: HistoryPolicy,

    // ── Exec
    pub shell: String,

    // ── Logging
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            history_policy: HistoryPolicy::default(),
            shell: DEFAULT_SHELL.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AgentConfig {
    /// Fill unset fields with defaults and validate
    pub fn from_partial(partial: PartialConfig) -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            host: partial.host.unwrap_or(defaults.host),
            port: partial.port.unwrap_or(defaults.port),
            upload_dir: partial.upload_dir.unwrap_or(defaults.upload_dir),
            max_upload_bytes: partial.max_upload_bytes.unwrap_or(defaults.max_upload_bytes),
            history_capacity: partial.history_capacity.unwrap_or(defaults.history_capacity),
            history_policy: partial.history_policy.unwrap_or(defaults.history_policy),
            shell: partial.shell.unwrap_or(defaults.shell),
            log_level: partial.log_level.unwrap_or(defaults.log_level),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            return Err(AgentError::Config("history_capacity must be at least 1".into()));
        }
        if self.max_upload_bytes == 0 {
            return Err(AgentError::Config("max_upload_bytes must be at least 1".into()));
        }
        if self.shell.trim().is_empty() {
            return Err(AgentError::Config("shell must not be empty".into()));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
