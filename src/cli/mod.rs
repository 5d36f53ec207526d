// src/cli/mod.rs
// CLI for the litterbox agent

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{AgentConfig, PartialConfig};
use crate::editor::HistoryPolicy;
use crate::error::Result;

pub mod edit;
pub mod serve;

pub use edit::run_edit;
pub use serve::run_server;

#[derive(Parser)]
#[command(name = "litterbox")]
#[command(about = "Remote file editing, exec and metrics agent")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP agent (default)
    Serve,

    /// Run one edit request locally and print the JSON result
    Edit {
        /// Request body, e.g. '{"command": "view", "path": "/etc/hosts"}'
        #[arg(index = 1)]
        request: String,
    },
}

/// Settings that override environment, config file and defaults
#[derive(Args, Debug, Default, Clone)]
pub struct ConfigArgs {
    /// Config file (default: ~/.litterbox/config.toml)
    #[arg(long, global = true, env = "LITTERBOX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Interface to bind
    #[arg(long, global = true, env = "LITTERBOX_HOST")]
    pub host: Option<String>,

    /// Listen port
    #[arg(long, short = 'p', global = true, env = "PORT")]
    pub port: Option<u16>,

    /// Directory for uploads that name no target directory
    #[arg(long, global = true, env = "LITTERBOX_UPLOAD_DIR")]
    pub upload_dir: Option<PathBuf>,

    /// Undo snapshots kept per file
    #[arg(long, global = true, env = "LITTERBOX_HISTORY_CAPACITY")]
    pub history_capacity: Option<usize>,

    /// When edits record undo snapshots (on_attempt, on_mutation)
    #[arg(long, global = true, env = "LITTERBOX_HISTORY_POLICY")]
    pub history_policy: Option<HistoryPolicy>,

    /// Largest accepted upload body, in bytes
    #[arg(long, global = true, env = "LITTERBOX_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: Option<usize>,

    /// Shell used by /exec
    #[arg(long, global = true, env = "LITTERBOX_SHELL")]
    pub shell: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, env = "LITTERBOX_LOG")]
    pub log_level: Option<String>,
}

impl ConfigArgs {
    fn into_partial(self) -> PartialConfig {
        PartialConfig {
            host: self.host,
            port: self.port,
            upload_dir: self.upload_dir,
            history_capacity: self.history_capacity,
            history_policy: self.history_policy,
            max_upload_bytes: self.max_upload_bytes,
            shell: self.shell,
            log_level: self.log_level,
        }
    }

    /// Resolve values: CLI args > env vars (handled by clap) > config file > defaults
    pub fn resolve(self) -> Result<AgentConfig> {
        let file = PartialConfig::load(self.config.as_deref())?;
        AgentConfig::from_partial(self.into_partial().or(file))
    }
}
