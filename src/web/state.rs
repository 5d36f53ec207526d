// src/web/state.rs
// Shared application state

use std::sync::Arc;

use crate::config::AgentConfig;
use crate::editor::{FileEditor, HistoryLedger};
use crate::services::{ExecService, MetricsService, TokenManager};

#[derive(Clone)]
pub struct AppState {
    /// Edit engine, owns undo history and per-path locks
    pub editor: Arc<FileEditor>,

    pub auth: Arc<TokenManager>,

    pub metrics: Arc<MetricsService>,

    pub exec: Arc<ExecService>,

    pub config: Arc<AgentConfig>,
}

impl AppState {
    pub fn new(config: AgentConfig) -> Self {
        let history = HistoryLedger::new(config.history_capacity);
        let editor = FileEditor::new(history, config.history_policy);
        let exec = ExecService::new(config.shell.clone());

        Self {
            editor: Arc::new(editor),
            auth: Arc::new(TokenManager::new()),
            metrics: Arc::new(MetricsService::new()),
            exec: Arc::new(exec),
            config: Arc::new(config),
        }
    }
}
