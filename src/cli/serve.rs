// src/cli/serve.rs
// HTTP agent startup

use anyhow::Result;
use tracing::info;

use crate::config::AgentConfig;
use crate::web::{self, state::AppState};

pub async fn run_server(config: AgentConfig) -> Result<()> {
    info!(
        upload_dir = %config.upload_dir.display(),
        history_capacity = config.history_capacity,
        history_policy = %config.history_policy,
        shell = %config.shell,
        "Starting litterbox agent"
    );

    let state = AppState::new(config);
    web::serve(state).await
}
