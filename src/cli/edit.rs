// src/cli/edit.rs
// One-shot local edit: same validation and engine as POST /file

use serde_json::json;
use std::io::Write;

use crate::config::AgentConfig;
use crate::editor::{FileEditor, HistoryLedger};
use crate::error::Result;
use crate::web::file::{run_file_operation, FileOperationRequest};

/// Run a single request and return the JSON that /file would have sent
pub async fn edit_to_json(config: &AgentConfig, request: &str) -> Result<serde_json::Value> {
    let request: FileOperationRequest = serde_json::from_str(request)?;
    let editor = FileEditor::new(
        HistoryLedger::new(config.history_capacity),
        config.history_policy,
    );

    let value = match run_file_operation(&editor, request).await {
        Ok(outcome) => serde_json::to_value(outcome)?,
        Err(e) => json!({ "error": e.message, "code": e.error_code }),
    };
    Ok(value)
}

pub async fn run_edit(config: AgentConfig, request: String) -> Result<()> {
    let value = edit_to_json(&config, &request).await?;
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &value)?;
    writeln!(stdout)?;
    Ok(())
}
