// src/web/file.rs
// POST /file: flat edit request -> EditOperation -> engine

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::editor::{EditOperation, EditOutcome, FileEditor};
use crate::web::error::{ApiError, ApiResult};
use crate::web::state::AppState;

/// Wire shape of an edit request. Which fields matter depends on `command`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileOperationRequest {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub file_text: Option<String>,
    #[serde(default)]
    pub view_range: Option<Vec<i64>>,
    #[serde(default)]
    pub old_str: Option<String>,
    #[serde(default)]
    pub new_str: Option<String>,
    #[serde(default)]
    pub insert_line: Option<i64>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    /// Rejected before the engine runs
    #[error("{0}")]
    Invalid(String),

    /// Well-formed request naming a command nobody implements
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

impl RequestError {
    fn invalid(message: impl Into<String>) -> Self {
        RequestError::Invalid(message.into())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl TryFrom<FileOperationRequest> for EditOperation {
    type Error = RequestError;

    fn try_from(req: FileOperationRequest) -> Result<Self, Self::Error> {
        if req.command.is_empty() {
            return Err(RequestError::invalid("Command required"));
        }
        if req.path.is_empty() {
            return Err(RequestError::invalid("Path required"));
        }
        let path = PathBuf::from(req.path);

        match req.command.as_str() {
            "view" => {
                let range = match req.view_range.as_deref() {
                    None => None,
                    Some([start, end]) => Some((*start, *end)),
                    Some(other) => {
                        return Err(RequestError::invalid(format!(
                            "view_range must contain exactly 2 integers, got {}",
                            other.len()
                        )));
                    }
                };
                Ok(EditOperation::View { path, range })
            }
            "create" => {
                let text = non_empty(req.file_text)
                    .ok_or_else(|| RequestError::invalid("file_text required for create command"))?;
                Ok(EditOperation::Create { path, text })
            }
            "str_replace" => {
                let old = non_empty(req.old_str)
                    .ok_or_else(|| RequestError::invalid("old_str required for str_replace command"))?;
                Ok(EditOperation::StrReplace {
                    path,
                    old,
                    new: req.new_str.unwrap_or_default(),
                })
            }
            "insert" => {
                let text = non_empty(req.new_str)
                    .ok_or_else(|| RequestError::invalid("new_str required for insert command"))?;
                let line = req
                    .insert_line
                    .ok_or_else(|| RequestError::invalid("insert_line required for insert command"))?;
                Ok(EditOperation::Insert { path, line, text })
            }
            "undo_edit" => Ok(EditOperation::UndoEdit { path }),
            other => Err(RequestError::UnknownCommand(other.to_string())),
        }
    }
}

/// Validate and run one request. Shared by the HTTP handler and `litterbox edit`.
pub async fn run_file_operation(
    editor: &FileEditor,
    request: FileOperationRequest,
) -> ApiResult<EditOutcome> {
    let op = match EditOperation::try_from(request) {
        Ok(op) => op,
        Err(RequestError::Invalid(message)) => return Err(ApiError::bad_request(message)),
        Err(err @ RequestError::UnknownCommand(_)) => {
            return Ok(EditOutcome::rejected(err.to_string()));
        }
    };

    Ok(editor.apply(op).await?)
}

pub async fn file_operation(
    State(state): State<AppState>,
    payload: Result<Json<FileOperationRequest>, JsonRejection>,
) -> ApiResult<Json<EditOutcome>> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let outcome = run_file_operation(&state.editor, request).await?;
    Ok(Json(outcome))
}
