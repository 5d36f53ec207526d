// src/web/api.rs
// Health, token init, exec and metrics handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::services::{AuthError, CommandOutput, MetricsSnapshot};
use crate::web::error::{ApiError, ApiResult};
use crate::web::state::AppState;

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// ═══════════════════════════════════════
// TOKEN INIT
// ═══════════════════════════════════════

#[derive(Debug, Serialize, Deserialize)]
pub struct InitResponse {
    pub token: String,
    pub message: String,
}

pub async fn init(State(state): State<AppState>) -> ApiResult<Json<InitResponse>> {
    match state.auth.initialize().await {
        Ok(token) => Ok(Json(InitResponse {
            token,
            message: "Token initialized successfully. Save this token, it cannot be retrieved again."
                .to_string(),
        })),
        Err(err @ AuthError::AlreadyInitialized) => {
            warn!("Rejected repeated /init");
            Err(ApiError::forbidden("ALREADY_INITIALIZED", err.to_string()))
        }
    }
}

// ═══════════════════════════════════════
// EXEC
// ═══════════════════════════════════════

#[derive(Debug, Serialize, Deserialize)]
pub struct ExecRequest {
    #[serde(default)]
    pub command: String,
}

pub async fn exec(
    State(state): State<AppState>,
    payload: Result<Json<ExecRequest>, JsonRejection>,
) -> ApiResult<Json<CommandOutput>> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    if req.command.is_empty() {
        return Err(ApiError::bad_request("Command required"));
    }

    let output = state.exec.run(&req.command).await;
    state.metrics.increment_command();

    info!(exit_code = output.exit_code, "Command executed");
    Ok(Json(output))
}

// ═══════════════════════════════════════
// METRICS
// ═══════════════════════════════════════

pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot().await)
}
