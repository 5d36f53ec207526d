// src/web/mod.rs
// HTTP surface: router, auth middleware and server loop

pub mod api;
pub mod error;
pub mod file;
pub mod state;
pub mod transfer;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::services::TokenCheck;
use crate::web::error::ApiError;
use crate::web::state::AppState;

/// Header carrying the access token
pub const TOKEN_HEADER: &str = "x-token";

/// Create the web server router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_upload = state.config.max_upload_bytes;

    // Layers run bottom-up: auth first, then counting
    let protected = Router::new()
        .route("/file", post(file::file_operation))
        .route("/exec", post(api::exec))
        .route("/metrics", get(api::metrics))
        .route(
            "/upload",
            post(transfer::upload).layer(DefaultBodyLimit::max(max_upload)),
        )
        .route("/download", get(transfer::download))
        .route_layer(middleware::from_fn_with_state(state.clone(), count_request))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/init", post(api::init))
        .route("/health", get(api::health))
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = request
        .headers()
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());

    match state.auth.verify(presented).await {
        TokenCheck::Valid => Ok(next.run(request).await),
        TokenCheck::NotInitialized => Err(ApiError::unauthorized(
            "NOT_INITIALIZED",
            "Token not initialized. Please call /init first.",
        )),
        TokenCheck::Invalid => Err(ApiError::unauthorized(
            "INVALID_TOKEN",
            "Invalid or missing token",
        )),
    }
}

async fn count_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    state.metrics.increment_request();
    next.run(request).await
}

/// Bind and serve until ctrl-c
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.bind_address();
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Litterbox agent listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
