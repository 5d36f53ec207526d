// src/web/transfer.rs
// File upload (multipart) and download (streamed)

use axum::{
    body::Body,
    extract::{Multipart, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use crate::file_system::{open_download, PendingUpload};
use crate::web::error::{ApiError, ApiResult};
use crate::web::state::AppState;

fn upload_io_error(dir: &Path, e: std::io::Error) -> ApiError {
    if e.kind() == ErrorKind::InvalidInput {
        ApiError::bad_request(e.to_string())
    } else {
        warn!(dir = %dir.display(), error = %e, "Upload failed");
        ApiError::internal(e.to_string())
    }
}

/// Stream the `file` part to disk chunk by chunk.
///
/// The upload is staged in the `path` directory when that field precedes the
/// file part, otherwise in the configured upload dir, and committed into its
/// final directory once the whole form has been read.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut pending: Option<PendingUpload> = None;
    let mut dir: Option<PathBuf> = None;

    let read = async {
        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let staging = dir.clone().unwrap_or_else(|| state.config.upload_dir.clone());
                    if let Some(previous) = pending.take() {
                        previous.discard().await;
                    }
                    let upload = pending.insert(
                        PendingUpload::begin(&staging, &file_name)
                            .await
                            .map_err(|e| upload_io_error(&staging, e))?,
                    );
                    while let Some(chunk) = field
                        .chunk()
                        .await
                        .map_err(|e| ApiError::bad_request(e.body_text()))?
                    {
                        upload
                            .write_chunk(&chunk)
                            .await
                            .map_err(|e| upload_io_error(&staging, e))?;
                    }
                }
                "path" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(e.body_text()))?;
                    dir = Some(value).filter(|d| !d.is_empty()).map(PathBuf::from);
                }
                _ => {}
            }
        }
        Ok::<_, ApiError>(())
    }
    .await;

    if let Err(e) = read {
        if let Some(upload) = pending {
            upload.discard().await;
        }
        return Err(e);
    }

    let upload = pending.ok_or_else(|| ApiError::bad_request("file field required"))?;
    let dir = dir.unwrap_or_else(|| state.config.upload_dir.clone());
    let bytes = upload.written();
    let saved = upload
        .commit(&dir)
        .await
        .map_err(|e| upload_io_error(&dir, e))?;

    state.metrics.increment_upload();
    info!(path = %saved.display(), bytes, "File uploaded");

    Ok(Json(json!({
        "status": "success",
        "path": saved.display().to_string(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    pub path: String,
}

pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> ApiResult<Response> {
    if query.path.is_empty() {
        return Err(ApiError::bad_request("File path required"));
    }
    let path = Path::new(&query.path);

    let (file, metadata) = open_download(path)
        .await
        .map_err(|e| ApiError::not_found(e.to_string()))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| query.path.clone());
    let disposition = HeaderValue::from_str(&format!("attachment; filename={}", file_name))
        .map_err(|_| ApiError::bad_request("File name is not a valid header value"))?;

    state.metrics.increment_download();
    info!(path = %path.display(), bytes = metadata.len(), "File download started");

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((
        [
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
            (header::CONTENT_LENGTH, HeaderValue::from(metadata.len())),
        ],
        body,
    )
        .into_response())
}
