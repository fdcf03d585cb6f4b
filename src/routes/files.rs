//! Bucket listing and the server-side upload proxy
//!
//! The proxy exists for clients whose direct PUT to a presigned link is
//! blocked (typically by a missing CORS rule on the bucket). Server-side
//! requests are not subject to browser CORS policy.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{error, info};

use crate::models::AppState;
use crate::storage::ObjectInfo;
use crate::types::{AppError, AppResult, FileEntry, ListFilesResponse, UploadFileResponse};
use crate::utils::preview_key_id;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/list-files", get(list_files))
        .route("/api/upload-file", post(upload_file))
}

impl From<ObjectInfo> for FileEntry {
    fn from(obj: ObjectInfo) -> Self {
        FileEntry {
            name: obj.key,
            size: obj.size,
            last_modified: obj.last_modified.timestamp_millis(),
        }
    }
}

/// GET /api/list-files
async fn list_files(State(state): State<AppState>) -> Response {
    match state.store.list_objects().await {
        Ok(objects) => {
            let files: Vec<FileEntry> = objects.into_iter().map(FileEntry::from).collect();
            info!(count = files.len(), "Listed files");
            Json(ListFilesResponse {
                success: true,
                files,
                error: None,
            })
            .into_response()
        }
        Err(e) => {
            let storage = &state.config.storage;
            let key_id = storage.key_id.as_deref().unwrap_or_default();
            let details = serde_json::json!({
                "success": false,
                "error": e.to_string(),
                "error_type": e.kind(),
                "debug_info": {
                    "key_id_length": key_id.len(),
                    "key_id_preview": preview_key_id(key_id),
                    "endpoint": storage.endpoint_url,
                    "bucket": state.store.bucket_name(),
                }
            });
            error!(error = %e, error_type = e.kind(), "Failed to list files");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(details)).into_response()
        }
    }
}

struct FilePart {
    file_name: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(format!("Invalid multipart body: {}", e.body_text()))
    }
}

/// POST /api/upload-file (multipart: `file`, optional `file_name`)
async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadFileResponse>> {
    let mut file: Option<FilePart> = None;
    let mut target_name: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let part_name = field.name().map(String::from);
        match part_name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().map(String::from);
                let content_type = field.content_type().map(String::from);
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some(FilePart {
                    file_name,
                    content_type,
                    data,
                });
            }
            Some("file_name") => {
                let text = field.text().await.map_err(multipart_error)?;
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    target_name = Some(trimmed.to_string());
                }
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    let key = target_name
        .or_else(|| file.file_name.clone().filter(|n| !n.is_empty()))
        .ok_or_else(|| AppError::BadRequest("file_name is required".to_string()))?;

    let content_type = file
        .content_type
        .filter(|ct| !ct.is_empty())
        .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());

    state.store.put_object(&key, &file.data, &content_type).await?;

    info!(file_name = %key, bytes = file.data.len(), "File uploaded via proxy");

    Ok(Json(UploadFileResponse {
        success: true,
        file_name: Some(key),
        message: Some("File uploaded successfully".to_string()),
        error: None,
    }))
}
