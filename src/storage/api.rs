//! Upload API Endpoints
//! Mission: Hand out delegated upload URLs

use crate::storage::azure::UploadKind;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

/// Upload URL request body
#[derive(Debug, Deserialize)]
pub struct UploadUrlRequest {
    pub file_type: String,
    pub blob_name: String,
}

/// Create a delegated upload URL - POST /api/uploads/sas
pub async fn create_upload_url(
    State(state): State<AppState>,
    Json(payload): Json<UploadUrlRequest>,
) -> Result<Json<Value>, UploadApiError> {
    let kind = UploadKind::parse(&payload.file_type).ok_or(UploadApiError::InvalidFileType)?;

    let blob_name = payload.blob_name.trim();
    if blob_name.is_empty() {
        return Err(UploadApiError::MissingBlobName);
    }

    let sas = state.sas.as_ref().ok_or(UploadApiError::NotConfigured)?;

    let url = sas
        .blob_upload_url(kind, blob_name, Utc::now())
        .map_err(|e| {
            warn!("Failed to generate SAS URL: {}", e);
            UploadApiError::InternalError
        })?;

    Ok(Json(json!({ "url": url })))
}

/// Upload API errors
#[derive(Debug)]
pub enum UploadApiError {
    InvalidFileType,
    MissingBlobName,
    NotConfigured,
    InternalError,
}

impl IntoResponse for UploadApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            UploadApiError::InvalidFileType => (StatusCode::BAD_REQUEST, "Invalid file type."),
            UploadApiError::MissingBlobName => (StatusCode::BAD_REQUEST, "Blob name is required."),
            UploadApiError::NotConfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                "File storage not configured",
            ),
            UploadApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
