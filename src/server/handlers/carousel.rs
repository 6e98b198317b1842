//! Archive-building endpoint used as the export fallback.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::archive;
use crate::export::ARCHIVE_FILENAME;
use crate::export::fallback::ArchiveRequest;

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// POST /api/carousel/export - zip base64 slides into a stored archive.
pub async fn export(payload: Result<Json<ArchiveRequest>, JsonRejection>) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "unreadable export request");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to export carousel");
        }
    };
    if request.slides.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "No slides provided");
    }

    let files = match request.into_files() {
        Ok(files) => files,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, e.to_string()),
    };
    let count = files.len();

    let built = tokio::task::spawn_blocking(move || archive::build_archive(&files)).await;
    let bytes = match built {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "archive build failed");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to create ZIP: {}", e));
        }
        Err(e) => {
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("Task error: {}", e));
        }
    };

    tracing::info!(slides = count, bytes = bytes.len(), "archive built");
    (
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", ARCHIVE_FILENAME),
            ),
        ],
        bytes,
    )
        .into_response()
}
