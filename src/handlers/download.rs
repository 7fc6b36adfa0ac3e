// src/handlers/download.rs
use crate::error::AppError;
use crate::export::{self, ExportError, ExportFormat};
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;

pub fn download_routes() -> Router {
    Router::new().route("/download/:filetype", get(download_chat_log))
}

/// Render the whole chat log in the requested format and send it as an attachment
async fn download_chat_log(
    Path(filetype): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Response, AppError> {
    let format: ExportFormat = filetype
        .parse()
        .map_err(|_| AppError::InvalidExportFormat(filetype.clone()))?;

    let turns = state.chat_log.list_all_turns().await.map_err(ExportError::from)?;
    let rendered = export::write_export(&state.export_dir, format, &turns).await?;

    // Serve the bytes this request rendered, not the shared file on disk.
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", format.file_name()),
            ),
        ],
        rendered.bytes,
    )
        .into_response())
}
