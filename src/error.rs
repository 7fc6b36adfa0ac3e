// src/error.rs
use crate::export::ExportError;
use crate::models::chat::ChatResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

pub const EMPTY_MESSAGE_REPLY: &str = "Please enter a message.";

/// Failures surfaced by HTTP handlers.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{}", EMPTY_MESSAGE_REPLY)]
    EmptyMessage,
    #[error("Invalid file type")]
    InvalidExportFormat(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::EmptyMessage => (
                StatusCode::BAD_REQUEST,
                Json(ChatResponse {
                    reply: EMPTY_MESSAGE_REPLY.to_string(),
                }),
            )
                .into_response(),
            AppError::InvalidExportFormat(requested) => {
                tracing::warn!("Rejected export format '{}'", requested);
                (StatusCode::BAD_REQUEST, "Invalid file type").into_response()
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "database failure while handling chat");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ChatResponse { reply: e.to_string() }),
                )
                    .into_response()
            }
            AppError::Export(e) => {
                tracing::error!(error = %e, "export failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
            }
        }
    }
}
