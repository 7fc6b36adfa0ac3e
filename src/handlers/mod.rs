// src/handlers/mod.rs
pub mod chat;
pub mod download;
pub mod status;
pub mod ui;

use crate::AppState;
use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Full application router with shared state and middleware attached.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(ui::ui_routes())
        .merge(chat::chat_routes())
        .merge(download::download_routes())
        .merge(status::status_routes())
        .layer(axum::middleware::from_fn(crate::middleware::logging::request_logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}
