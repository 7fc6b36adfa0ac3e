// src/handlers/status.rs
use crate::AppState;
use axum::{extract::Extension, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn status_routes() -> Router {
    Router::new().route("/api/status", get(api_status))
}

async fn api_status(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let logged_turns = match state.chat_log.count_turns().await {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!("Failed to count chat turns: {}", e);
            None
        }
    };

    Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "classifier": if state.responder.is_model_available() { "loaded" } else { "fallback_only" },
        "intents": state.responder.catalog().len(),
        "logged_turns": logged_turns,
        "endpoints": {
            "chat": "/chat",
            "download": "/download/{csv|excel|pdf}",
            "status": "/api/status"
        }
    }))
}
