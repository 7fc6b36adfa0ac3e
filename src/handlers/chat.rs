// src/handlers/chat.rs
use crate::error::AppError;
use crate::models::chat::{current_timestamp, ChatRequest, ChatResponse};
use crate::responder::{Reply, Responder};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension},
    response::Json,
    routing::post,
    Router,
};
use std::sync::Arc;

pub fn chat_routes() -> Router {
    Router::new().route("/chat", post(chat))
}

async fn chat(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = match payload {
        Ok(Json(request)) => request.message.unwrap_or_default(),
        Err(rejection) => {
            tracing::warn!("Unreadable chat payload: {}", rejection);
            String::new()
        }
    };

    if message.trim().is_empty() {
        return Err(AppError::EmptyMessage);
    }

    let reply = resolve_reply(&state.responder, &message);
    tracing::info!(source = reply.source.label(), "💬 Resolved reply");

    let timestamp = current_timestamp();
    let turn_id = state.chat_log.append_turn(&message, &reply.text, &timestamp).await?;
    tracing::debug!("Logged chat turn {}", turn_id);

    Ok(Json(ChatResponse { reply: reply.text }))
}

// Keeps the thread-local rng out of the handler future.
fn resolve_reply(responder: &Responder, message: &str) -> Reply {
    let mut rng = rand::thread_rng();
    responder.respond(message, &mut rng)
}
