// lib.rs - intent-classifying chat assistant
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod nlp;
pub mod responder;

use std::path::PathBuf;

// AppState holds everything request handlers share: the resolution policy with its
// loaded artifacts, the chat log, and where export files are written.
pub struct AppState {
    pub responder: responder::Responder,
    pub chat_log: db::ChatLog,
    pub export_dir: PathBuf,
}
