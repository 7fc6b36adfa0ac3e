// src/config.rs
use std::path::PathBuf;
use std::str::FromStr;

/// Runtime settings, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: String,
    pub model_path: PathBuf,
    pub vectorizer_path: PathBuf,
    pub intents_path: PathBuf,
    pub export_dir: PathBuf,
    /// Wipe the chat log every time the server starts.
    pub reset_log_on_startup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            database_url: "sqlite://chat_history.db?mode=rwc".to_string(),
            model_path: PathBuf::from("model.json"),
            vectorizer_path: PathBuf::from("vectorizer.json"),
            intents_path: PathBuf::from("intents.json"),
            export_dir: PathBuf::from("exports"),
            reset_log_on_startup: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset or unparsable keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let string = |key: &str, default: String| lookup(key).filter(|v| !v.is_empty()).unwrap_or(default);
        let path = |key: &str, default: PathBuf| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from).unwrap_or(default);

        Self {
            bind_addr: string("BIND_ADDR", defaults.bind_addr),
            database_url: string("DATABASE_URL", defaults.database_url),
            model_path: path("MODEL_PATH", defaults.model_path),
            vectorizer_path: path("VECTORIZER_PATH", defaults.vectorizer_path),
            intents_path: path("INTENTS_PATH", defaults.intents_path),
            export_dir: path("EXPORT_DIR", defaults.export_dir),
            reset_log_on_startup: parse_or(
                "CHAT_LOG_RESET_ON_STARTUP",
                lookup("CHAT_LOG_RESET_ON_STARTUP"),
                defaults.reset_log_on_startup,
            ),
        }
    }
}

fn parse_or<T: FromStr + std::fmt::Debug>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(value) => match value.trim().to_lowercase().parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!("Ignoring invalid {}={:?}, using {:?}", key, value, default);
                default
            }
        },
        None => default,
    }
}
