use intent_chatbot::{
    config::Config,
    db::{self, ChatLog},
    handlers,
    models::intent::IntentCatalog,
    nlp::artifacts::ModelArtifacts,
    responder::Responder,
    AppState,
};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize production-grade logging
    init_logging().expect("Failed to initialize logging");

    let config = Config::from_env();
    tracing::info!(?config, "Loaded configuration");

    if let Err(e) = std::fs::create_dir_all(&config.export_dir) {
        tracing::warn!("Failed to create exports directory: {}", e);
    } else {
        tracing::info!("Exports directory ready");
    }

    // A missing or broken model only disables the statistical tier.
    let model = match ModelArtifacts::load(&config.model_path, &config.vectorizer_path) {
        Ok(model) => {
            tracing::info!(
                "✅ Classifier loaded: {} intents, {} features",
                model.classifier.classes().len(),
                model.vectorizer.n_features()
            );
            Some(model)
        }
        Err(e) => {
            tracing::error!("❌ Failed to load model/vectorizer: {}", e);
            tracing::warn!("Running in fallback-only mode. Train with: cargo run --bin train");
            None
        }
    };

    let catalog = match IntentCatalog::load(&config.intents_path) {
        Ok(catalog) => {
            tracing::info!("✅ Loaded {} intents", catalog.len());
            catalog
        }
        Err(e) => {
            tracing::error!("❌ Failed to load intents catalog: {}", e);
            IntentCatalog::default()
        }
    };

    let responder = Responder::new(catalog, model);
    for tag in responder.unmatched_labels() {
        tracing::warn!("Classifier label '{}' has no intent in the catalog; it will never be answered", tag);
    }

    // Create the database connection pool
    let db_pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool.");
    let chat_log = ChatLog::new(db_pool.clone());

    if config.reset_log_on_startup {
        chat_log.reset().await.expect("Failed to reset chat log.");
    }

    let shared_state = Arc::new(AppState {
        responder,
        chat_log,
        export_dir: config.export_dir.clone(),
    });

    let app = handlers::app(shared_state);

    // Run the server with ConnectInfo so request logs carry the peer address
    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", config.bind_addr, e);
            std::process::exit(1);
        }
    };
    match listener.local_addr() {
        Ok(addr) => tracing::info!("listening on {}", addr),
        Err(e) => tracing::warn!("listening, but local address is unknown: {}", e),
    }

    if let Err(e) = axum::serve(listener, app.into_make_service_with_connect_info::<std::net::SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
    }

    db_pool.close().await;
    tracing::info!("👋 Shut down cleanly");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}

// Production-grade logging configuration
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, fmt, Layer};

    // Get log level from environment or default to INFO for production
    let log_level = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                "debug,intent_chatbot=trace,sqlx=info,hyper=info,tower=info".to_string()
            } else {
                "info,intent_chatbot=info,sqlx=warn,hyper=warn,tower=warn".to_string()
            }
        });

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        // JSON logging for production (easier for log aggregation)
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .boxed()
    } else {
        // Human-readable logging for development
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("💬 Chat assistant starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Build mode: {}", if cfg!(debug_assertions) { "development" } else { "production" });
    tracing::info!("Log level: {}", log_level);

    Ok(())
}
