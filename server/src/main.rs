//! Leafscan API Server
//!
//! HTTP API server for plant leaf disease prediction. Accepts image
//! uploads, classifies them with the loaded model, and enriches the
//! result with generated care advice when an API key is configured.

mod error;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use leafscan::advice::{GeminiClient, GeminiConfig};
use leafscan::backend::{backend_name, default_device, DefaultBackend};
use leafscan::inference::Predictor;

use crate::state::{AppState, ServerConfig};

/// Leafscan API Server
#[derive(Parser, Debug)]
#[command(name = "leafscan-server")]
#[command(version)]
#[command(about = "HTTP API server for leaf disease prediction")]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Path to the model checkpoint
    #[arg(short, long, env = "LEAFSCAN_MODEL")]
    model: Option<PathBuf>,

    /// Directory for temporary uploads
    #[arg(long, env = "LEAFSCAN_UPLOADS_DIR")]
    uploads_dir: Option<PathBuf>,

    /// Maximum upload size in megabytes
    #[arg(long, default_value = "10")]
    max_upload_mb: usize,

    /// Generative model for advice
    #[arg(long, env = "GEMINI_MODEL")]
    gemini_model: Option<String>,

    /// Disable advice generation even when an API key is present
    #[arg(long, default_value = "false")]
    no_advice: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    // Build configuration
    let mut config = ServerConfig::default();

    if let Some(model) = cli.model {
        config.model_path = model;
    }
    if let Some(uploads_dir) = cli.uploads_dir {
        config.uploads_dir = uploads_dir;
    }
    if let Some(gemini_model) = cli.gemini_model {
        config.gemini_model = gemini_model;
    }
    config.max_upload_bytes = cli.max_upload_mb * 1024 * 1024;

    info!("Leafscan API Server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Model:       {:?}", config.model_path);
    info!("  Uploads dir: {:?}", config.uploads_dir);
    info!("  Max upload:  {} MB", cli.max_upload_mb);
    info!("  Backend:     {}", backend_name());

    // The model is the whole service: fail fast when it cannot load
    let device = default_device();
    let predictor = Predictor::<DefaultBackend>::load(&config.model_path, &device)?;
    info!("Model loaded from {:?}", config.model_path);

    // Advice client is optional: without a key the service degrades to
    // prediction-only responses
    let advisor = if cli.no_advice {
        info!("Advice generation disabled by flag");
        None
    } else {
        match std::env::var("GEMINI_API_KEY") {
            Ok(key) if !key.is_empty() => {
                let gemini_config = GeminiConfig::new(key).with_model(&config.gemini_model);
                let client = GeminiClient::new(gemini_config)?;
                info!("Advice generation enabled (model: {})", client.model());
                Some(client)
            }
            _ => {
                warn!("GEMINI_API_KEY not set; advice generation disabled");
                None
            }
        }
    };

    let max_upload_bytes = config.max_upload_bytes;
    let state = Arc::new(AppState::new(config, predictor, advisor));

    // Build router
    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/predict", post(routes::predict::predict))
        .route("/chat", post(routes::chat::chat))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server
    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
