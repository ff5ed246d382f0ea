//! intervox gateway: WebSocket interview transport (default) or the
//! terminal interview loop (`--cli`). Both drive the identical session
//! operations; the transport is the only difference.

mod cli;
mod events;
mod ws;

use axum::routing::get;
use axum::Router;
use intervox_core::{CannedText, EngineConfig, OpenAiText, TextGenerator};
use intervox_engine::SessionRegistry;
use intervox_voice::{create_best_stt, create_best_tts};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::info;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = EngineConfig::from_env();

    let generator: Arc<dyn TextGenerator> = match OpenAiText::from_env() {
        Some(backend) => {
            info!("text generation: OpenAI-compatible backend");
            Arc::new(backend)
        }
        None => {
            info!("text generation: canned responses (set LLM_API_KEY for real generation)");
            Arc::new(CannedText::new())
        }
    };
    let synthesizer = Arc::from(create_best_tts());
    let transcriber = Arc::from(create_best_stt());

    let registry = Arc::new(SessionRegistry::new(
        config.clone(),
        generator,
        synthesizer,
        transcriber,
    ));

    if std::env::args().any(|a| a == "--cli") {
        return cli::run(registry).await;
    }

    // Idle sweep: sessions abandoned past the configured period are
    // destroyed without affecting live ones.
    {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                ticker.tick().await;
                let swept = registry.sweep_idle();
                if swept > 0 {
                    info!(swept, "idle sessions destroyed");
                }
            }
        });
    }

    let app = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/interview/ws", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(AppState { registry });

    let bind = std::env::var("INTERVOX_BIND").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    info!("intervox gateway listening on {}", bind);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "service": "intervox-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
