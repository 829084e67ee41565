//! Axum API server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_api::{create_router, metrics, ApiConfig, AppState};
use reel_genai::{EnvKeySelector, GenAiConfig, GeminiClient, KeySelector};
use reel_pipeline::{Orchestrator, PipelineConfig, ProjectStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("reel=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting reel-api");

    // Load configuration
    let config = ApiConfig::from_env();
    info!("API config: host={}, port={}", config.host, config.port);

    let genai_config = GenAiConfig::from_env();
    let pipeline_config = PipelineConfig::from_env();
    info!(
        text_model = %genai_config.text_model,
        image_model = %genai_config.image_model,
        video_model = %genai_config.video_model,
        default_mode = %pipeline_config.default_video_mode,
        media_dir = %pipeline_config.media_dir.display(),
        "Pipeline config loaded"
    );

    let keys: Arc<dyn KeySelector> = Arc::new(EnvKeySelector::from_env());
    if !keys.has_selected_key().await {
        warn!("No API key selected; generation will request key selection");
    }
    let client = GeminiClient::new(genai_config, Arc::clone(&keys))
        .context("Failed to create generative client")?;

    tokio::fs::create_dir_all(&pipeline_config.media_dir)
        .await
        .context("Failed to create media directory")?;

    let orchestrator = Orchestrator::new(
        Arc::new(client),
        keys,
        Arc::new(ProjectStore::new()),
        pipeline_config,
    );
    let state = AppState::new(config.clone(), Arc::new(orchestrator));

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics().context("Failed to install Prometheus recorder")?)
    } else {
        None
    };

    // Create router
    let app = create_router(state, metrics_handle);

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid bind address")?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
