use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod analysis;
mod api;
mod aws;
mod config;
mod error;
mod speech;

use analysis::AnalysisService;
use api::routes::{create_router, AppState};
use config::AppConfig;
use speech::{PollySynthesizer, SpeechService};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    tracing::info!("Flight brief server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Bedrock model: {}", config.bedrock.model_id);
    tracing::info!(
        "Polly voice: {} ({})",
        config.polly.voice_id,
        config.polly.engine.as_str()
    );

    let model = analysis::bedrock::connect(&config.bedrock).await;
    let synthesizer = PollySynthesizer::connect(&config.polly).await;

    let state = Arc::new(AppState {
        analysis: AnalysisService::new(model, &config.bedrock),
        speech: SpeechService::new(Arc::new(synthesizer), &config.polly),
    });

    let app = create_router(state);

    tracing::info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
