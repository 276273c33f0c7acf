use std::sync::Arc;

use dotenvy::dotenv;
use ke_youtube_stats::{create_router, AppState, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    if config.youtube_api_key.is_none() {
        tracing::warn!("YOUTUBE_API_KEY is not set, every query will return a configuration error");
    }
    if config.gemini_api_key.is_none() {
        tracing::info!("GEMINI_API_KEY is not set, aiAnswer will be empty");
    }

    let state = AppState::from_config(&config)?;
    let app = create_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
