use std::{sync::Arc, time::Duration};

use tracing_subscriber::EnvFilter;

use sommelier_api::{
    api::{create_router, AppState},
    config::Config,
    services::providers::GeminiProvider,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sommelier_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // Single provider instance for the process lifetime.
    let provider = Arc::new(GeminiProvider::new(
        config.gemini_api_key.clone(),
        config.gemini_api_url.clone(),
        config.gemini_model.clone(),
        config.request_timeout_secs.map(Duration::from_secs),
    )?);

    let state = AppState::new(provider);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(host = %config.host, port = config.port, model = %config.gemini_model, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
