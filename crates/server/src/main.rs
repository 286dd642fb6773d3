use server::{AppState, config::Config, routes};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum CorkboardError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Config(#[from] server::config::ConfigError),
}

#[tokio::main]
async fn main() -> Result<(), CorkboardError> {
    // Load .env file if present (for development)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let db = db::DBService::new(&config.database_path).await?;
    let state = AppState::new(db, config.clone());

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    tracing::info!(addr = %listener.local_addr()?, "corkboard server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
