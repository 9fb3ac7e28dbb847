use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tradejournal::config::{Config, ConfigError};
use tradejournal::{api, db::init_db, Repository};

#[derive(Debug, Error)]
enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to initialize database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Failed to bind to {0}: {1}")]
    Bind(SocketAddr, std::io::Error),
    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = Config::from_env()?;
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));

    let pool = init_db(&config.database_path).await?;
    let repo = Arc::new(Repository::new(pool));
    tracing::info!(
        currency = config.default_currency.code(),
        debounce_ms = config.recompute_debounce.as_millis() as u64,
        "Journal service configured"
    );

    let app = api::create_router(api::AppState::new(repo, config));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| StartupError::Bind(addr, e))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
