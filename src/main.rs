use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use cardamon_api::config::AppConfig;
use cardamon_api::database::{DatabaseManager, MemoryStore, PgStore, Store};
use cardamon_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env();
    init_tracing(&config);

    config.validate()?;
    tracing::info!("Starting Cardamon API in {:?} mode", config.environment);

    let store: Arc<dyn Store> = if config.database.in_memory {
        tracing::warn!("Using in-memory store; data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let pool = DatabaseManager::connect(&config.database).await?;
        DatabaseManager::migrate(&pool).await?;
        Arc::new(PgStore::new(pool))
    };

    let port = config.api.port;
    let state = AppState::new(store, config)?;

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Cardamon API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let mut default_filter = if config.is_development() {
        "info,cardamon_api=debug".to_string()
    } else {
        "info".to_string()
    };
    if config.api.enable_request_logging {
        default_filter.push_str(",tower_http=debug");
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
