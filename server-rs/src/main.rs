use std::net::SocketAddr;
use std::sync::Arc;

use foosball_api::config::{Config, StorageBackend, DEV_JWT_SECRET};
use foosball_api::services::BcryptHasher;
use foosball_api::store::{MemoryStore, PgStore};
use foosball_api::{build_router, db, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .json()
        .init();

    if config.jwt.secret == DEV_JWT_SECRET && !config.is_development() {
        tracing::warn!("JWT_SECRET is the development placeholder; set a real secret");
    }

    let hasher = Arc::new(BcryptHasher::new(config.bcrypt_cost));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let state = match config.storage {
        StorageBackend::Postgres => {
            let pool = db::create_pool(&config).await?;
            if config.run_migrations {
                db::run_migrations(&pool).await?;
                tracing::info!("Migrations applied");
            }
            AppState::new(config, Arc::new(PgStore::new(pool)), hasher)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on exit");
            AppState::new(config, Arc::new(MemoryStore::new()), hasher)
        }
    };

    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Foosball API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
