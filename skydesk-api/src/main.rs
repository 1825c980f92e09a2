use std::net::SocketAddr;

use anyhow::Context;
use skydesk_api::{app, AppState, AuthConfig};
use skydesk_core::Services;
use skydesk_store::app_config::{Config, StorageBackend};
use skydesk_store::DbClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "skydesk_api=debug,skydesk_core=debug,skydesk_store=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting SkyDesk API on port {}", config.server.port);

    let repos = match config.storage.backend {
        StorageBackend::Postgres => {
            let db = DbClient::new(&config.database)
                .await
                .context("Failed to connect to Postgres")?;
            if config.database.run_migrations {
                db.migrate().await.context("Failed to run migrations")?;
            }
            skydesk_store::postgres_repositories(&db)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            skydesk_store::memory_repositories()
        }
    };

    if !config.auth.enabled {
        tracing::warn!("Authentication is disabled; every /api route is open");
    }

    let app_state = AppState {
        services: Services::new(repos, config.rules.clone()),
        auth: AuthConfig::from(&config.auth),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
