use anyhow::Context;
use bazaar_api::{app, state::RateLimitConfig, AppState};
use bazaar_store::{Config, DbClient, RedisClient, StorageBackend};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bazaar_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Bazaar API on port {}", config.server.port);

    let ledger_settings = config.inventory.ledger_settings();
    let mut state = match config.storage.backend {
        StorageBackend::Postgres => {
            let db = DbClient::new(&config.database)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            AppState::postgres(&db, ledger_settings)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data will not survive a restart");
            AppState::in_memory(ledger_settings)
        }
    };

    if let Some(url) = &config.redis.url {
        let redis = RedisClient::new(url).context("Invalid Redis URL")?;
        state = state.with_rate_limit(RateLimitConfig {
            redis: Arc::new(redis),
            limit: config.redis.limit,
            window_seconds: config.redis.window_seconds,
        });
        tracing::info!(limit = config.redis.limit, window = config.redis.window_seconds, "Rate limiting enabled");
    }

    if config.auth.enabled {
        anyhow::ensure!(!config.auth.jwt_secret.is_empty(), "auth.jwt_secret must be set when auth is enabled");
        state = state.with_auth(config.auth.jwt_secret.clone());
    }

    let state = state
        .with_error_details(config.server.expose_error_details)
        .with_request_timeout(Duration::from_secs(config.server.request_timeout_seconds));

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
