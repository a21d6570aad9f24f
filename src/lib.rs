use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod flash;
pub mod gatekeeper;
pub mod i18n;
pub mod metrics;
pub mod payment;
pub mod routes;
pub mod session;
pub mod toggler;
pub mod utils;

use config::{Config, SeedUser};
use context::AppContext;
use db::{MemoryUserStore, PgUserStore, User, UserStore};
use session::{MemorySessionStore, RedisSessionStore, SessionStore, SessionTtl};

/// Connects the configured stores and assembles the application context
pub async fn build_context(config: Arc<Config>) -> Result<AppContext> {
    let users: Arc<dyn UserStore> = match &config.database_url {
        Some(database_url) => {
            let pool = db::create_pool(database_url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to database");

            tracing::info!("Applying database migrations...");
            sqlx::migrate!().run(&pool).await?;
            tracing::info!("Database migrations applied successfully.");

            Arc::new(PgUserStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, keeping users in memory");
            Arc::new(MemoryUserStore::new())
        }
    };

    let sessions: Arc<dyn SessionStore> = match &config.redis_url {
        Some(redis_url) => {
            let store = tokio::time::timeout(
                std::time::Duration::from_secs(10),
                RedisSessionStore::new(redis_url, &config.session),
            )
            .await
            .map_err(|_| anyhow::anyhow!("Redis connection timed out after 10 seconds"))??;
            tracing::info!("Connected to Redis");
            Arc::new(store)
        }
        None => {
            tracing::warn!("REDIS_URL not set, keeping sessions in memory");
            Arc::new(MemorySessionStore::with_ttl(SessionTtl::from_config(
                &config.session,
            )))
        }
    };

    if let Some(seed) = &config.seed_user {
        seed_user(users.as_ref(), seed, config.password_hash_cost).await?;
    }

    Ok(AppContext::new(users, sessions, config))
}

/// Creates the seed user unless a user with that name exists
pub async fn seed_user(users: &dyn UserStore, seed: &SeedUser, cost: u32) -> Result<()> {
    if users.find_by_name(&seed.name).await?.is_some() {
        tracing::debug!(name = %seed.name, "Seed user already present");
        return Ok(());
    }
    let user = User::new(&seed.name, &seed.password, cost)?;
    users.create(&user).await?;
    tracing::info!(name = %seed.name, "Seed user created");
    Ok(())
}

/// Serves the router on `listener` until ctrl-c
pub async fn serve(app_context: AppContext, listener: TcpListener) -> Result<()> {
    let app = routes::create_router(Arc::new(app_context));

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutdown signal received. Shutting down...");
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing before config so config warnings are visible
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let app_config = Arc::new(Config::from_env()?);
    tracing::info!(
        locales = %app_config.i18n.available_locales,
        default_locale = %app_config.i18n.default_locale,
        login_url = %app_config.login_url,
        "Configuration loaded"
    );

    let app_context = build_context(app_config.clone()).await?;
    tracing::info!(
        before_actions = ?app_context.before_actions.names(),
        "Request pipeline ready"
    );

    let bind_address = format!("0.0.0.0:{}", app_config.port);
    let listener = TcpListener::bind(&bind_address)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Depot server listening on http://{}", bind_address);

    serve(app_context, listener).await
}
