use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};

use crate::config::{AppConfig, PoolSettings};

/// Open the shared pool described by `config`.
pub async fn create_pool(config: &AppConfig) -> Result<PgPool, sqlx::Error> {
    let connect = config
        .database_url
        .parse::<PgConnectOptions>()?
        .application_name(env!("CARGO_PKG_NAME"));

    tracing::info!(
        "🔌 Opening database pool (max={}, min={}, acquire_timeout={:?})",
        config.pool.max_connections,
        config.pool.min_connections,
        config.pool.acquire_timeout
    );

    pool_options(&config.pool).connect_with(connect).await
}

fn pool_options(settings: &PoolSettings) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.acquire_timeout)
        .idle_timeout(settings.idle_timeout)
}

/// Apply the embedded migrations under `./migrations`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
