use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cardcatalog_backend::{
    build_router, config::AppConfig, database, repository::CardRepository, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables first so RUST_LOG from .env applies
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("cardcatalog_backend=info,sqlx=warn,tower_http=info")
            }),
        )
        .init();

    let config = AppConfig::from_env()?;
    info!(
        "🗂️ Tables: cards={}, images={}, banlist_tcg={}, banlist_ocg={}",
        config.tables.cards, config.tables.images, config.tables.banlist_tcg, config.tables.banlist_ocg
    );

    let pool = database::create_pool(&config).await?;
    info!("✅ Connected to PostgreSQL");

    if config.skip_migrations {
        warn!("⚠️ Skipping migrations due to SKIP_MIGRATIONS=true");
    } else {
        match database::run_migrations(&pool).await {
            Ok(_) => info!("✅ Migrations completed successfully"),
            Err(sqlx::migrate::MigrateError::VersionMismatch(version)) => {
                warn!("⚠️  Migration version mismatch: {}", version);
                warn!("Database has different migration state than expected");
            }
            Err(e) => {
                warn!("❌ Failed to run migrations: {}", e);
                warn!("Continuing without migrations (set SKIP_MIGRATIONS=true to suppress this warning)");
            }
        }
    }

    let repo = CardRepository::new(pool.clone(), config.tables.clone());
    let addr = (config.host.clone(), config.port);
    let app = build_router(AppState::new(repo, config));

    let listener = tokio::net::TcpListener::bind((addr.0.as_str(), addr.1)).await?;
    info!("🚀 Server starting on http://{}:{}", addr.0, addr.1);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Server stopped, closing connection pool");
    pool.close().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
