use anyhow::{Context, Result};
use folio_api::{create_app, AppState, Config};
use folio_store::db::{backup_database, create_pool, run_migrations};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = folio_logging::init_subscriber();

    // Load configuration
    let config = Config::from_env();
    info!(
        "Starting folio-api {} (bind_addr={}, db_path={})",
        env!("CARGO_PKG_VERSION"),
        config.bind_addr,
        config.db_path.display()
    );

    // Snapshot the existing database before migrations touch it
    if config.db_path.exists() {
        let backup_path = backup_database(&config.db_path)
            .with_context(|| format!("Failed to back up {}", config.db_path.display()))?;
        info!("Database backed up to: {}", backup_path.display());
    }

    // Create pool and run migrations
    let pool = create_pool(&config.db_path).await?;
    run_migrations(&pool)
        .await
        .context("Failed to migrate database")?;
    info!("Database ready");

    // Serve until Ctrl+C
    let app = create_app(AppState::new(pool.clone()));
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Received shutdown signal, stopping folio-api gracefully");
        })
        .await
        .context("Server failed")?;

    pool.close().await;

    Ok(())
}
