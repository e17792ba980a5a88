// region:    --- Imports
use auction_ledger::config::{Config, StoreBackend};
use auction_ledger::database::DatabaseManager;
use auction_ledger::routes;
use auction_ledger::store::{MemoryLedgerStore, PostgresLedgerStore, SharedStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = Config::load()?;
    info!("{:<12} --> store backend: {}", "Main", config.store);

    let store: SharedStore = match config.store {
        StoreBackend::Postgres => {
            let db_manager = Arc::new(DatabaseManager::from_config(&config).await?);
            if let Err(e) = db_manager.initialize_database(config.reset_database).await {
                error!("{:<12} --> database initialisation failed: {:?}", "Main", e);
                return Err(e.into());
            }
            info!("{:<12} --> database ready", "Main");
            Arc::new(PostgresLedgerStore::new(db_manager))
        }
        StoreBackend::Memory => {
            warn!("{:<12} --> in-memory store, data is lost on exit", "Main");
            Arc::new(MemoryLedgerStore::new())
        }
    };

    let routes_all = routes::router(store);

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
