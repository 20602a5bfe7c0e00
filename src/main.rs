use clap::Parser;
use std::sync::Arc;
use tracing::info;

use crate::{
    config::{Config, StartArgs, StoreConfig},
    entity::{mapper::UUID, TableManager},
    error::EntityFsError,
    state::Entities,
    store::{ItemStore, MemoryStore, PgStore},
};

pub mod config;
pub mod entity;
pub mod error;
pub mod router;
pub mod state;
pub mod store;

#[tokio::main]
async fn main() -> Result<(), EntityFsError> {
    dotenv::dotenv().ok();
    let StartArgs {
        config_path,
        address: host,
        port,
        log_level: level,
    } = StartArgs::parse();

    tracing_subscriber::fmt().with_max_level(level).init();

    let Config {
        table,
        root_name,
        store,
    } = Config::read(config_path)?;

    let store: Arc<dyn ItemStore> = match store {
        StoreConfig::Memory => {
            info!("Using in-memory store");
            Arc::new(MemoryStore::new(UUID))
        }
        StoreConfig::Postgres => {
            let db_url = std::env::var("DATABASE_URL")
                .map_err(|_| EntityFsError::Config("DATABASE_URL not set".to_string()))?;
            info!("Using postgres store");
            Arc::new(PgStore::connect(&db_url, UUID).await?)
        }
    };

    let state = Entities::new(TableManager::new(store), &table);
    state.init(&root_name).await?;

    let addr = format!("{host}:{port}");
    info!("Now listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, router::router(state)).await?;

    Ok(())
}
