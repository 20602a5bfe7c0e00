use crate::error::EntityFsError;
use clap::Parser;
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Clone, Parser)]
pub struct StartArgs {
    #[arg(short, long, default_value = "config.json")]
    pub config_path: String,

    #[arg(short, long, default_value = "127.0.0.1")]
    pub address: String,

    #[arg(short, long, default_value = "3030")]
    pub port: u16,

    #[arg(short, long, default_value = "INFO")]
    pub log_level: tracing::Level,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// The table holding all entities
    pub table: String,

    /// Name given to the root folder when it has to be created
    #[serde(default = "default_root_name")]
    pub root_name: String,

    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    pub fn read(path: impl AsRef<Path>) -> Result<Self, EntityFsError> {
        let config = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&config)?)
    }
}

fn default_root_name() -> String {
    "root".to_string()
}

/// Which item store backs the tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Tables live in process memory and are gone on restart
    #[default]
    Memory,

    /// Tables are kept in the Postgres database at `DATABASE_URL`
    Postgres,
}
