use rusqlite::Connection;
use std::path::Path;
use anyhow::{Context, Result};
use crate::config::{BackendConfig, ConfigError, DbConfig};
use crate::db::migrations::MigrationManager;

/// Database connection manager
pub struct DbConnection;

impl DbConnection {
    /// Open the store described by the backend config
    pub fn connect(config: &BackendConfig) -> Result<Connection> {
        match &config.db {
            DbConfig::Sqlite { path } => Self::connect_path(path),
            DbConfig::Remote { engine, .. } => Err(ConfigError::UnsupportedEngine(engine.clone()).into()),
        }
    }

    /// Connect to a database file, creating it and parent directories if needed
    pub fn connect_path(db_path: &Path) -> Result<Connection> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

        MigrationManager::initialize(&conn)
            .context("Failed to initialize database schema")?;

        log::debug!("Opened database {}", db_path.display());
        Ok(conn)
    }

    /// Connect to an in-memory database (for testing)
    pub fn connect_in_memory() -> Result<Connection> {
        let conn = Connection::open_in_memory()
            .context("Failed to open in-memory database")?;

        MigrationManager::initialize(&conn)
            .context("Failed to initialize database schema")?;

        Ok(conn)
    }
}
