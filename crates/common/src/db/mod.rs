//! Store layer: entities, schema and the transactional repository
//!
//! Writes (policy edits, package application, usage, report review) always
//! go to the primary. Listings may be served from a replica when one is
//! configured; launch checks read from the primary so a just-saved policy
//! is honoured on the next launch.

pub mod models;
mod repository;
pub mod schema;

pub use repository::*;

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// Primary connection plus an optional read replica
#[derive(Clone)]
pub struct DbPool {
    primary: DatabaseConnection,
    replica: Option<DatabaseConnection>,
}

async fn connect(url: &str, config: &DatabaseConfig, role: &str) -> Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new(url);
    opts.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .sqlx_logging(false);

    let conn = Database::connect(opts)
        .await
        .map_err(|e| AppError::DatabaseConnection {
            message: format!("Failed to connect to {}: {}", role, e),
        })?;
    info!(role, "Database connection established");
    Ok(conn)
}

async fn ping_one(conn: &DatabaseConnection, role: &str) -> Result<()> {
    conn.execute_unprepared("SELECT 1")
        .await
        .map(|_| ())
        .map_err(|e| AppError::DatabaseConnection {
            message: format!("{} ping failed: {}", role, e),
        })
}

impl DbPool {
    /// Wrap an already-open connection, with no replica
    pub fn from_connection(primary: DatabaseConnection) -> Self {
        Self { primary, replica: None }
    }

    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let primary = connect(&config.url, config, "primary").await?;
        let replica = match config.read_url.as_deref() {
            Some(read_url) => Some(connect(read_url, config, "replica").await?),
            None => None,
        };
        Ok(Self { primary, replica })
    }

    /// Replica if configured, otherwise the primary
    pub fn read(&self) -> &DatabaseConnection {
        self.replica.as_ref().unwrap_or(&self.primary)
    }

    pub fn write(&self) -> &DatabaseConnection {
        &self.primary
    }

    pub async fn ping(&self) -> Result<()> {
        ping_one(&self.primary, "primary").await?;
        if let Some(replica) = &self.replica {
            ping_one(replica, "replica").await?;
        }
        Ok(())
    }
}
