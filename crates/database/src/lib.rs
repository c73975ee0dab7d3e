//! UniEats Database Crate
//!
//! Connection management, embedded migrations, row entities and the
//! repositories that own every SQL statement the backend issues.

use sqlx::SqlitePool;
use unieats_config::DatabaseConfig;

pub mod connection;
pub mod entities;
pub mod ids;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::{prepare_database, DatabaseConnection};
pub use migrations::{run_migrations, MIGRATOR};

pub use entities::*;
pub use repos::*;
pub use types::{DatabaseError, DatabaseResult, Page};

/// Initialize the database with migrations
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(format!("{e:#}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("{e:#}")))?;

    Ok(pool)
}
