//! # Database
//!
//! Relational store for every table in the `entity` crate.
//!
//! ## Requirements
//!
//! - Unique constraints at the storage layer for short links and join pairs
//! - Transactions with savepoints, short links are assigned inside the recipe insert
//! - SQLite for development and tests, Postgres in deployment
//!
//! ## Implementation
//!
//! - sea-orm over sqlx, one pool shared by every request
//! - Schema is created from the entity definitions on startup, `IF NOT EXISTS`
use std::time::Duration;

use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

pub async fn init_database(database_url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url);
    options.connect_timeout(Duration::from_secs(5));

    let db = Database::connect(options).await?;
    entity::setup_schema(&db).await?;

    info!("Database schema ready");

    Ok(db)
}
