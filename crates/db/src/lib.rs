//! PostgreSQL persistence for the course-enrollment platform.
//!
//! - [`models`] -- entities, DTOs, patch DTOs and filters
//! - [`mappers`] -- entity/DTO conversion
//! - [`repositories`] -- sqlx-backed repositories with revision tables
//! - [`memory`] -- in-memory repository with the same semantics
//! - [`services`] -- per-entity services built on the generic CRUD service

use sqlx::postgres::PgPoolOptions;

pub mod config;
pub mod error;
pub mod mappers;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod services;

pub use config::DbConfig;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from the database configuration.
pub async fn create_pool(config: &DbConfig) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.database_url)
        .await
}

/// Round-trip a trivial query to verify connectivity.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the SQL files under `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
