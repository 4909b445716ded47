//! SQL schema definitions.
//!
//! The schema is designed to be portable between SQLite and PostgreSQL.

use crate::Result;
use crate::backend::errors::BackendError;

use super::{SqlxBackend, SqlxResultExt};

/// Current schema version.
///
/// Databases recording a higher version are refused.
pub const SCHEMA_VERSION: i64 = 1;

/// SQL statements to create the schema tables.
pub const CREATE_TABLES: &[&str] = &[
    // Schema version tracking
    "CREATE TABLE IF NOT EXISTS schema_version (
        version BIGINT PRIMARY KEY
    )",
    // User directory
    // Masks are u64 values bit-cast into signed BIGINT so bit 63 survives.
    // NULL masks mean the record has no permission model yet.
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY NOT NULL,
        username TEXT NOT NULL UNIQUE,
        permissions BIGINT,
        flags BIGINT
    )",
];

/// Initialize the database schema.
///
/// Creates tables if they don't exist and records [`SCHEMA_VERSION`]. A database
/// written by a newer schema is rejected.
pub async fn initialize(backend: &SqlxBackend) -> Result<()> {
    let pool = backend.pool();

    for statement in CREATE_TABLES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .connect_context(&format!("Schema creation failed - SQL: {statement}"))?;
    }

    let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_optional(pool)
        .await
        .connect_context("Failed to check schema version")?;

    match row {
        None => {
            sqlx::query("INSERT INTO schema_version (version) VALUES ($1)")
                .bind(SCHEMA_VERSION)
                .execute(pool)
                .await
                .connect_context("Failed to initialize schema version")?;
        }
        Some((current,)) if current > SCHEMA_VERSION => {
            return Err(BackendError::Connect {
                reason: format!(
                    "database schema v{current} is newer than supported v{SCHEMA_VERSION}"
                ),
                source: None,
            }
            .into());
        }
        Some(_) => {}
    }

    Ok(())
}
