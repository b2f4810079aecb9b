// ABOUTME: SQLite database manager owning the connection pool and schema migrations
// ABOUTME: Users, provider links and refresh tokens with integer timestamps and UUID text ids
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

//! # Database Management
//!
//! Persistence for the records the authentication subsystem owns: local
//! users, provider links and refresh tokens. Services reach the database
//! only through the traits in [`repositories`].

mod provider_links;
mod refresh_tokens;
mod users;

/// Repository traits and their SQLite implementations
pub mod repositories;

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

/// Database manager for auth storage
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (creating if missing) the database at `database_url` and run migrations
    ///
    /// # Errors
    ///
    /// Returns a database error if the URL is invalid, the connection fails
    /// or a migration statement fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::config(format!("Invalid DATABASE_URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to `:memory:` is a separate database, so keep exactly one alive
        let is_memory = database_url.contains(":memory:");
        let pool_options = if is_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await?;
        let db = Self { pool };
        db.migrate().await?;

        info!(in_memory = is_memory, "Database ready");
        Ok(db)
    }

    /// Get a reference to the database pool
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run idempotent schema migrations
    ///
    /// # Errors
    ///
    /// Returns a database error if a statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_users().await?;
        self.migrate_provider_links().await?;
        self.migrate_refresh_tokens().await?;
        Ok(())
    }
}

/// Parse a UUID stored as text
fn parse_uuid(value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| AppError::database(format!("Corrupt UUID '{value}': {e}")))
}

/// Convert stored unix seconds to a UTC timestamp
fn from_timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}
