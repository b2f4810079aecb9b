// ABOUTME: User account database operations
// ABOUTME: Handles user creation, lookup by id or email, and login bookkeeping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

use super::{from_timestamp, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::User;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, display_name, avatar_url, password_hash, user_type, \
     email_verified, last_login_at, created_at, updated_at";

impl Database {
    /// Create the users table
    pub(super) async fn migrate_users(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                display_name TEXT,
                avatar_url TEXT,
                password_hash TEXT,
                user_type TEXT NOT NULL DEFAULT 'job_seeker'
                    CHECK (user_type IN ('job_seeker', 'employer', 'admin')),
                email_verified INTEGER NOT NULL DEFAULT 0,
                last_login_at INTEGER,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a new user
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the email is taken, or a database error
    pub async fn create_user(&self, user: &User) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO users (id, email, display_name, avatar_url, password_hash, user_type,
                               email_verified, last_login_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.avatar_url)
        .bind(&user.password_hash)
        .bind(user.user_type.as_str())
        .bind(user.email_verified)
        .bind(user.last_login_at.map(|t| t.timestamp()))
        .bind(user.created_at.timestamp())
        .bind(user.updated_at.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(user.id)
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    /// Get a user by email (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    /// Update the mutable profile fields of a user
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user does not exist, or a database error
    pub async fn update_user(&self, user: &User) -> AppResult<()> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET display_name = ?, avatar_url = ?, user_type = ?, email_verified = ?,
                last_login_at = ?, updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(&user.display_name)
        .bind(&user.avatar_url)
        .bind(user.user_type.as_str())
        .bind(user.email_verified)
        .bind(user.last_login_at.map(|t| t.timestamp()))
        .bind(Utc::now().timestamp())
        .bind(user.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {}", user.id)));
        }
        Ok(())
    }

    /// Record a successful login
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user does not exist, or a database error
    pub async fn update_last_login(&self, user_id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET last_login_at = ?, updated_at = ? WHERE id = ?")
            .bind(at.timestamp())
            .bind(at.timestamp())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {user_id}")));
        }
        Ok(())
    }

    fn row_to_user(row: &SqliteRow) -> AppResult<User> {
        let id: String = row.try_get("id")?;
        let user_type: String = row.try_get("user_type")?;

        Ok(User {
            id: parse_uuid(&id)?,
            email: row.try_get("email")?,
            display_name: row.try_get("display_name")?,
            avatar_url: row.try_get("avatar_url")?,
            password_hash: row.try_get("password_hash")?,
            user_type: user_type.parse().unwrap_or_default(),
            email_verified: row.try_get("email_verified")?,
            last_login_at: row
                .try_get::<Option<i64>, _>("last_login_at")?
                .map(from_timestamp),
            created_at: from_timestamp(row.try_get("created_at")?),
            updated_at: from_timestamp(row.try_get("updated_at")?),
        })
    }
}
