// ABOUTME: Refresh token database operations
// ABOUTME: Hash-only storage, compare-and-swap rotation, revocation and retention cleanup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

use super::{from_timestamp, parse_uuid, Database};
use crate::errors::AppResult;
use crate::models::{DeviceInfo, RefreshToken};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

const TOKEN_COLUMNS: &str = "id, user_id, token_hash, device_name, device_type, device_id, \
     user_agent, ip_address, expires_at, revoked, revoked_at, revoked_reason, last_used_at, created_at";

impl Database {
    /// Create the refresh tokens table
    pub(super) async fn migrate_refresh_tokens(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS refresh_tokens (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                token_hash TEXT NOT NULL UNIQUE,
                device_name TEXT,
                device_type TEXT,
                device_id TEXT,
                user_agent TEXT,
                ip_address TEXT,
                expires_at INTEGER NOT NULL,
                revoked INTEGER NOT NULL DEFAULT 0,
                revoked_at INTEGER,
                revoked_reason TEXT,
                last_used_at INTEGER,
                created_at INTEGER NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_refresh_tokens_user_active ON refresh_tokens(user_id, revoked, expires_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_refresh_tokens_expires_at ON refresh_tokens(expires_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a new refresh token
    ///
    /// # Errors
    ///
    /// Returns a database error if the insert fails
    pub async fn create_refresh_token(&self, token: &RefreshToken) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO refresh_tokens (id, user_id, token_hash, device_name, device_type, device_id,
                                        user_agent, ip_address, expires_at, revoked, revoked_at,
                                        revoked_reason, last_used_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(token.id.to_string())
        .bind(token.user_id.to_string())
        .bind(&token.token_hash)
        .bind(&token.device.device_name)
        .bind(&token.device.device_type)
        .bind(&token.device.device_id)
        .bind(&token.device.user_agent)
        .bind(&token.device.ip_address)
        .bind(token.expires_at.timestamp())
        .bind(token.revoked)
        .bind(token.revoked_at.map(|t| t.timestamp()))
        .bind(&token.revoked_reason)
        .bind(token.last_used_at.map(|t| t.timestamp()))
        .bind(token.created_at.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Find a refresh token by the hash of its secret
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails
    pub async fn get_refresh_token_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshToken>> {
        let row = sqlx::query(&format!(
            "SELECT {TOKEN_COLUMNS} FROM refresh_tokens WHERE token_hash = ?"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_refresh_token).transpose()
    }

    /// Replace the stored hash if it still equals `current_hash` (compare-and-swap)
    ///
    /// Returns `false` when another caller rotated, revoked or the token expired first.
    ///
    /// # Errors
    ///
    /// Returns a database error if the update fails
    pub async fn rotate_refresh_token_hash(
        &self,
        token_id: Uuid,
        current_hash: &str,
        new_hash: &str,
        used_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE refresh_tokens
            SET token_hash = ?, last_used_at = ?
            WHERE id = ? AND token_hash = ? AND revoked = 0 AND expires_at > ?
            ",
        )
        .bind(new_hash)
        .bind(used_at.timestamp())
        .bind(token_id.to_string())
        .bind(current_hash)
        .bind(used_at.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Record use of a token that is still active
    ///
    /// # Errors
    ///
    /// Returns a database error if the update fails
    pub async fn touch_refresh_token(&self, token_id: Uuid, used_at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET last_used_at = ? WHERE id = ? AND revoked = 0 AND expires_at > ?",
        )
        .bind(used_at.timestamp())
        .bind(token_id.to_string())
        .bind(used_at.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Count a user's active (unrevoked, unexpired) tokens
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails
    pub async fn count_active_refresh_tokens(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u32> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM refresh_tokens WHERE user_id = ? AND revoked = 0 AND expires_at > ?",
        )
        .bind(user_id.to_string())
        .bind(now.timestamp())
        .fetch_one(&self.pool)
        .await?;

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    /// List a user's active tokens, oldest issued first
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails
    pub async fn get_active_refresh_tokens(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<RefreshToken>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {TOKEN_COLUMNS} FROM refresh_tokens
            WHERE user_id = ? AND revoked = 0 AND expires_at > ?
            ORDER BY created_at ASC, rowid ASC
            "
        ))
        .bind(user_id.to_string())
        .bind(now.timestamp())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_refresh_token).collect()
    }

    /// Revoke one token; returns `false` if it was already revoked or missing
    ///
    /// # Errors
    ///
    /// Returns a database error if the update fails
    pub async fn revoke_refresh_token(
        &self,
        token_id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE refresh_tokens SET revoked = 1, revoked_at = ?, revoked_reason = ?
            WHERE id = ? AND revoked = 0
            ",
        )
        .bind(at.timestamp())
        .bind(reason)
        .bind(token_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Revoke every unrevoked token of a user
    ///
    /// # Errors
    ///
    /// Returns a database error if the update fails
    pub async fn revoke_all_refresh_tokens(
        &self,
        user_id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r"
            UPDATE refresh_tokens SET revoked = 1, revoked_at = ?, revoked_reason = ?
            WHERE user_id = ? AND revoked = 0
            ",
        )
        .bind(at.timestamp())
        .bind(reason)
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Revoke every unrevoked token a user holds on one device
    ///
    /// # Errors
    ///
    /// Returns a database error if the update fails
    pub async fn revoke_device_refresh_tokens(
        &self,
        user_id: Uuid,
        device_id: &str,
        reason: &str,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r"
            UPDATE refresh_tokens SET revoked = 1, revoked_at = ?, revoked_reason = ?
            WHERE user_id = ? AND device_id = ? AND revoked = 0
            ",
        )
        .bind(at.timestamp())
        .bind(reason)
        .bind(user_id.to_string())
        .bind(device_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Physically delete tokens past expiry
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails
    pub async fn delete_expired_refresh_tokens(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= ?")
            .bind(now.timestamp())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Physically delete tokens revoked before `cutoff`
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails
    pub async fn delete_revoked_refresh_tokens(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result =
            sqlx::query("DELETE FROM refresh_tokens WHERE revoked = 1 AND revoked_at < ?")
                .bind(cutoff.timestamp())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    fn row_to_refresh_token(row: &SqliteRow) -> AppResult<RefreshToken> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;

        Ok(RefreshToken {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            token_hash: row.try_get("token_hash")?,
            device: DeviceInfo {
                device_name: row.try_get("device_name")?,
                device_type: row.try_get("device_type")?,
                device_id: row.try_get("device_id")?,
                user_agent: row.try_get("user_agent")?,
                ip_address: row.try_get("ip_address")?,
            },
            expires_at: from_timestamp(row.try_get("expires_at")?),
            revoked: row.try_get("revoked")?,
            revoked_at: row
                .try_get::<Option<i64>, _>("revoked_at")?
                .map(from_timestamp),
            revoked_reason: row.try_get("revoked_reason")?,
            last_used_at: row
                .try_get::<Option<i64>, _>("last_used_at")?
                .map(from_timestamp),
            created_at: from_timestamp(row.try_get("created_at")?),
        })
    }
}
