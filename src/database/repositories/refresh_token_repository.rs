// ABOUTME: SQLite implementation of RefreshTokenRepository
// ABOUTME: Delegates refresh token storage, rotation and cleanup to Database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

use super::RefreshTokenRepository;
use crate::database::Database;
use crate::errors::AppResult;
use crate::models::RefreshToken;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// SQLite implementation of `RefreshTokenRepository`
pub struct RefreshTokenRepositoryImpl {
    db: Database,
}

impl RefreshTokenRepositoryImpl {
    /// Create a new `RefreshTokenRepository` with the given database connection
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RefreshTokenRepository for RefreshTokenRepositoryImpl {
    async fn create(&self, token: &RefreshToken) -> AppResult<()> {
        self.db.create_refresh_token(token).await
    }

    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshToken>> {
        self.db.get_refresh_token_by_hash(token_hash).await
    }

    async fn rotate(
        &self,
        id: Uuid,
        current_hash: &str,
        new_hash: &str,
        used_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.db
            .rotate_refresh_token_hash(id, current_hash, new_hash, used_at)
            .await
    }

    async fn touch(&self, id: Uuid, used_at: DateTime<Utc>) -> AppResult<bool> {
        self.db.touch_refresh_token(id, used_at).await
    }

    async fn count_active_by_user(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u32> {
        self.db.count_active_refresh_tokens(user_id, now).await
    }

    async fn find_active_by_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<RefreshToken>> {
        self.db.get_active_refresh_tokens(user_id, now).await
    }

    async fn revoke_by_id(&self, id: Uuid, reason: &str, at: DateTime<Utc>) -> AppResult<bool> {
        self.db.revoke_refresh_token(id, reason, at).await
    }

    async fn revoke_all_by_user(
        &self,
        user_id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        self.db.revoke_all_refresh_tokens(user_id, reason, at).await
    }

    async fn revoke_by_device(
        &self,
        user_id: Uuid,
        device_id: &str,
        reason: &str,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        self.db
            .revoke_device_refresh_tokens(user_id, device_id, reason, at)
            .await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        self.db.delete_expired_refresh_tokens(now).await
    }

    async fn delete_revoked_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        self.db.delete_revoked_refresh_tokens(cutoff).await
    }
}
