// ABOUTME: Repository traits for users, provider links and refresh tokens
// ABOUTME: Narrow persistence contracts the auth services depend on
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

//! Repository pattern
//!
//! Services hold `Arc<dyn ...Repository>` and never touch SQL directly.
//! The SQLite implementations wrap [`Database`](super::Database).

mod provider_link_repository;
mod refresh_token_repository;
mod user_repository;

pub use provider_link_repository::ProviderLinkRepositoryImpl;
pub use refresh_token_repository::RefreshTokenRepositoryImpl;
pub use user_repository::UserRepositoryImpl;

use crate::errors::AppResult;
use crate::models::{ProviderLink, ProviderTokenUpdate, RefreshToken, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Local user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by email (case-insensitive)
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Create a user; fails with `ResourceAlreadyExists` on a duplicate email
    async fn create(&self, user: &User) -> AppResult<Uuid>;

    /// Update mutable profile fields (verification flag, names, last login)
    async fn update(&self, user: &User) -> AppResult<()>;

    /// Record a successful login
    async fn update_last_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;
}

/// Links between local users and provider identities
#[async_trait]
pub trait ProviderLinkRepository: Send + Sync {
    /// Find the link for a provider identity
    async fn find_by_provider_user(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> AppResult<Option<ProviderLink>>;

    /// List a user's links
    async fn find_by_user_id(&self, user_id: Uuid) -> AppResult<Vec<ProviderLink>>;

    /// Create a link; fails with `ResourceAlreadyExists` if the identity is already linked
    async fn create(&self, link: &ProviderLink) -> AppResult<()>;

    /// Store refreshed provider tokens and profile snapshot
    async fn update_tokens(&self, link_id: Uuid, update: &ProviderTokenUpdate) -> AppResult<()>;

    /// Delete a user's link to `provider`; returns whether a link existed
    async fn delete(&self, user_id: Uuid, provider: &str) -> AppResult<bool>;
}

/// Refresh token records (hash only)
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Persist a new token
    async fn create(&self, token: &RefreshToken) -> AppResult<()>;

    /// Find a token by the hash of its secret, regardless of state
    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshToken>>;

    /// Atomically replace `current_hash` with `new_hash` on an active token
    ///
    /// Returns `false` if the stored hash no longer matches or the token is no longer active.
    async fn rotate(
        &self,
        id: Uuid,
        current_hash: &str,
        new_hash: &str,
        used_at: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Update the last-used timestamp of an active token
    async fn touch(&self, id: Uuid, used_at: DateTime<Utc>) -> AppResult<bool>;

    /// Count active tokens of a user
    async fn count_active_by_user(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u32>;

    /// Active tokens of a user ordered oldest issued first
    async fn find_active_by_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<RefreshToken>>;

    /// Revoke one token; returns `false` if already revoked or missing
    async fn revoke_by_id(&self, id: Uuid, reason: &str, at: DateTime<Utc>) -> AppResult<bool>;

    /// Revoke all unrevoked tokens of a user
    async fn revoke_all_by_user(
        &self,
        user_id: Uuid,
        reason: &str,
        at: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Revoke all unrevoked tokens of a user on one device
    async fn revoke_by_device(
        &self,
        user_id: Uuid,
        device_id: &str,
        reason: &str,
        at: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Delete tokens past expiry
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;

    /// Delete tokens revoked before `cutoff`
    async fn delete_revoked_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}
