// ABOUTME: Refresh token lifecycle: issuance with device cap, rotation, revocation and cleanup
// ABOUTME: Secrets are returned once in plaintext and stored only as SHA-256 hashes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

//! # Refresh token management
//!
//! Each refresh token represents one signed-in device. Issuing a token past
//! the per-user cap revokes the oldest active tokens first. Refreshing
//! rotates the secret with a compare-and-swap on its hash, so of two
//! concurrent refreshes presenting the same secret only one succeeds.

use crate::auth::TokenIssuer;
use crate::config::RefreshTokenConfig;
use crate::constants::tokens::REFRESH_TOKEN_SECRET_BYTES;
use crate::crypto::{generate_random_token, sha256_hex};
use crate::database::repositories::RefreshTokenRepository;
use crate::errors::{AppError, AppResult};
use crate::logging::AuthLogger;
use crate::models::{DeviceInfo, DeviceSummary, RefreshToken, RevocationReason, UserType};
use crate::services::device::enrich_device_info;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A newly issued refresh token
#[derive(Clone, Serialize)]
pub struct IssuedRefreshToken {
    /// Stored token ID
    pub token_id: Uuid,
    /// Plaintext secret, only available at issuance
    pub refresh_token: String,
    /// Expiry timestamp
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedRefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedRefreshToken")
            .field("token_id", &self.token_id)
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Tokens returned by a successful refresh
#[derive(Debug, Clone, Serialize)]
pub struct RefreshedTokens {
    /// New portal access token
    pub access_token: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
    /// Refresh secret the client must use next time
    pub refresh_token: String,
    /// Whether `refresh_token` differs from the presented secret
    pub rotated: bool,
}

/// Issues, rotates and revokes refresh tokens
pub struct RefreshTokenManager {
    repository: Arc<dyn RefreshTokenRepository>,
    token_issuer: Arc<dyn TokenIssuer>,
    config: RefreshTokenConfig,
}

impl RefreshTokenManager {
    /// Create a manager
    #[must_use]
    pub fn new(
        repository: Arc<dyn RefreshTokenRepository>,
        token_issuer: Arc<dyn TokenIssuer>,
        config: RefreshTokenConfig,
    ) -> Self {
        Self {
            repository,
            token_issuer,
            config,
        }
    }

    /// Configuration in effect
    #[must_use]
    pub const fn config(&self) -> &RefreshTokenConfig {
        &self.config
    }

    /// Issue a refresh token for a device
    ///
    /// If the user already holds the maximum number of active tokens, the
    /// oldest are revoked with reason `max_devices_exceeded` first.
    ///
    /// # Errors
    ///
    /// Returns a database error if persistence fails, or an internal error
    /// if the system RNG fails or the expiry window is out of range
    pub async fn create_refresh_token(
        &self,
        user_id: Uuid,
        device: DeviceInfo,
        remember_me: bool,
    ) -> AppResult<IssuedRefreshToken> {
        let now = Utc::now();
        self.enforce_device_cap(user_id, now).await?;

        let expiry_days = if remember_me {
            self.config.remember_me_expiry_days
        } else {
            self.config.expiry_days
        };

        let expires_at = ChronoDuration::try_days(expiry_days)
            .and_then(|window| now.checked_add_signed(window))
            .ok_or_else(|| {
                AppError::internal(format!("Refresh token expiry of {expiry_days} days is out of range"))
            })?;

        let secret = generate_random_token(REFRESH_TOKEN_SECRET_BYTES)?;
        let token = RefreshToken {
            id: Uuid::new_v4(),
            user_id,
            token_hash: sha256_hex(&secret),
            device: enrich_device_info(device),
            expires_at,
            revoked: false,
            revoked_at: None,
            revoked_reason: None,
            last_used_at: None,
            created_at: now,
        };
        self.repository.create(&token).await?;

        AuthLogger::log_token_event(&user_id.to_string(), "refresh_token_issued", Some(&token.id.to_string()));
        debug!(
            token_id = %token.id,
            device_type = token.device.device_type.as_deref().unwrap_or_default(),
            remember_me,
            "Issued refresh token"
        );

        Ok(IssuedRefreshToken {
            token_id: token.id,
            refresh_token: secret,
            expires_at: token.expires_at,
        })
    }

    /// Exchange a refresh secret for a new access token
    ///
    /// With rotation enabled the presented secret is replaced and the new one
    /// returned; otherwise the same secret is returned.
    ///
    /// # Errors
    ///
    /// - `RefreshTokenNotFound` if the secret does not resolve, or another
    ///   refresh rotated it first
    /// - `RefreshTokenRevoked` / `RefreshTokenExpired` for unusable tokens
    /// - `InvalidRefreshToken` if the token belongs to another user
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
        user_id: Uuid,
        email: &str,
        user_type: UserType,
    ) -> AppResult<RefreshedTokens> {
        let now = Utc::now();
        let token = self.lookup(refresh_token).await?;

        if token.revoked {
            warn!(token_id = %token.id, user_id = %token.user_id, "Revoked refresh token presented");
            return Err(AppError::refresh_token_revoked());
        }
        if token.is_expired_at(now) {
            return Err(AppError::refresh_token_expired());
        }
        if token.user_id != user_id {
            warn!(token_id = %token.id, "Refresh token presented for a different user");
            return Err(AppError::invalid_refresh_token());
        }

        let ttl = self.token_issuer.default_ttl();
        let access_token = self.token_issuer.mint(user_id, email, user_type, ttl)?;

        let next_secret = if self.config.rotation_enabled {
            let new_secret = generate_random_token(REFRESH_TOKEN_SECRET_BYTES)?;
            let swapped = self
                .repository
                .rotate(token.id, &token.token_hash, &sha256_hex(&new_secret), now)
                .await?;
            if !swapped {
                // Lost a race with a concurrent refresh or revocation
                debug!(token_id = %token.id, "Refresh token rotation lost a race");
                return Err(AppError::refresh_token_not_found());
            }
            new_secret
        } else {
            if !self.repository.touch(token.id, now).await? {
                return Err(AppError::refresh_token_not_found());
            }
            refresh_token.to_owned()
        };

        AuthLogger::log_token_event(&user_id.to_string(), "access_token_refreshed", Some(&token.id.to_string()));

        Ok(RefreshedTokens {
            access_token,
            expires_in: ttl.as_secs(),
            refresh_token: next_secret,
            rotated: self.config.rotation_enabled,
        })
    }

    /// Revoke the token identified by `refresh_token`
    ///
    /// Revoking an already revoked token is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RefreshTokenNotFound` if the secret does not resolve
    pub async fn revoke_refresh_token(
        &self,
        refresh_token: &str,
        reason: &RevocationReason,
    ) -> AppResult<()> {
        let token = self.lookup(refresh_token).await?;
        if self
            .repository
            .revoke_by_id(token.id, reason.as_str(), Utc::now())
            .await?
        {
            AuthLogger::log_token_event(
                &token.user_id.to_string(),
                &format!("refresh_token_revoked:{reason}"),
                Some(&token.id.to_string()),
            );
        }
        Ok(())
    }

    /// Best-effort logout: revoke the presented token, never fail
    pub async fn logout(&self, refresh_token: &str) {
        if let Err(e) = self
            .revoke_refresh_token(refresh_token, &RevocationReason::Logout)
            .await
        {
            debug!(error = %e, "Logout could not revoke refresh token");
        }
    }

    /// Revoke every token a user holds
    ///
    /// # Errors
    ///
    /// Returns a database error if the update fails
    pub async fn revoke_all_user_tokens(
        &self,
        user_id: Uuid,
        reason: &RevocationReason,
    ) -> AppResult<u64> {
        let revoked = self
            .repository
            .revoke_all_by_user(user_id, reason.as_str(), Utc::now())
            .await?;
        if revoked > 0 {
            info!(user_id = %user_id, revoked, reason = %reason, "Revoked all refresh tokens");
        }
        Ok(revoked)
    }

    /// Revoke every token a user holds on one device
    ///
    /// # Errors
    ///
    /// Returns a database error if the update fails
    pub async fn revoke_device_token(
        &self,
        user_id: Uuid,
        device_id: &str,
        reason: &RevocationReason,
    ) -> AppResult<u64> {
        let revoked = self
            .repository
            .revoke_by_device(user_id, device_id, reason.as_str(), Utc::now())
            .await?;
        if revoked > 0 {
            info!(user_id = %user_id, device_id, revoked, "Revoked device refresh tokens");
        }
        Ok(revoked)
    }

    /// Active devices of a user, oldest sign-in first
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails
    pub async fn list_active_devices(&self, user_id: Uuid) -> AppResult<Vec<DeviceSummary>> {
        Ok(self
            .repository
            .find_active_by_user(user_id, Utc::now())
            .await?
            .into_iter()
            .map(DeviceSummary::from)
            .collect())
    }

    /// Delete tokens past expiry
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails
    pub async fn cleanup_expired_tokens(&self) -> AppResult<u64> {
        let deleted = self.repository.delete_expired(Utc::now()).await?;
        info!(deleted, "Deleted expired refresh tokens");
        Ok(deleted)
    }

    /// Delete tokens revoked longer ago than the retention window
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails, or an internal error if
    /// the retention window is out of range
    pub async fn cleanup_revoked_tokens(&self) -> AppResult<u64> {
        let retention_days = self.config.revoked_retention_days;
        let cutoff = ChronoDuration::try_days(retention_days)
            .filter(|window| *window >= ChronoDuration::zero())
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .ok_or_else(|| {
                AppError::internal(format!("Revoked token retention of {retention_days} days is out of range"))
            })?;
        let deleted = self.repository.delete_revoked_older_than(cutoff).await?;
        info!(
            deleted,
            retention_days,
            "Deleted revoked refresh tokens"
        );
        Ok(deleted)
    }

    async fn lookup(&self, refresh_token: &str) -> AppResult<RefreshToken> {
        if refresh_token.is_empty() {
            return Err(AppError::refresh_token_not_found());
        }
        self.repository
            .find_by_hash(&sha256_hex(refresh_token))
            .await?
            .ok_or_else(AppError::refresh_token_not_found)
    }

    async fn enforce_device_cap(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let max_active = self.config.max_active_per_user.max(1);
        let active = self.repository.count_active_by_user(user_id, now).await?;
        if active < max_active {
            return Ok(());
        }

        let excess = usize::try_from(active - max_active + 1).unwrap_or(usize::MAX);
        let reason = RevocationReason::MaxDevicesExceeded;
        let oldest = self.repository.find_active_by_user(user_id, now).await?;

        for token in oldest.iter().take(excess) {
            self.repository
                .revoke_by_id(token.id, reason.as_str(), now)
                .await?;
        }
        info!(user_id = %user_id, evicted = excess.min(oldest.len()), "Device cap reached, revoked oldest sessions");
        Ok(())
    }
}
