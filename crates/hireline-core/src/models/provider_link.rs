// ABOUTME: Provider link model binding a local user to an external OAuth identity
// ABOUTME: Unique on (provider, provider_user_id); caches profile and provider tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persistent link between a local user and a provider account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderLink {
    /// Unique link ID
    pub id: Uuid,
    /// Local user ID
    pub user_id: Uuid,
    /// Provider name (e.g. "google")
    pub provider: String,
    /// Provider-side subject identifier
    pub provider_user_id: String,
    /// Cached provider email
    pub email: Option<String>,
    /// Cached provider display name
    pub name: Option<String>,
    /// Cached provider avatar URL
    pub avatar_url: Option<String>,
    /// Last provider access token
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Last provider refresh token
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    /// Provider access token expiry
    pub token_expires_at: Option<DateTime<Utc>>,
    /// Raw provider profile payload
    pub raw_profile: serde_json::Value,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Data needed to create a provider link
#[derive(Debug, Clone)]
pub struct NewProviderLink {
    /// Local user ID
    pub user_id: Uuid,
    /// Provider name
    pub provider: String,
    /// Provider-side subject identifier
    pub provider_user_id: String,
    /// Provider email
    pub email: Option<String>,
    /// Provider display name
    pub name: Option<String>,
    /// Provider avatar URL
    pub avatar_url: Option<String>,
    /// Provider access token
    pub access_token: Option<String>,
    /// Provider refresh token
    pub refresh_token: Option<String>,
    /// Provider access token expiry
    pub token_expires_at: Option<DateTime<Utc>>,
    /// Raw provider profile payload
    pub raw_profile: serde_json::Value,
}

impl NewProviderLink {
    /// Materialize into a stored link with a fresh ID
    #[must_use]
    pub fn into_link(self) -> ProviderLink {
        let now = Utc::now();
        ProviderLink {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            provider: self.provider,
            provider_user_id: self.provider_user_id,
            email: self.email,
            name: self.name,
            avatar_url: self.avatar_url,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_expires_at: self.token_expires_at,
            raw_profile: self.raw_profile,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fresh provider tokens and profile snapshot recorded on every login
#[derive(Debug, Clone)]
pub struct ProviderTokenUpdate {
    /// Provider access token
    pub access_token: String,
    /// Provider refresh token; `None` keeps the stored one
    pub refresh_token: Option<String>,
    /// Provider access token expiry
    pub token_expires_at: Option<DateTime<Utc>>,
    /// Provider email
    pub email: Option<String>,
    /// Provider display name
    pub name: Option<String>,
    /// Provider avatar URL
    pub avatar_url: Option<String>,
    /// Raw provider profile payload
    pub raw_profile: serde_json::Value,
}
