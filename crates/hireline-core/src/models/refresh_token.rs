// ABOUTME: Refresh token record, device metadata and revocation reasons
// ABOUTME: Only the SHA-256 hash of the secret is ever stored
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Device metadata captured when a refresh token is issued
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Human-readable device name ("Chrome on Windows")
    pub device_name: Option<String>,
    /// Device class (mobile, tablet, desktop, unknown)
    pub device_type: Option<String>,
    /// Client-assigned stable device identifier
    pub device_id: Option<String>,
    /// Raw user agent
    pub user_agent: Option<String>,
    /// Client IP address
    pub ip_address: Option<String>,
}

/// Stored refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshToken {
    /// Unique token ID
    pub id: Uuid,
    /// Owner user ID
    pub user_id: Uuid,
    /// SHA-256 hash (hex) of the current secret
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Device metadata
    pub device: DeviceInfo,
    /// Expiry timestamp
    pub expires_at: DateTime<Utc>,
    /// Whether the token has been revoked
    pub revoked: bool,
    /// When the token was revoked
    pub revoked_at: Option<DateTime<Utc>>,
    /// Why the token was revoked
    pub revoked_reason: Option<String>,
    /// Last successful refresh
    pub last_used_at: Option<DateTime<Utc>>,
    /// Issuance timestamp
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Whether the token is past its expiry at `now`
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the token can still be used at `now`
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && !self.is_expired_at(now)
    }
}

/// Device view of an active refresh token (no secret material)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSummary {
    /// Refresh token ID
    pub token_id: Uuid,
    /// Device name
    pub device_name: Option<String>,
    /// Device class
    pub device_type: Option<String>,
    /// Client-assigned device identifier
    pub device_id: Option<String>,
    /// Client IP address at issuance
    pub ip_address: Option<String>,
    /// Last successful refresh
    pub last_used_at: Option<DateTime<Utc>>,
    /// Issuance timestamp
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp
    pub expires_at: DateTime<Utc>,
}

impl From<RefreshToken> for DeviceSummary {
    fn from(token: RefreshToken) -> Self {
        Self {
            token_id: token.id,
            device_name: token.device.device_name,
            device_type: token.device.device_type,
            device_id: token.device.device_id,
            ip_address: token.device.ip_address,
            last_used_at: token.last_used_at,
            created_at: token.created_at,
            expires_at: token.expires_at,
        }
    }
}

/// Why a refresh token was revoked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationReason {
    /// Single-device logout
    Logout,
    /// Logout everywhere
    LogoutAll,
    /// User removed a named device
    DeviceRemoved,
    /// Evicted to stay within the per-user device cap
    MaxDevicesExceeded,
    /// Suspected compromise
    Compromised,
    /// Administrative revocation with a free-form reason
    Other(String),
}

impl RevocationReason {
    /// Stored representation
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Logout => "logout",
            Self::LogoutAll => "logout_all",
            Self::DeviceRemoved => "device_removed",
            Self::MaxDevicesExceeded => "max_devices_exceeded",
            Self::Compromised => "compromised",
            Self::Other(reason) => reason,
        }
    }
}

impl fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
