// ABOUTME: Token lifecycle constants for access and refresh tokens
// ABOUTME: Expiry windows, device cap, secret sizes and revocation retention
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

/// Access token lifetime (1 hour)
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: u64 = 3_600;

/// Minimum HMAC secret length for access tokens
pub const MIN_JWT_SECRET_BYTES: usize = 32;

/// Refresh token lifetime without remember-me
pub const DEFAULT_REFRESH_TOKEN_EXPIRY_DAYS: i64 = 30;

/// Refresh token lifetime with remember-me
pub const DEFAULT_REMEMBER_ME_EXPIRY_DAYS: i64 = 90;

/// Maximum concurrently active refresh tokens per user ("5 devices")
pub const DEFAULT_MAX_ACTIVE_TOKENS_PER_USER: u32 = 5;

/// Random bytes in a refresh token secret
pub const REFRESH_TOKEN_SECRET_BYTES: usize = 64;

/// Days a revoked refresh token row is kept before physical deletion
pub const DEFAULT_REVOKED_RETENTION_DAYS: i64 = 90;

/// Upper bound accepted for refresh token expiry windows (10 years)
pub const MAX_REFRESH_TOKEN_EXPIRY_DAYS: i64 = 3_650;

/// Upper bound accepted for the revoked-row retention window
pub const MAX_REVOKED_RETENTION_DAYS: i64 = 3_650;
