// ABOUTME: OAuth-related constants and configuration values
// ABOUTME: Provider identifiers, Google endpoints and PKCE parameter values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

/// Provider name stored on provider links for Google accounts
pub const PROVIDER_GOOGLE: &str = "google";

/// Google authorization endpoint
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google token endpoint
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Google `OpenID Connect` userinfo endpoint
pub const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Default scopes requested from Google
pub const GOOGLE_DEFAULT_SCOPES: &[&str] = &["openid", "email", "profile"];

/// PKCE challenge method used when a client omits it
pub const PKCE_METHOD_S256: &str = "S256";

/// PKCE plain challenge method (accepted for compatibility, never defaulted)
pub const PKCE_METHOD_PLAIN: &str = "plain";

/// Random bytes in a state token (encoded as URL-safe base64)
pub const STATE_TOKEN_BYTES: usize = 32;

/// Random bytes in a one-time code
pub const ONE_TIME_CODE_BYTES: usize = 32;

/// Default deadline for a single provider HTTP call
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;
