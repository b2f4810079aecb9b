// ABOUTME: Environment-based configuration for OAuth, token lifecycle and persistence
// ABOUTME: Builds and validates AuthConfig from environment variables with typed defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

//! Environment-based configuration
//!
//! All settings come from environment variables; there are no config files.
//! Required values (`GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`,
//! `GOOGLE_REDIRECT_URI`, `JWT_SECRET`) fail loading with a `ConfigError`.

use super::state_store::StateStoreConfig;
use crate::constants::{oauth, service_names, state_store, tokens};
use crate::errors::{AppError, AppResult};
use serde_json::json;
use std::env;
use std::fmt;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Complete runtime configuration for the authentication subsystem
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Google OAuth client settings
    pub google: GoogleOAuthConfig,
    /// Flow state, one-time code and redirect allow-list settings
    pub oauth_flow: OAuthFlowConfig,
    /// State store backend settings
    pub state_store: StateStoreConfig,
    /// Refresh token lifecycle settings
    pub refresh_tokens: RefreshTokenConfig,
    /// Access token signing settings
    pub jwt: JwtConfig,
    /// Database settings
    pub database: DatabaseConfig,
}

impl AuthConfig {
    /// Load and validate configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a config error if a required variable is missing or a value is invalid
    pub fn from_env() -> AppResult<Self> {
        let config = Self {
            google: GoogleOAuthConfig::from_env()?,
            oauth_flow: OAuthFlowConfig::from_env(),
            state_store: StateStoreConfig::from_env(),
            refresh_tokens: RefreshTokenConfig::from_env(),
            jwt: JwtConfig::from_env()?,
            database: DatabaseConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns a config error describing the first violated constraint
    pub fn validate(&self) -> AppResult<()> {
        self.google.validate()?;
        self.jwt.validate()?;

        for uri in &self.oauth_flow.mobile_redirect_uris {
            Url::parse(uri).map_err(|e| {
                AppError::config(format!("Invalid OAUTH_MOBILE_REDIRECT_URIS entry '{uri}': {e}"))
            })?;
        }

        if !(1..=state_store::MAX_STATE_TTL_SECS).contains(&self.oauth_flow.state_ttl_secs) {
            return Err(AppError::config(format!(
                "OAUTH_STATE_TTL_SECS must be between 1 and {}",
                state_store::MAX_STATE_TTL_SECS
            )));
        }
        if self.oauth_flow.one_time_code_ttl_secs == 0 {
            return Err(AppError::config(
                "OAUTH_ONE_TIME_CODE_TTL_SECS must be greater than zero",
            ));
        }
        self.refresh_tokens.validate()?;

        if self.oauth_flow.mobile_redirect_uris.is_empty() {
            warn!("OAUTH_MOBILE_REDIRECT_URIS is empty; mobile logins will be rejected");
        }

        Ok(())
    }

    /// Configuration summary safe for logging (no secrets)
    #[must_use]
    pub fn summary(&self) -> serde_json::Value {
        json!({
            "google": {
                "client_id": self.google.client_id,
                "redirect_uri": self.google.redirect_uri,
                "scopes": self.google.scopes,
                "timeout_secs": self.google.timeout_secs,
            },
            "oauth_flow": {
                "state_ttl_secs": self.oauth_flow.state_ttl_secs,
                "one_time_code_ttl_secs": self.oauth_flow.one_time_code_ttl_secs,
                "mobile_redirect_uris": self.oauth_flow.mobile_redirect_uris,
            },
            "state_store": {
                "backend": self.state_store.backend_label(),
                "max_entries": self.state_store.max_entries,
                "cleanup_interval_secs": self.state_store.cleanup_interval_secs,
            },
            "refresh_tokens": {
                "expiry_days": self.refresh_tokens.expiry_days,
                "remember_me_expiry_days": self.refresh_tokens.remember_me_expiry_days,
                "max_active_per_user": self.refresh_tokens.max_active_per_user,
                "rotation_enabled": self.refresh_tokens.rotation_enabled,
                "revoked_retention_days": self.refresh_tokens.revoked_retention_days,
            },
            "jwt": {
                "issuer": self.jwt.issuer,
                "expiry_secs": self.jwt.expiry_secs,
            },
            "database": {
                "url": self.database.url,
            },
        })
    }
}

/// Google OAuth client configuration
#[derive(Clone)]
pub struct GoogleOAuthConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Default redirect URI registered for the web client
    pub redirect_uri: String,
    /// Requested scopes
    pub scopes: Vec<String>,
    /// Authorization endpoint
    pub auth_url: String,
    /// Token endpoint
    pub token_url: String,
    /// Userinfo endpoint
    pub userinfo_url: String,
    /// Deadline for each provider call in seconds
    pub timeout_secs: u64,
}

impl fmt::Debug for GoogleOAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleOAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("userinfo_url", &self.userinfo_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GoogleOAuthConfig {
    /// Load Google OAuth configuration from environment
    ///
    /// # Errors
    ///
    /// Returns a config error if client id, secret or redirect URI is missing
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            client_id: required_var("GOOGLE_CLIENT_ID")?,
            client_secret: required_var("GOOGLE_CLIENT_SECRET")?,
            redirect_uri: required_var("GOOGLE_REDIRECT_URI")?,
            scopes: env::var("GOOGLE_OAUTH_SCOPES").map_or_else(
                |_| default_scopes(),
                |raw| {
                    let scopes = parse_scopes(&raw);
                    if scopes.is_empty() {
                        default_scopes()
                    } else {
                        scopes
                    }
                },
            ),
            auth_url: env_var_or("GOOGLE_AUTH_URL", oauth::GOOGLE_AUTH_URL),
            token_url: env_var_or("GOOGLE_TOKEN_URL", oauth::GOOGLE_TOKEN_URL),
            userinfo_url: env_var_or("GOOGLE_USERINFO_URL", oauth::GOOGLE_USERINFO_URL),
            timeout_secs: env::var("OAUTH_PROVIDER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(oauth::DEFAULT_PROVIDER_TIMEOUT_SECS),
        })
    }

    /// Provider call deadline
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> AppResult<()> {
        for (name, value) in [
            ("GOOGLE_REDIRECT_URI", &self.redirect_uri),
            ("GOOGLE_AUTH_URL", &self.auth_url),
            ("GOOGLE_TOKEN_URL", &self.token_url),
            ("GOOGLE_USERINFO_URL", &self.userinfo_url),
        ] {
            Url::parse(value)
                .map_err(|e| AppError::config(format!("Invalid {name} '{value}': {e}")))?;
        }
        Ok(())
    }
}

/// OAuth flow configuration
#[derive(Debug, Clone)]
pub struct OAuthFlowConfig {
    /// Flow state TTL in seconds
    pub state_ttl_secs: u64,
    /// One-time code TTL in seconds (capped)
    pub one_time_code_ttl_secs: u64,
    /// Registered mobile redirect and deep-link URIs
    pub mobile_redirect_uris: Vec<String>,
}

impl Default for OAuthFlowConfig {
    fn default() -> Self {
        Self {
            state_ttl_secs: state_store::DEFAULT_STATE_TTL_SECS,
            one_time_code_ttl_secs: state_store::DEFAULT_ONE_TIME_CODE_TTL_SECS,
            mobile_redirect_uris: Vec::new(),
        }
    }
}

impl OAuthFlowConfig {
    /// Load OAuth flow configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            state_ttl_secs: env::var("OAUTH_STATE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(state_store::DEFAULT_STATE_TTL_SECS),
            one_time_code_ttl_secs: env::var("OAUTH_ONE_TIME_CODE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(state_store::DEFAULT_ONE_TIME_CODE_TTL_SECS)
                .min(state_store::MAX_ONE_TIME_CODE_TTL_SECS),
            mobile_redirect_uris: env::var("OAUTH_MOBILE_REDIRECT_URIS")
                .map(|raw| parse_list(&raw))
                .unwrap_or_default(),
        }
    }
}

/// Refresh token lifecycle configuration
#[derive(Debug, Clone)]
pub struct RefreshTokenConfig {
    /// Standard expiry window in days
    pub expiry_days: i64,
    /// Expiry window in days when "remember me" is set
    pub remember_me_expiry_days: i64,
    /// Maximum concurrently active tokens per user
    pub max_active_per_user: u32,
    /// Whether each refresh issues a new secret
    pub rotation_enabled: bool,
    /// Days a revoked row is retained before physical deletion
    pub revoked_retention_days: i64,
}

impl Default for RefreshTokenConfig {
    fn default() -> Self {
        Self {
            expiry_days: tokens::DEFAULT_REFRESH_TOKEN_EXPIRY_DAYS,
            remember_me_expiry_days: tokens::DEFAULT_REMEMBER_ME_EXPIRY_DAYS,
            max_active_per_user: tokens::DEFAULT_MAX_ACTIVE_TOKENS_PER_USER,
            rotation_enabled: true,
            revoked_retention_days: tokens::DEFAULT_REVOKED_RETENTION_DAYS,
        }
    }
}

impl RefreshTokenConfig {
    /// Check expiry windows, device cap and retention are within range
    ///
    /// # Errors
    ///
    /// Returns a config error naming the first out-of-range value
    pub fn validate(&self) -> AppResult<()> {
        if self.max_active_per_user == 0 {
            return Err(AppError::config("REFRESH_TOKEN_MAX_ACTIVE must be at least 1"));
        }
        let expiry_range = 1..=tokens::MAX_REFRESH_TOKEN_EXPIRY_DAYS;
        if !expiry_range.contains(&self.expiry_days) {
            return Err(AppError::config(format!(
                "REFRESH_TOKEN_EXPIRY_DAYS must be between 1 and {}",
                tokens::MAX_REFRESH_TOKEN_EXPIRY_DAYS
            )));
        }
        if !expiry_range.contains(&self.remember_me_expiry_days) {
            return Err(AppError::config(format!(
                "REFRESH_TOKEN_REMEMBER_ME_EXPIRY_DAYS must be between 1 and {}",
                tokens::MAX_REFRESH_TOKEN_EXPIRY_DAYS
            )));
        }
        if !(0..=tokens::MAX_REVOKED_RETENTION_DAYS).contains(&self.revoked_retention_days) {
            return Err(AppError::config(format!(
                "REFRESH_TOKEN_REVOKED_RETENTION_DAYS must be between 0 and {}",
                tokens::MAX_REVOKED_RETENTION_DAYS
            )));
        }
        Ok(())
    }

    /// Load refresh token configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            expiry_days: env::var("REFRESH_TOKEN_EXPIRY_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(tokens::DEFAULT_REFRESH_TOKEN_EXPIRY_DAYS),
            remember_me_expiry_days: env::var("REFRESH_TOKEN_REMEMBER_ME_EXPIRY_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(tokens::DEFAULT_REMEMBER_ME_EXPIRY_DAYS),
            max_active_per_user: env::var("REFRESH_TOKEN_MAX_ACTIVE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(tokens::DEFAULT_MAX_ACTIVE_TOKENS_PER_USER),
            rotation_enabled: env::var("REFRESH_TOKEN_ROTATION")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            revoked_retention_days: env::var("REFRESH_TOKEN_REVOKED_RETENTION_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(tokens::DEFAULT_REVOKED_RETENTION_DAYS),
        }
    }
}

/// Access token signing configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC signing secret
    pub secret: String,
    /// Access token lifetime in seconds
    pub expiry_secs: u64,
    /// Issuer claim
    pub issuer: String,
    /// Audience claim
    pub audience: String,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("expiry_secs", &self.expiry_secs)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

impl JwtConfig {
    /// Load JWT configuration from environment
    ///
    /// # Errors
    ///
    /// Returns a config error if `JWT_SECRET` is missing
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            secret: required_var("JWT_SECRET")?,
            expiry_secs: env::var("JWT_EXPIRY_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(tokens::DEFAULT_ACCESS_TOKEN_TTL_SECS),
            issuer: env_var_or("JWT_ISSUER", service_names::DEFAULT_ISSUER),
            audience: service_names::PORTAL_API_AUDIENCE.to_owned(),
        })
    }

    fn validate(&self) -> AppResult<()> {
        if self.secret.len() < tokens::MIN_JWT_SECRET_BYTES {
            return Err(AppError::config(format!(
                "JWT_SECRET must be at least {} bytes",
                tokens::MIN_JWT_SECRET_BYTES
            )));
        }
        if self.expiry_secs == 0 {
            return Err(AppError::config("JWT_EXPIRY_SECS must be greater than zero"));
        }
        Ok(())
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:./data/hireline.db".to_owned(),
        }
    }
}

impl DatabaseConfig {
    /// Load database configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map_or_else(Self::default, |url| Self { url })
    }
}

fn required_var(key: &str) -> AppResult<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::config(format!("{key} environment variable is required")))
}

fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn default_scopes() -> Vec<String> {
    oauth::GOOGLE_DEFAULT_SCOPES
        .iter()
        .map(|s| (*s).to_owned())
        .collect()
}

/// Parse scopes separated by commas or whitespace
fn parse_scopes(scopes_str: &str) -> Vec<String> {
    scopes_str
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Parse a comma-separated list
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
