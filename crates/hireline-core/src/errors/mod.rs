// ABOUTME: Unified error type, error codes and HTTP status mapping
// ABOUTME: Shared by the OAuth flow, the state store and the refresh-token lifecycle
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

//! # Unified Error Handling System
//!
//! Every fallible operation in the authentication subsystem returns
//! [`AppResult`]. The [`ErrorCode`] carries the category the HTTP layer needs
//! to pick a status code; callers match on `error.code` rather than on
//! message text.

#[cfg(feature = "http-response")]
mod http_response;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the authentication subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // OAuth protocol errors (client-caused, restart the flow)
    /// State token is empty, unknown, expired or already consumed
    InvalidState,
    /// Redirect URI is missing or not in the registered allow-list
    InvalidRedirectUri,
    /// Redirect URI differs from the one recorded when the flow started
    RedirectUriMismatch,
    /// Flow was started with a PKCE challenge but no verifier was supplied
    MissingCodeVerifier,
    /// Flow state was issued for a different client type
    ClientTypeMismatch,
    /// Request input failed validation
    InvalidInput,

    // Provider errors
    /// Authorization code exchange with the provider failed
    #[serde(rename = "OAUTH_EXCHANGE_FAILED")]
    OAuthExchangeFailed,
    /// Fetching the provider profile failed
    #[serde(rename = "OAUTH_USER_INFO_FAILED")]
    OAuthUserInfoFailed,

    // Access token errors
    /// Access token signature or structure is invalid
    AuthInvalid,
    /// Access token has expired
    AuthExpired,

    // Refresh token lifecycle errors (always force re-authentication)
    /// No refresh token matches the presented secret
    RefreshTokenNotFound,
    /// Refresh token has been revoked
    RefreshTokenRevoked,
    /// Refresh token is past its expiry
    RefreshTokenExpired,
    /// Refresh token belongs to a different user
    InvalidRefreshToken,

    // Resource errors
    /// Requested resource does not exist
    ResourceNotFound,
    /// Resource already exists (unique constraint)
    ResourceAlreadyExists,

    // Storage and transport errors
    /// State store backend failure (unreachable, protocol error)
    StorageError,
    /// Relational database failure
    DatabaseError,
    /// Serialization or deserialization failure
    SerializationError,

    // Configuration and internal errors
    /// Configuration is missing or invalid
    ConfigError,
    /// Unexpected internal failure
    InternalError,
}

impl ErrorCode {
    /// HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidState
            | Self::InvalidRedirectUri
            | Self::RedirectUriMismatch
            | Self::MissingCodeVerifier
            | Self::ClientTypeMismatch
            | Self::InvalidInput => 400,

            Self::AuthInvalid
            | Self::AuthExpired
            | Self::RefreshTokenNotFound
            | Self::RefreshTokenRevoked
            | Self::RefreshTokenExpired
            | Self::InvalidRefreshToken => 401,

            Self::ResourceNotFound => 404,
            Self::ResourceAlreadyExists => 409,

            Self::OAuthExchangeFailed | Self::OAuthUserInfoFailed => 502,
            Self::StorageError => 503,

            Self::DatabaseError
            | Self::SerializationError
            | Self::ConfigError
            | Self::InternalError => 500,
        }
    }

    /// User-facing description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InvalidState => "The login session is invalid or has expired",
            Self::InvalidRedirectUri => "The redirect URI is not registered",
            Self::RedirectUriMismatch => "The redirect URI does not match the login request",
            Self::MissingCodeVerifier => "A PKCE code verifier is required",
            Self::ClientTypeMismatch => "The login session was started by a different client",
            Self::InvalidInput => "The provided input is invalid",
            Self::OAuthExchangeFailed => "The identity provider rejected the authorization code",
            Self::OAuthUserInfoFailed => "The identity provider profile could not be retrieved",
            Self::AuthInvalid => "The access token is invalid",
            Self::AuthExpired => "The access token has expired",
            Self::RefreshTokenNotFound => "The refresh token is not recognized",
            Self::RefreshTokenRevoked => "The refresh token has been revoked",
            Self::RefreshTokenExpired => "The refresh token has expired",
            Self::InvalidRefreshToken => "The refresh token does not belong to this user",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::ResourceAlreadyExists => "A resource with this identifier already exists",
            Self::StorageError => "The session store is unavailable",
            Self::DatabaseError => "Database operation failed",
            Self::SerializationError => "Data serialization/deserialization failed",
            Self::ConfigError => "Configuration error encountered",
            Self::InternalError => "An internal server error occurred",
        }
    }

    /// Whether a caller may reasonably retry the same request
    ///
    /// Protocol and token-lifecycle failures are terminal: the client must
    /// restart the login or re-authenticate.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::OAuthExchangeFailed
                | Self::OAuthUserInfoFailed
                | Self::StorageError
                | Self::DatabaseError
        )
    }

    /// Whether this error requires the user to sign in again
    #[must_use]
    pub const fn requires_reauthentication(self) -> bool {
        matches!(
            self,
            Self::RefreshTokenNotFound
                | Self::RefreshTokenRevoked
                | Self::RefreshTokenExpired
                | Self::InvalidRefreshToken
                | Self::AuthExpired
                | Self::AuthInvalid
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Wire name matches the serde representation
        let name = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_else(|| format!("{self:?}"));
        f.write_str(&name)
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Structured diagnostic details (provider response bodies, ids)
    pub details: serde_json::Value,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a new `AppError` with the given code and message
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: serde_json::Value::Null,
            source: None,
        }
    }

    /// Attach structured details
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Attach a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// State token unknown, expired or replayed
    #[must_use]
    pub fn invalid_state() -> Self {
        Self::new(ErrorCode::InvalidState, "Invalid or expired OAuth state")
    }

    /// Redirect URI not in the allow-list
    #[must_use]
    pub fn invalid_redirect_uri(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRedirectUri, message)
    }

    /// Redirect URI differs from the recorded one
    #[must_use]
    pub fn redirect_uri_mismatch() -> Self {
        Self::new(ErrorCode::RedirectUriMismatch, "redirect_uri mismatch")
    }

    /// PKCE verifier missing
    #[must_use]
    pub fn missing_code_verifier() -> Self {
        Self::new(
            ErrorCode::MissingCodeVerifier,
            "code_verifier is required for this authorization request",
        )
    }

    /// Flow state belongs to another client type
    #[must_use]
    pub fn client_type_mismatch(expected: &str, actual: &str) -> Self {
        Self::new(
            ErrorCode::ClientTypeMismatch,
            format!("OAuth state was issued for a {actual} client, expected {expected}"),
        )
    }

    /// Invalid input
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Provider token exchange failed; `provider_response` is kept for diagnostics
    #[must_use]
    pub fn oauth_exchange_failed(message: impl Into<String>, provider_response: Option<String>) -> Self {
        Self::provider_error(ErrorCode::OAuthExchangeFailed, message, provider_response)
    }

    /// Provider profile fetch failed; `provider_response` is kept for diagnostics
    #[must_use]
    pub fn oauth_user_info_failed(
        message: impl Into<String>,
        provider_response: Option<String>,
    ) -> Self {
        Self::provider_error(ErrorCode::OAuthUserInfoFailed, message, provider_response)
    }

    fn provider_error(
        code: ErrorCode,
        message: impl Into<String>,
        provider_response: Option<String>,
    ) -> Self {
        let error = Self::new(code, message);
        match provider_response {
            Some(body) => error.with_details(serde_json::json!({ "provider_response": body })),
            None => error,
        }
    }

    /// Access token invalid
    #[must_use]
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Access token expired
    #[must_use]
    pub fn auth_expired() -> Self {
        Self::new(ErrorCode::AuthExpired, "Access token has expired")
    }

    /// Refresh token not found
    #[must_use]
    pub fn refresh_token_not_found() -> Self {
        Self::new(ErrorCode::RefreshTokenNotFound, "Refresh token not found")
    }

    /// Refresh token revoked
    #[must_use]
    pub fn refresh_token_revoked() -> Self {
        Self::new(ErrorCode::RefreshTokenRevoked, "Refresh token has been revoked")
    }

    /// Refresh token expired
    #[must_use]
    pub fn refresh_token_expired() -> Self {
        Self::new(ErrorCode::RefreshTokenExpired, "Refresh token has expired")
    }

    /// Refresh token presented for a different user
    #[must_use]
    pub fn invalid_refresh_token() -> Self {
        Self::new(
            ErrorCode::InvalidRefreshToken,
            "Refresh token does not belong to this user",
        )
    }

    /// Resource not found
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Resource already exists
    #[must_use]
    pub fn already_exists(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceAlreadyExists,
            format!("{} already exists", resource.into()),
        )
    }

    /// State store failure
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    /// Database error
    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Serialization error
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }

    /// Configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Internal server error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error payload
    pub error: ErrorResponseDetails,
}

/// Body of an [`ErrorResponse`]
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Whether the client must sign in again
    pub reauthenticate: bool,
    /// Structured diagnostic details
    #[serde(skip_serializing_if = "serde_json::Value::is_null", default)]
    pub details: serde_json::Value,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        // Provider bodies stay in server logs; clients only see the code and message
        let details = match error.code {
            ErrorCode::OAuthExchangeFailed | ErrorCode::OAuthUserInfoFailed => {
                serde_json::Value::Null
            }
            _ => error.details,
        };
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                reauthenticate: error.code.requires_reauthentication(),
                message: error.message,
                details,
            },
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error.to_string()).with_source(error)
    }
}

#[cfg(feature = "database-errors")]
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_error) = &error {
            if db_error.is_unique_violation() {
                return Self::already_exists(db_error.message().to_owned()).with_source(error);
            }
        }
        Self::database(error.to_string()).with_source(error)
    }
}
