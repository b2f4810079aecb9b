// ABOUTME: Access token issuing and verification for authenticated portal users
// ABOUTME: TokenIssuer abstraction with an HS256 JWT implementation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

//! # Access Tokens
//!
//! Short-lived signed access tokens minted after a successful OAuth login or
//! refresh. Services depend on the [`TokenIssuer`] trait only.

use crate::config::environment::JwtConfig;
use crate::errors::{AppError, AppResult};
use crate::models::UserType;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// User ID
    pub sub: String,
    /// User email
    pub email: String,
    /// Account role
    pub user_type: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Unique token ID
    pub jti: String,
}

impl AccessTokenClaims {
    /// Parse the subject as a user ID
    ///
    /// # Errors
    ///
    /// Returns an auth error if the subject is not a UUID
    pub fn user_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::auth_invalid("Token subject is not a user ID"))
    }
}

/// Mints and verifies signed access tokens
pub trait TokenIssuer: Send + Sync {
    /// Mint a signed token for the given identity valid for `ttl`
    ///
    /// # Errors
    ///
    /// Returns an internal error if signing fails
    fn mint(&self, user_id: Uuid, email: &str, user_type: UserType, ttl: Duration) -> AppResult<String>;

    /// Verify signature, issuer, audience and expiry and return the claims
    ///
    /// # Errors
    ///
    /// Returns `AuthExpired` for expired tokens and `AuthInvalid` otherwise
    fn verify(&self, token: &str) -> AppResult<AccessTokenClaims>;

    /// Lifetime used when the caller has no specific requirement
    fn default_ttl(&self) -> Duration;
}

/// HS256 JWT token issuer
pub struct JwtTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    default_ttl: Duration,
}

impl JwtTokenIssuer {
    /// Create an issuer from JWT configuration
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            default_ttl: Duration::from_secs(config.expiry_secs),
        }
    }

    fn encode_claims(&self, claims: &AccessTokenClaims) -> AppResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign access token: {e}")))
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.leeway = 0;
        validation
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn mint(&self, user_id: Uuid, email: &str, user_type: UserType, ttl: Duration) -> AppResult<String> {
        let iat = Utc::now().timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs())
            .map_err(|_| AppError::invalid_input("Access token lifetime out of range"))?;

        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            email: email.to_owned(),
            user_type: user_type.as_str().to_owned(),
            iat,
            exp: iat + ttl_secs,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            jti: Uuid::new_v4().to_string(),
        };
        self.encode_claims(&claims)
    }

    fn verify(&self, token: &str) -> AppResult<AccessTokenClaims> {
        use jsonwebtoken::errors::ErrorKind;

        decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::auth_expired(),
                ErrorKind::InvalidSignature => AppError::auth_invalid("Token signature is invalid"),
                ErrorKind::InvalidAudience | ErrorKind::InvalidIssuer => {
                    AppError::auth_invalid("Token was not issued for this service")
                }
                _ => AppError::auth_invalid(format!("Malformed access token: {e}")),
            })
    }

    fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}
