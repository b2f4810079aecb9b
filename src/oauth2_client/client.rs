// ABOUTME: OAuth2 login provider client with PKCE support
// ABOUTME: Google implementation of authorization URL, code exchange and profile fetch
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

use crate::config::environment::GoogleOAuthConfig;
use crate::constants::oauth::PROVIDER_GOOGLE;
use crate::errors::{AppError, AppResult};
use crate::utils::http_client::oauth_client;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::debug;
use url::Url;

/// Parameters embedded in an authorization URL
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationRequest<'a> {
    /// Redirect URI the provider will call back
    pub redirect_uri: &'a str,
    /// Anti-replay state token
    pub state: &'a str,
    /// PKCE code challenge
    pub code_challenge: Option<&'a str>,
    /// PKCE code challenge method
    pub code_challenge_method: Option<&'a str>,
}

/// Tokens returned by the provider token endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderTokens {
    /// Provider access token
    pub access_token: String,
    /// Provider refresh token (present with offline access)
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Token type (usually "Bearer")
    #[serde(default)]
    pub token_type: Option<String>,
    /// OpenID Connect ID token
    #[serde(default)]
    pub id_token: Option<String>,
    /// Space-separated granted scopes
    #[serde(default)]
    pub scope: Option<String>,
}

impl ProviderTokens {
    /// Absolute expiry of the provider access token
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_in
            .and_then(|secs| i64::try_from(secs).ok())
            .map(|secs| Utc::now() + Duration::seconds(secs))
    }
}

/// Normalized provider profile
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderProfile {
    /// Provider-side subject identifier
    pub provider_user_id: String,
    /// Email address
    pub email: Option<String>,
    /// Whether the provider verified the email address
    pub email_verified: bool,
    /// Display name
    pub name: Option<String>,
    /// Avatar URL
    pub picture: Option<String>,
    /// Raw profile payload
    pub raw: serde_json::Value,
}

/// Login provider client
#[async_trait::async_trait]
pub trait OAuthProviderClient: Send + Sync {
    /// Provider identifier stored on provider links
    fn provider_name(&self) -> &'static str;

    /// Build the provider authorization URL
    ///
    /// # Errors
    ///
    /// Returns a config error if the authorization endpoint is not a valid URL
    fn authorization_url(&self, request: &AuthorizationRequest<'_>) -> AppResult<String>;

    /// Exchange an authorization code for provider tokens
    ///
    /// # Errors
    ///
    /// Returns `OAuthExchangeFailed` on transport failure, timeout or a non-success response
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> AppResult<ProviderTokens>;

    /// Fetch the profile of the user owning `access_token`
    ///
    /// # Errors
    ///
    /// Returns `OAuthUserInfoFailed` on transport failure, timeout or a non-success response
    async fn fetch_user_info(&self, access_token: &str) -> AppResult<ProviderProfile>;
}

/// Google userinfo response
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
    picture: Option<String>,
}

/// Google OAuth 2.0 client
pub struct GoogleOAuthClient {
    config: GoogleOAuthConfig,
    client: reqwest::Client,
}

impl GoogleOAuthClient {
    /// Create a client from configuration
    #[must_use]
    pub fn new(config: GoogleOAuthConfig) -> Self {
        let client = oauth_client(config.timeout_secs);
        Self { config, client }
    }

    /// Get the client configuration
    #[must_use]
    pub const fn config(&self) -> &GoogleOAuthConfig {
        &self.config
    }

    /// Run a provider call under the configured deadline
    async fn with_deadline<T, F>(&self, call: F, on_timeout: impl FnOnce() -> AppError) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>> + Send,
    {
        tokio::time::timeout(self.config.timeout(), call)
            .await
            .unwrap_or_else(|_| Err(on_timeout()))
    }

    async fn request_tokens(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> AppResult<ProviderTokens> {
        let mut params = vec![
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];
        if let Some(verifier) = code_verifier {
            params.push(("code_verifier", verifier));
        }

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::oauth_exchange_failed(format!("Token request failed: {e}"), None))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::oauth_exchange_failed(format!("Failed to read token response: {e}"), None)
        })?;

        if !status.is_success() {
            return Err(AppError::oauth_exchange_failed(
                format!("Token endpoint returned {status}"),
                Some(body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            AppError::oauth_exchange_failed(format!("Invalid token response: {e}"), Some(body))
        })
    }

    async fn request_user_info(&self, access_token: &str) -> AppResult<ProviderProfile> {
        let response = self
            .client
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::oauth_user_info_failed(format!("Userinfo request failed: {e}"), None))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::oauth_user_info_failed(format!("Failed to read userinfo response: {e}"), None)
        })?;

        if !status.is_success() {
            return Err(AppError::oauth_user_info_failed(
                format!("Userinfo endpoint returned {status}"),
                Some(body),
            ));
        }

        let raw: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            AppError::oauth_user_info_failed(format!("Invalid userinfo response: {e}"), Some(body.clone()))
        })?;
        let info: GoogleUserInfo = serde_json::from_value(raw.clone()).map_err(|e| {
            AppError::oauth_user_info_failed(format!("Unexpected userinfo payload: {e}"), Some(body))
        })?;

        Ok(ProviderProfile {
            provider_user_id: info.sub,
            email: info.email,
            email_verified: info.email_verified,
            name: info.name,
            picture: info.picture,
            raw,
        })
    }
}

#[async_trait::async_trait]
impl OAuthProviderClient for GoogleOAuthClient {
    fn provider_name(&self) -> &'static str {
        PROVIDER_GOOGLE
    }

    fn authorization_url(&self, request: &AuthorizationRequest<'_>) -> AppResult<String> {
        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| AppError::config(format!("Invalid authorization URL: {e}")))?;

        let mut query_pairs = url.query_pairs_mut();
        query_pairs
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", request.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", request.state)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");

        if let Some(challenge) = request.code_challenge {
            query_pairs.append_pair("code_challenge", challenge);
            if let Some(method) = request.code_challenge_method {
                query_pairs.append_pair("code_challenge_method", method);
            }
        }

        drop(query_pairs);
        Ok(url.to_string())
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> AppResult<ProviderTokens> {
        debug!(pkce = code_verifier.is_some(), "Exchanging authorization code with Google");
        self.with_deadline(self.request_tokens(code, redirect_uri, code_verifier), || {
            AppError::oauth_exchange_failed("Token request timed out", None)
        })
        .await
    }

    async fn fetch_user_info(&self, access_token: &str) -> AppResult<ProviderProfile> {
        self.with_deadline(self.request_user_info(access_token), || {
            AppError::oauth_user_info_failed("Userinfo request timed out", None)
        })
        .await
    }
}
