// ABOUTME: Login orchestration turning completed OAuth sign-ins into client sessions
// ABOUTME: Web gets tokens directly, mobile browser flows get a one-time code deep link
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

use super::oauth_flow::{CodeExchangeRequest, OAuthFlowCoordinator, OAuthLoginOutcome};
use super::refresh_tokens::{RefreshTokenManager, RefreshedTokens};
use crate::errors::{AppError, AppResult};
use crate::models::{ClientType, DeviceInfo, RevocationReason, User, UserType};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use url::Url;
use uuid::Uuid;

/// Access and refresh tokens for a signed-in client
#[derive(Debug, Clone, Serialize)]
pub struct SessionTokens {
    /// Portal access token
    pub access_token: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
    /// Refresh secret
    pub refresh_token: String,
    /// Refresh token expiry
    pub refresh_token_expires_at: DateTime<Utc>,
    /// The signed-in user
    pub user: User,
    /// Whether the user was created by this sign-in
    pub is_new_user: bool,
}

/// What the browser callback handler should do next
#[derive(Debug, Clone)]
pub enum BrowserLoginOutcome {
    /// Web client: set the session and optionally redirect
    Web {
        /// Issued session
        session: SessionTokens,
        /// Post-login redirect recorded with the flow
        redirect_to: Option<String>,
    },
    /// Mobile client: redirect to the app carrying a one-time code
    Mobile {
        /// Deep link with the `code` query parameter appended
        redirect_to: String,
    },
}

/// Combines the OAuth coordinator and refresh token manager into login flows
pub struct LoginService {
    oauth: Arc<OAuthFlowCoordinator>,
    refresh_tokens: Arc<RefreshTokenManager>,
}

impl LoginService {
    /// Create a login service
    #[must_use]
    pub const fn new(oauth: Arc<OAuthFlowCoordinator>, refresh_tokens: Arc<RefreshTokenManager>) -> Self {
        Self {
            oauth,
            refresh_tokens,
        }
    }

    /// The underlying OAuth coordinator
    #[must_use]
    pub const fn oauth(&self) -> &Arc<OAuthFlowCoordinator> {
        &self.oauth
    }

    /// The underlying refresh token manager
    #[must_use]
    pub const fn refresh_tokens(&self) -> &Arc<RefreshTokenManager> {
        &self.refresh_tokens
    }

    /// Finish a browser callback
    ///
    /// Web flows receive an access and refresh token. Mobile flows that went
    /// through the browser receive a deep link carrying a one-time code
    /// redeemable for the access token.
    ///
    /// # Errors
    ///
    /// Propagates flow errors from [`OAuthFlowCoordinator::handle_callback`],
    /// and returns `InvalidRedirectUri` if a mobile flow has no usable post-login redirect
    pub async fn complete_browser_callback(
        &self,
        code: &str,
        state: &str,
        device: DeviceInfo,
        remember_me: bool,
    ) -> AppResult<BrowserLoginOutcome> {
        let outcome = self.oauth.handle_callback(code, state).await?;

        match outcome.client_type {
            ClientType::Web => {
                let redirect_to = outcome.post_login_redirect_uri.clone();
                let session = self.issue_session(outcome, device, remember_me).await?;
                Ok(BrowserLoginOutcome::Web {
                    session,
                    redirect_to,
                })
            }
            ClientType::Mobile => {
                let deep_link = outcome.post_login_redirect_uri.as_deref().ok_or_else(|| {
                    AppError::invalid_redirect_uri("Mobile sign-in has no post-login redirect")
                })?;
                let code = self
                    .oauth
                    .create_one_time_code(&outcome.access_token, None)
                    .await?;
                let redirect_to = append_code(deep_link, &code)?;

                info!(user_id = %outcome.user.id, "Mobile browser sign-in handed off with one-time code");
                Ok(BrowserLoginOutcome::Mobile { redirect_to })
            }
        }
    }

    /// Finish a mobile PKCE code exchange and issue a session
    ///
    /// # Errors
    ///
    /// Propagates flow errors from [`OAuthFlowCoordinator::exchange_code`]
    pub async fn complete_mobile_exchange(
        &self,
        request: &CodeExchangeRequest,
        device: DeviceInfo,
        remember_me: bool,
    ) -> AppResult<SessionTokens> {
        let outcome = self.oauth.exchange_code(request).await?;
        self.issue_session(outcome, device, remember_me).await
    }

    /// Redeem a one-time code for its access token
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` if the code is unknown, expired or already redeemed
    pub async fn redeem_one_time_code(&self, code: &str) -> AppResult<String> {
        self.oauth.consume_one_time_code(code).await
    }

    /// Refresh the session of the user identified by the access token claims
    ///
    /// # Errors
    ///
    /// Propagates errors from [`RefreshTokenManager::refresh_access_token`]
    pub async fn refresh(
        &self,
        refresh_token: &str,
        user_id: Uuid,
        email: &str,
        user_type: UserType,
    ) -> AppResult<RefreshedTokens> {
        self.refresh_tokens
            .refresh_access_token(refresh_token, user_id, email, user_type)
            .await
    }

    /// Sign out the device holding `refresh_token`; never fails
    pub async fn logout(&self, refresh_token: &str) {
        self.refresh_tokens.logout(refresh_token).await;
    }

    /// Sign out every device of a user
    ///
    /// # Errors
    ///
    /// Returns a database error if revocation fails
    pub async fn logout_all(&self, user_id: Uuid) -> AppResult<u64> {
        self.refresh_tokens
            .revoke_all_user_tokens(user_id, &RevocationReason::LogoutAll)
            .await
    }

    async fn issue_session(
        &self,
        outcome: OAuthLoginOutcome,
        device: DeviceInfo,
        remember_me: bool,
    ) -> AppResult<SessionTokens> {
        let issued = self
            .refresh_tokens
            .create_refresh_token(outcome.user.id, device, remember_me)
            .await?;

        Ok(SessionTokens {
            access_token: outcome.access_token,
            expires_in: outcome.expires_in,
            refresh_token: issued.refresh_token,
            refresh_token_expires_at: issued.expires_at,
            user: outcome.user,
            is_new_user: outcome.is_new_user,
        })
    }
}

/// Append `code` to a redirect URI, keeping its existing query
fn append_code(redirect_uri: &str, code: &str) -> AppResult<String> {
    let mut url = Url::parse(redirect_uri)
        .map_err(|e| AppError::invalid_redirect_uri(format!("Invalid post-login redirect: {e}")))?;
    url.query_pairs_mut().append_pair("code", code);
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::append_code;

    #[test]
    fn test_append_code_to_deep_link() {
        assert_eq!(
            append_code("hireline://auth/callback", "abc").ok().as_deref(),
            Some("hireline://auth/callback?code=abc")
        );
        assert_eq!(
            append_code("https://app.hireline.io/done?tab=jobs", "x-y_z").ok().as_deref(),
            Some("https://app.hireline.io/done?tab=jobs&code=x-y_z")
        );
        assert!(append_code("not a url", "abc").is_err());
    }
}
