// ABOUTME: OAuth flow coordinator for Google sign-in across web and mobile clients
// ABOUTME: Flow state, PKCE and redirect validation, account linking and one-time codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

//! # OAuth flow coordination
//!
//! A sign-in starts with [`OAuthFlowCoordinator::build_authorization_url`],
//! which stores a [`FlowState`] under a fresh random state token. The state
//! is consumed exactly once, either by the browser callback
//! ([`OAuthFlowCoordinator::handle_callback`]) or by a mobile client
//! redeeming its authorization code with a PKCE verifier
//! ([`OAuthFlowCoordinator::exchange_code`]). Both paths resolve the
//! provider identity to a local user and mint a portal access token.

use crate::auth::TokenIssuer;
use crate::config::{AuthConfig, OAuthFlowConfig};
use crate::constants::oauth::{ONE_TIME_CODE_BYTES, PKCE_METHOD_PLAIN, PKCE_METHOD_S256, STATE_TOKEN_BYTES};
use crate::constants::state_store::MAX_ONE_TIME_CODE_TTL_SECS;
use crate::crypto::{generate_random_token, redact};
use crate::database::repositories::{ProviderLinkRepository, UserRepository};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::logging::AuthLogger;
use crate::models::{ClientType, FlowState, NewProviderLink, ProviderLink, ProviderTokenUpdate, User};
use crate::oauth2_client::{AuthorizationRequest, OAuthProviderClient, ProviderProfile, ProviderTokens};
use crate::state_store::{StateKey, StateStore};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Redirect and lifetime settings for OAuth flows
#[derive(Debug, Clone)]
pub struct OAuthFlowSettings {
    /// Backend callback registered with the provider, used by web flows
    pub default_redirect_uri: String,
    /// Exact-match allow-list for client-supplied redirect URIs
    pub allowed_redirect_uris: Vec<String>,
    /// Lifetime of a stored flow state
    pub state_ttl: Duration,
    /// Default lifetime of a one-time code
    pub one_time_code_ttl: Duration,
}

impl OAuthFlowSettings {
    /// Build settings from the loaded configuration
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.google.redirect_uri.clone(), &config.oauth_flow)
    }

    /// Build settings from a default redirect and flow configuration
    #[must_use]
    pub fn new(default_redirect_uri: String, flow: &OAuthFlowConfig) -> Self {
        Self {
            default_redirect_uri,
            allowed_redirect_uris: flow.mobile_redirect_uris.clone(),
            state_ttl: Duration::from_secs(flow.state_ttl_secs),
            one_time_code_ttl: Duration::from_secs(flow.one_time_code_ttl_secs),
        }
    }

    fn is_allowed(&self, uri: &str) -> bool {
        self.allowed_redirect_uris.iter().any(|allowed| allowed == uri)
    }
}

/// Parameters for starting a sign-in
#[derive(Debug, Clone, Default)]
pub struct AuthorizationUrlRequest {
    /// "web" or "mobile"; anything else is treated as web
    pub client_type: Option<String>,
    /// Redirect the provider calls back (required for mobile)
    pub redirect_uri: Option<String>,
    /// Where the client lands after a browser callback completes
    pub post_login_redirect_uri: Option<String>,
    /// PKCE code challenge
    pub code_challenge: Option<String>,
    /// PKCE code challenge method (defaults to S256 when a challenge is present)
    pub code_challenge_method: Option<String>,
}

/// Authorization URL handed back to the client
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationUrlResponse {
    /// Provider URL to open
    pub authorization_url: String,
    /// State token embedded in the URL
    pub state: String,
    /// Seconds until the state expires
    pub expires_in: u64,
}

/// Mobile authorization code redemption
#[derive(Debug, Clone, Default)]
pub struct CodeExchangeRequest {
    /// Provider authorization code
    pub code: String,
    /// PKCE verifier matching the stored challenge
    pub code_verifier: Option<String>,
    /// State token issued with the authorization URL
    pub state: String,
    /// Redirect the client used; must equal the stored one when given
    pub redirect_uri: Option<String>,
}

/// Result of a completed provider sign-in
#[derive(Debug, Clone, Serialize)]
pub struct OAuthLoginOutcome {
    /// Portal access token
    pub access_token: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
    /// The signed-in user
    pub user: User,
    /// Whether the user was created by this sign-in
    pub is_new_user: bool,
    /// Client type recorded when the flow started
    pub client_type: ClientType,
    /// Post-login redirect recorded when the flow started
    pub post_login_redirect_uri: Option<String>,
}

/// Coordinates provider sign-in for web and mobile clients
pub struct OAuthFlowCoordinator {
    provider: Arc<dyn OAuthProviderClient>,
    state_store: Arc<dyn StateStore>,
    users: Arc<dyn UserRepository>,
    links: Arc<dyn ProviderLinkRepository>,
    token_issuer: Arc<dyn TokenIssuer>,
    settings: OAuthFlowSettings,
}

impl OAuthFlowCoordinator {
    /// Create a coordinator
    #[must_use]
    pub fn new(
        provider: Arc<dyn OAuthProviderClient>,
        state_store: Arc<dyn StateStore>,
        users: Arc<dyn UserRepository>,
        links: Arc<dyn ProviderLinkRepository>,
        token_issuer: Arc<dyn TokenIssuer>,
        settings: OAuthFlowSettings,
    ) -> Self {
        Self {
            provider,
            state_store,
            users,
            links,
            token_issuer,
            settings,
        }
    }

    /// Settings in effect
    #[must_use]
    pub const fn settings(&self) -> &OAuthFlowSettings {
        &self.settings
    }

    /// Start a sign-in: validate redirects, persist flow state and build the provider URL
    ///
    /// # Errors
    ///
    /// - `InvalidRedirectUri` if a mobile redirect is missing or not allow-listed,
    ///   or a web redirect is neither the default nor allow-listed
    /// - `InvalidInput` for an unsupported PKCE method
    /// - `StorageError` if the flow state cannot be saved
    pub async fn build_authorization_url(
        &self,
        request: &AuthorizationUrlRequest,
    ) -> AppResult<AuthorizationUrlResponse> {
        let client_type = ClientType::normalize(request.client_type.as_deref());
        let redirect_uri = self.resolve_redirect_uri(client_type, request.redirect_uri.as_deref())?;
        let post_login_redirect_uri =
            self.validate_post_login_redirect(client_type, request.post_login_redirect_uri.as_deref())?;

        let code_challenge = non_empty(request.code_challenge.as_deref()).map(ToOwned::to_owned);
        let code_challenge_method = match code_challenge {
            Some(_) => Some(normalize_challenge_method(
                request.code_challenge_method.as_deref(),
            )?),
            None => None,
        };

        let state = generate_random_token(STATE_TOKEN_BYTES)?;
        let authorization_url = self.provider.authorization_url(&AuthorizationRequest {
            redirect_uri: &redirect_uri,
            state: &state,
            code_challenge: code_challenge.as_deref(),
            code_challenge_method: code_challenge_method.as_deref(),
        })?;

        let flow = FlowState {
            redirect_uri,
            post_login_redirect_uri,
            code_challenge,
            code_challenge_method,
            client_type,
            created_at: Utc::now(),
        };
        self.state_store
            .save(
                &StateKey::FlowState(state.clone()),
                serde_json::to_string(&flow)?,
                self.settings.state_ttl,
            )
            .await?;

        debug!(
            client_type = %client_type,
            state = %redact(&state),
            pkce = flow.code_challenge.is_some(),
            "Stored OAuth flow state"
        );

        Ok(AuthorizationUrlResponse {
            authorization_url,
            state,
            expires_in: self.settings.state_ttl.as_secs(),
        })
    }

    /// Complete a browser redirect from the provider
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the state is empty, unknown, expired or already used
    /// - `InvalidInput` if the code is empty (the state is left unconsumed)
    /// - `OAuthExchangeFailed` / `OAuthUserInfoFailed` on provider failures
    pub async fn handle_callback(&self, code: &str, state: &str) -> AppResult<OAuthLoginOutcome> {
        let state = non_empty(Some(state)).ok_or_else(AppError::invalid_state)?;
        let code = non_empty(Some(code))
            .ok_or_else(|| AppError::invalid_input("Authorization code is required"))?;
        let flow = self.consume_flow_state(state).await?;

        let tokens = self
            .provider
            .exchange_code(code, &flow.redirect_uri, None)
            .await?;

        self.complete_sign_in(tokens, flow).await
    }

    /// Redeem an authorization code obtained by a mobile client
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the state is empty, unknown, expired or already used
    /// - `InvalidInput` if the code is empty (the state is left unconsumed)
    /// - `ClientTypeMismatch` if the flow was not started by a mobile client
    /// - `MissingCodeVerifier` if a challenge was recorded and no verifier is given
    /// - `RedirectUriMismatch` if the supplied redirect differs from the stored one
    /// - `OAuthExchangeFailed` / `OAuthUserInfoFailed` on provider failures
    pub async fn exchange_code(&self, request: &CodeExchangeRequest) -> AppResult<OAuthLoginOutcome> {
        let state = non_empty(Some(request.state.as_str())).ok_or_else(AppError::invalid_state)?;
        let code = non_empty(Some(request.code.as_str()))
            .ok_or_else(|| AppError::invalid_input("Authorization code is required"))?;
        let flow = self.consume_flow_state(state).await?;

        if flow.client_type != ClientType::Mobile {
            return Err(AppError::client_type_mismatch(
                ClientType::Mobile.as_str(),
                flow.client_type.as_str(),
            ));
        }

        let code_verifier = non_empty(request.code_verifier.as_deref());
        if flow.code_challenge.is_some() && code_verifier.is_none() {
            return Err(AppError::missing_code_verifier());
        }

        if let Some(redirect_uri) = non_empty(request.redirect_uri.as_deref()) {
            if redirect_uri != flow.redirect_uri {
                warn!("Mobile code exchange used a different redirect_uri than the stored flow");
                return Err(AppError::redirect_uri_mismatch());
            }
        }

        let tokens = self
            .provider
            .exchange_code(code, &flow.redirect_uri, code_verifier)
            .await?;

        self.complete_sign_in(tokens, flow).await
    }

    /// Store `access_token` under a fresh single-use code
    ///
    /// The lifetime is capped at two minutes regardless of `ttl`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the code cannot be saved
    pub async fn create_one_time_code(
        &self,
        access_token: &str,
        ttl: Option<Duration>,
    ) -> AppResult<String> {
        let ttl = ttl
            .unwrap_or(self.settings.one_time_code_ttl)
            .min(Duration::from_secs(MAX_ONE_TIME_CODE_TTL_SECS));
        let code = generate_random_token(ONE_TIME_CODE_BYTES)?;

        self.state_store
            .save(&StateKey::OneTimeCode(code.clone()), access_token.to_owned(), ttl)
            .await?;

        debug!(code = %redact(&code), ttl_secs = ttl.as_secs(), "Issued one-time code");
        Ok(code)
    }

    /// Redeem a one-time code for the access token it carries
    ///
    /// # Errors
    ///
    /// - `AuthInvalid` if the code is unknown, expired or already redeemed
    /// - `StorageError` if the state store fails
    pub async fn consume_one_time_code(&self, code: &str) -> AppResult<String> {
        let code = non_empty(Some(code))
            .ok_or_else(|| AppError::auth_invalid("One-time code is required"))?;

        self.state_store
            .consume(&StateKey::OneTimeCode(code.to_owned()))
            .await?
            .ok_or_else(|| AppError::auth_invalid("One-time code is invalid, expired or already used"))
    }

    /// Provider identities linked to a user
    ///
    /// # Errors
    ///
    /// Returns a database error if the lookup fails
    pub async fn list_provider_links(&self, user_id: Uuid) -> AppResult<Vec<ProviderLink>> {
        self.links.find_by_user_id(user_id).await
    }

    /// Remove a user's link to `provider`
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user has no link to `provider`
    pub async fn disconnect_provider(&self, user_id: Uuid, provider: &str) -> AppResult<()> {
        if !self.links.delete(user_id, provider).await? {
            return Err(AppError::not_found(format!("{provider} connection")));
        }
        AuthLogger::log_oauth_event(provider, "disconnect", true, Some(&user_id.to_string()));
        Ok(())
    }

    async fn consume_flow_state(&self, state: &str) -> AppResult<FlowState> {
        let state = non_empty(Some(state)).ok_or_else(AppError::invalid_state)?;

        let Some(raw) = self
            .state_store
            .consume(&StateKey::FlowState(state.to_owned()))
            .await?
        else {
            warn!(state = %redact(state), "OAuth state unknown, expired or replayed");
            return Err(AppError::invalid_state());
        };

        serde_json::from_str(&raw).map_err(|e| {
            warn!(error = %e, "Stored OAuth flow state is corrupt");
            AppError::invalid_state()
        })
    }

    fn resolve_redirect_uri(&self, client_type: ClientType, requested: Option<&str>) -> AppResult<String> {
        let requested = non_empty(requested);
        match client_type {
            ClientType::Mobile => {
                let uri = requested.ok_or_else(|| {
                    AppError::invalid_redirect_uri("redirect_uri is required for mobile clients")
                })?;
                if !self.settings.is_allowed(uri) {
                    warn!(redirect_uri = %uri, "Rejected mobile redirect_uri not on the allow-list");
                    return Err(AppError::invalid_redirect_uri(
                        "redirect_uri is not an allowed mobile redirect",
                    ));
                }
                Ok(uri.to_owned())
            }
            ClientType::Web => match requested {
                None => Ok(self.settings.default_redirect_uri.clone()),
                Some(uri) if uri == self.settings.default_redirect_uri || self.settings.is_allowed(uri) => {
                    Ok(uri.to_owned())
                }
                Some(uri) => {
                    warn!(redirect_uri = %uri, "Rejected web redirect_uri");
                    Err(AppError::invalid_redirect_uri("redirect_uri is not allowed"))
                }
            },
        }
    }

    fn validate_post_login_redirect(
        &self,
        client_type: ClientType,
        requested: Option<&str>,
    ) -> AppResult<Option<String>> {
        let Some(uri) = non_empty(requested) else {
            return Ok(None);
        };

        let allowed = match client_type {
            ClientType::Mobile => self.settings.is_allowed(uri),
            // Web clients may land on a same-origin path
            ClientType::Web => is_relative_path(uri) || self.settings.is_allowed(uri),
        };
        if !allowed {
            warn!(post_login_redirect_uri = %uri, client_type = %client_type, "Rejected post-login redirect");
            return Err(AppError::invalid_redirect_uri(
                "post_login_redirect_uri is not allowed",
            ));
        }
        Ok(Some(uri.to_owned()))
    }

    async fn complete_sign_in(
        &self,
        tokens: ProviderTokens,
        flow: FlowState,
    ) -> AppResult<OAuthLoginOutcome> {
        let profile = self.provider.fetch_user_info(&tokens.access_token).await?;
        let (user, is_new_user) = self.resolve_user(&profile, &tokens).await?;

        let ttl = self.token_issuer.default_ttl();
        let access_token = self
            .token_issuer
            .mint(user.id, &user.email, user.user_type, ttl)?;

        AuthLogger::log_oauth_event(
            self.provider.provider_name(),
            "sign_in",
            true,
            Some(&user.id.to_string()),
        );
        info!(
            user_id = %user.id,
            client_type = %flow.client_type,
            new_user = is_new_user,
            "OAuth sign-in completed"
        );

        Ok(OAuthLoginOutcome {
            access_token,
            expires_in: ttl.as_secs(),
            user,
            is_new_user,
            client_type: flow.client_type,
            post_login_redirect_uri: flow.post_login_redirect_uri,
        })
    }

    /// Map a provider identity to a local user, linking or creating as needed
    async fn resolve_user(
        &self,
        profile: &ProviderProfile,
        tokens: &ProviderTokens,
    ) -> AppResult<(User, bool)> {
        let provider = self.provider.provider_name();

        if let Some(link) = self
            .links
            .find_by_provider_user(provider, &profile.provider_user_id)
            .await?
        {
            self.links
                .update_tokens(link.id, &token_update(profile, tokens))
                .await?;
            let user = self
                .users
                .find_by_id(link.user_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("User {}", link.user_id)))?;
            return Ok((self.record_login(user).await, false));
        }

        let email = profile
            .email
            .as_deref()
            .and_then(|e| non_empty(Some(e)))
            .ok_or_else(|| {
                AppError::oauth_user_info_failed("Provider profile has no email address", None)
            })?;

        let (mut user, is_new_user) = match self.users.find_by_email(email).await? {
            Some(existing) => (existing, false),
            None => self.create_user(profile, email).await?,
        };

        if profile.email_verified && !user.email_verified {
            user.email_verified = true;
            self.users.update(&user).await?;
        }

        self.link_identity(user.id, profile, tokens).await?;
        Ok((self.record_login(user).await, is_new_user))
    }

    async fn create_user(&self, profile: &ProviderProfile, email: &str) -> AppResult<(User, bool)> {
        let user = User::from_oauth_profile(
            email.to_owned(),
            profile.name.clone(),
            profile.picture.clone(),
            profile.email_verified,
        );

        match self.users.create(&user).await {
            Ok(_) => Ok((user, true)),
            Err(e) if e.code == ErrorCode::ResourceAlreadyExists => {
                // A concurrent sign-in created the account first
                let existing = self.users.find_by_email(email).await?.ok_or(e)?;
                Ok((existing, false))
            }
            Err(e) => Err(e),
        }
    }

    async fn link_identity(
        &self,
        user_id: Uuid,
        profile: &ProviderProfile,
        tokens: &ProviderTokens,
    ) -> AppResult<()> {
        let provider = self.provider.provider_name();
        let link = NewProviderLink {
            user_id,
            provider: provider.to_owned(),
            provider_user_id: profile.provider_user_id.clone(),
            email: profile.email.clone(),
            name: profile.name.clone(),
            avatar_url: profile.picture.clone(),
            access_token: Some(tokens.access_token.clone()),
            refresh_token: tokens.refresh_token.clone(),
            token_expires_at: tokens.expires_at(),
            raw_profile: profile.raw.clone(),
        }
        .into_link();

        match self.links.create(&link).await {
            Ok(()) => {
                AuthLogger::log_oauth_event(provider, "link_created", true, Some(&user_id.to_string()));
                Ok(())
            }
            Err(e) if e.code == ErrorCode::ResourceAlreadyExists => {
                let existing = self
                    .links
                    .find_by_provider_user(provider, &profile.provider_user_id)
                    .await?
                    .ok_or(e)?;
                self.links
                    .update_tokens(existing.id, &token_update(profile, tokens))
                    .await
            }
            Err(e) => Err(e),
        }
    }

    async fn record_login(&self, mut user: User) -> User {
        let now = Utc::now();
        if let Err(e) = self.users.update_last_login(user.id, now).await {
            warn!(user_id = %user.id, error = %e, "Failed to record last login");
        } else {
            user.last_login_at = Some(now);
        }
        user
    }
}

fn token_update(profile: &ProviderProfile, tokens: &ProviderTokens) -> ProviderTokenUpdate {
    ProviderTokenUpdate {
        access_token: tokens.access_token.clone(),
        refresh_token: tokens.refresh_token.clone(),
        token_expires_at: tokens.expires_at(),
        email: profile.email.clone(),
        name: profile.name.clone(),
        avatar_url: profile.picture.clone(),
        raw_profile: profile.raw.clone(),
    }
}

fn normalize_challenge_method(method: Option<&str>) -> AppResult<String> {
    match non_empty(method) {
        None => Ok(PKCE_METHOD_S256.to_owned()),
        Some(m) if m.eq_ignore_ascii_case(PKCE_METHOD_S256) => Ok(PKCE_METHOD_S256.to_owned()),
        Some(m) if m.eq_ignore_ascii_case(PKCE_METHOD_PLAIN) => Ok(PKCE_METHOD_PLAIN.to_owned()),
        Some(m) => Err(AppError::invalid_input(format!(
            "Unsupported code_challenge_method '{m}'"
        ))),
    }
}

fn is_relative_path(uri: &str) -> bool {
    uri.starts_with('/') && !uri.starts_with("//") && !uri.contains('\\')
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_method_defaults_to_s256() {
        assert_eq!(normalize_challenge_method(None).ok().as_deref(), Some("S256"));
        assert_eq!(normalize_challenge_method(Some("s256")).ok().as_deref(), Some("S256"));
        assert_eq!(normalize_challenge_method(Some("plain")).ok().as_deref(), Some("plain"));
        assert_eq!(
            normalize_challenge_method(Some("MD5")).err().map(|e| e.code),
            Some(ErrorCode::InvalidInput)
        );
    }

    #[test]
    fn test_relative_paths() {
        assert!(is_relative_path("/jobs/saved"));
        assert!(!is_relative_path("//evil.example.com"));
        assert!(!is_relative_path("https://evil.example.com"));
        assert!(!is_relative_path("/\\evil.example.com"));
    }

    #[test]
    fn test_non_empty_trims() {
        assert_eq!(non_empty(Some("  ")), None);
        assert_eq!(non_empty(Some(" x ")), Some("x"));
        assert_eq!(non_empty(None), None);
    }
}
