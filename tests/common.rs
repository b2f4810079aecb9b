// ABOUTME: Shared test utilities for auth integration tests
// ABOUTME: In-memory database and state store, fake OAuth provider and wired services
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used
)]
//! Shared test utilities for `hireline_auth`

use anyhow::Result;
use async_trait::async_trait;
use hireline_auth::{
    auth::{JwtTokenIssuer, TokenIssuer},
    config::{JwtConfig, OAuthFlowConfig, RefreshTokenConfig, StateStoreConfig},
    constants::service_names,
    database::{
        repositories::{
            ProviderLinkRepositoryImpl, RefreshTokenRepositoryImpl, UserRepositoryImpl,
        },
        Database,
    },
    errors::{AppError, AppResult},
    models::User,
    oauth2_client::{AuthorizationRequest, OAuthProviderClient, ProviderProfile, ProviderTokens},
    services::{LoginService, OAuthFlowCoordinator, OAuthFlowSettings, RefreshTokenManager},
    state_store::{InMemoryStateStore, StateStore},
};
use serde_json::json;
use std::sync::{Arc, Mutex, Once};

static INIT_LOGGER: Once = Once::new();

pub const DEFAULT_REDIRECT: &str = "https://api.hireline.test/auth/google/callback";
pub const MOBILE_REDIRECT: &str = "hireline://auth/callback";
pub const MOBILE_BRIDGE: &str = "https://api.hireline.test/auth/google/mobile-callback";
pub const JWT_SECRET: &str = "test-secret-that-is-at-least-32-bytes-long!";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// In-memory SQLite with migrations applied
pub async fn create_test_database() -> Result<Database> {
    init_test_logging();
    Ok(Database::new("sqlite::memory:").await?)
}

/// In-memory state store without the background sweeper
pub fn create_test_state_store(max_entries: usize) -> Arc<InMemoryStateStore> {
    Arc::new(InMemoryStateStore::new(&StateStoreConfig {
        max_entries,
        enable_background_cleanup: false,
        ..StateStoreConfig::default()
    }))
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: JWT_SECRET.to_owned(),
        expiry_secs: 3600,
        issuer: service_names::DEFAULT_ISSUER.to_owned(),
        audience: service_names::PORTAL_API_AUDIENCE.to_owned(),
    }
}

pub fn test_flow_config() -> OAuthFlowConfig {
    OAuthFlowConfig {
        mobile_redirect_uris: vec![MOBILE_REDIRECT.to_owned(), MOBILE_BRIDGE.to_owned()],
        ..OAuthFlowConfig::default()
    }
}

/// Persist a user created as if from a provider profile
pub async fn create_test_user(database: &Database, email: &str) -> Result<User> {
    let user = User::from_oauth_profile(email.to_owned(), Some("Test User".into()), None, true);
    database.create_user(&user).await?;
    Ok(user)
}

/// Recorded call to [`FakeProvider::exchange_code`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeCall {
    pub code: String,
    pub redirect_uri: String,
    pub code_verifier: Option<String>,
}

/// Scripted OAuth provider
pub struct FakeProvider {
    profile: Mutex<ProviderProfile>,
    fail_exchange: Mutex<bool>,
    calls: Mutex<Vec<ExchangeCall>>,
}

impl FakeProvider {
    pub fn new(subject: &str, email: Option<&str>) -> Self {
        Self {
            profile: Mutex::new(ProviderProfile {
                provider_user_id: subject.to_owned(),
                email: email.map(ToOwned::to_owned),
                email_verified: true,
                name: Some("Ana Candidate".to_owned()),
                picture: None,
                raw: json!({ "sub": subject, "email": email }),
            }),
            fail_exchange: Mutex::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_profile(&self, profile: ProviderProfile) {
        *self.profile.lock().unwrap() = profile;
    }

    pub fn fail_exchange(&self, fail: bool) {
        *self.fail_exchange.lock().unwrap() = fail;
    }

    pub fn calls(&self) -> Vec<ExchangeCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OAuthProviderClient for FakeProvider {
    fn provider_name(&self) -> &'static str {
        "google"
    }

    fn authorization_url(&self, request: &AuthorizationRequest<'_>) -> AppResult<String> {
        let mut url = url::Url::parse("https://accounts.example.test/authorize")
            .map_err(|e| AppError::config(e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("redirect_uri", request.redirect_uri)
                .append_pair("state", request.state);
            if let Some(challenge) = request.code_challenge {
                query.append_pair("code_challenge", challenge);
            }
            if let Some(method) = request.code_challenge_method {
                query.append_pair("code_challenge_method", method);
            }
        }
        Ok(url.into())
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> AppResult<ProviderTokens> {
        self.calls.lock().unwrap().push(ExchangeCall {
            code: code.to_owned(),
            redirect_uri: redirect_uri.to_owned(),
            code_verifier: code_verifier.map(ToOwned::to_owned),
        });

        if *self.fail_exchange.lock().unwrap() {
            return Err(AppError::oauth_exchange_failed(
                "Token endpoint returned 400 Bad Request",
                Some(r#"{"error":"invalid_grant"}"#.to_owned()),
            ));
        }

        Ok(ProviderTokens {
            access_token: format!("provider-at-{code}"),
            refresh_token: Some("provider-rt".to_owned()),
            expires_in: Some(3599),
            token_type: Some("Bearer".to_owned()),
            id_token: None,
            scope: Some("openid email profile".to_owned()),
        })
    }

    async fn fetch_user_info(&self, _access_token: &str) -> AppResult<ProviderProfile> {
        Ok(self.profile.lock().unwrap().clone())
    }
}

/// Fully wired services over in-memory storage
pub struct TestAuth {
    pub database: Database,
    pub state_store: Arc<InMemoryStateStore>,
    pub provider: Arc<FakeProvider>,
    pub token_issuer: Arc<JwtTokenIssuer>,
    pub coordinator: Arc<OAuthFlowCoordinator>,
    pub refresh_tokens: Arc<RefreshTokenManager>,
    pub login: LoginService,
}

impl TestAuth {
    pub async fn new() -> Result<Self> {
        Self::with_refresh_config(RefreshTokenConfig::default()).await
    }

    pub async fn with_refresh_config(refresh_config: RefreshTokenConfig) -> Result<Self> {
        let database = create_test_database().await?;
        let state_store = create_test_state_store(1_000);
        let provider = Arc::new(FakeProvider::new("google-sub-1", Some("ana@example.com")));
        let token_issuer = Arc::new(JwtTokenIssuer::new(&test_jwt_config()));

        let store: Arc<dyn StateStore> = state_store.clone();
        let issuer: Arc<dyn TokenIssuer> = token_issuer.clone();
        let provider_client: Arc<dyn OAuthProviderClient> = provider.clone();

        let coordinator = Arc::new(OAuthFlowCoordinator::new(
            provider_client,
            store,
            Arc::new(UserRepositoryImpl::new(database.clone())),
            Arc::new(ProviderLinkRepositoryImpl::new(database.clone())),
            issuer.clone(),
            OAuthFlowSettings::new(DEFAULT_REDIRECT.to_owned(), &test_flow_config()),
        ));
        let refresh_tokens = Arc::new(RefreshTokenManager::new(
            Arc::new(RefreshTokenRepositoryImpl::new(database.clone())),
            issuer,
            refresh_config,
        ));
        let login = LoginService::new(coordinator.clone(), refresh_tokens.clone());

        Ok(Self {
            database,
            state_store,
            provider,
            token_issuer,
            coordinator,
            refresh_tokens,
            login,
        })
    }
}
