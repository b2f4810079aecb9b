// ABOUTME: Integration tests for the OAuth flow coordinator
// ABOUTME: Covers state replay, redirect allow-lists, PKCE enforcement, account linking and one-time codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use common::{TestAuth, DEFAULT_REDIRECT, MOBILE_REDIRECT};
use hireline_auth::{
    auth::TokenIssuer,
    errors::ErrorCode,
    models::ClientType,
    oauth2_client::ProviderProfile,
    services::{AuthorizationUrlRequest, CodeExchangeRequest},
};
use serde_json::json;
use std::time::Duration;

fn web_request() -> AuthorizationUrlRequest {
    AuthorizationUrlRequest::default()
}

fn mobile_request(challenge: Option<&str>) -> AuthorizationUrlRequest {
    AuthorizationUrlRequest {
        client_type: Some("mobile".into()),
        redirect_uri: Some(MOBILE_REDIRECT.into()),
        code_challenge: challenge.map(Into::into),
        ..AuthorizationUrlRequest::default()
    }
}

#[tokio::test]
async fn test_web_flow_end_to_end_and_state_replay() -> Result<()> {
    let auth = TestAuth::new().await?;

    let started = auth.coordinator.build_authorization_url(&web_request()).await?;
    assert_eq!(started.expires_in, 300);
    assert!(started.authorization_url.contains(&format!("state={}", started.state)));
    assert!(started.state.len() >= 43);

    let outcome = auth.coordinator.handle_callback("code-1", &started.state).await?;
    assert_eq!(outcome.client_type, ClientType::Web);
    assert!(outcome.is_new_user);
    assert_eq!(outcome.user.email, "ana@example.com");
    assert!(outcome.user.last_login_at.is_some());

    let claims = auth.token_issuer.verify(&outcome.access_token)?;
    assert_eq!(claims.user_id()?, outcome.user.id);
    assert_eq!(claims.email, "ana@example.com");

    let calls = auth.provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].redirect_uri, DEFAULT_REDIRECT);
    assert_eq!(calls[0].code_verifier, None);

    let replay = auth
        .coordinator
        .handle_callback("code-1", &started.state)
        .await
        .unwrap_err();
    assert_eq!(replay.code, ErrorCode::InvalidState);
    assert_eq!(auth.provider.calls().len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_callback_rejects_missing_or_unknown_state() -> Result<()> {
    let auth = TestAuth::new().await?;

    let empty = auth.coordinator.handle_callback("code", "  ").await.unwrap_err();
    assert_eq!(empty.code, ErrorCode::InvalidState);

    let both_empty = auth.coordinator.handle_callback("", "").await.unwrap_err();
    assert_eq!(both_empty.code, ErrorCode::InvalidState);

    let unknown = auth
        .coordinator
        .handle_callback("code", "never-issued")
        .await
        .unwrap_err();
    assert_eq!(unknown.code, ErrorCode::InvalidState);

    let started = auth.coordinator.build_authorization_url(&web_request()).await?;
    let no_code = auth
        .coordinator
        .handle_callback("", &started.state)
        .await
        .unwrap_err();
    assert_eq!(no_code.code, ErrorCode::InvalidInput);

    // A malformed callback does not burn the state
    auth.coordinator.handle_callback("code-2", &started.state).await?;
    Ok(())
}

#[tokio::test]
async fn test_mobile_redirect_allow_list() -> Result<()> {
    let auth = TestAuth::new().await?;

    let ok = auth
        .coordinator
        .build_authorization_url(&mobile_request(None))
        .await?;
    assert!(ok.authorization_url.contains("redirect_uri=hireline%3A%2F%2Fauth%2Fcallback"));

    let foreign = AuthorizationUrlRequest {
        redirect_uri: Some("hireline-evil://auth/callback".into()),
        ..mobile_request(None)
    };
    let err = auth.coordinator.build_authorization_url(&foreign).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidRedirectUri);

    let missing = AuthorizationUrlRequest {
        redirect_uri: None,
        ..mobile_request(None)
    };
    let err = auth.coordinator.build_authorization_url(&missing).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidRedirectUri);

    let bad_post_login = AuthorizationUrlRequest {
        post_login_redirect_uri: Some("https://phish.example.com/".into()),
        ..mobile_request(None)
    };
    let err = auth
        .coordinator
        .build_authorization_url(&bad_post_login)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidRedirectUri);

    Ok(())
}

#[tokio::test]
async fn test_web_redirect_rules() -> Result<()> {
    let auth = TestAuth::new().await?;

    let explicit_default = AuthorizationUrlRequest {
        redirect_uri: Some(DEFAULT_REDIRECT.into()),
        post_login_redirect_uri: Some("/jobs/saved".into()),
        ..web_request()
    };
    let started = auth.coordinator.build_authorization_url(&explicit_default).await?;
    let outcome = auth.coordinator.handle_callback("c", &started.state).await?;
    assert_eq!(outcome.post_login_redirect_uri.as_deref(), Some("/jobs/saved"));

    let foreign = AuthorizationUrlRequest {
        redirect_uri: Some("https://attacker.example.com/cb".into()),
        ..web_request()
    };
    let err = auth.coordinator.build_authorization_url(&foreign).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidRedirectUri);

    let protocol_relative = AuthorizationUrlRequest {
        post_login_redirect_uri: Some("//attacker.example.com".into()),
        ..web_request()
    };
    let err = auth
        .coordinator
        .build_authorization_url(&protocol_relative)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidRedirectUri);

    Ok(())
}

#[tokio::test]
async fn test_unknown_client_type_defaults_to_web() -> Result<()> {
    let auth = TestAuth::new().await?;
    let request = AuthorizationUrlRequest {
        client_type: Some("smart-fridge".into()),
        ..web_request()
    };
    let started = auth.coordinator.build_authorization_url(&request).await?;
    let outcome = auth.coordinator.handle_callback("c", &started.state).await?;
    assert_eq!(outcome.client_type, ClientType::Web);
    Ok(())
}

#[tokio::test]
async fn test_pkce_challenge_method_defaults_to_s256() -> Result<()> {
    let auth = TestAuth::new().await?;
    let started = auth
        .coordinator
        .build_authorization_url(&mobile_request(Some("E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM")))
        .await?;

    assert!(started
        .authorization_url
        .contains("code_challenge=E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"));
    assert!(started.authorization_url.contains("code_challenge_method=S256"));
    Ok(())
}

#[tokio::test]
async fn test_mobile_exchange_requires_verifier_and_consumes_state() -> Result<()> {
    let auth = TestAuth::new().await?;
    let started = auth
        .coordinator
        .build_authorization_url(&mobile_request(Some("challenge")))
        .await?;

    let err = auth
        .coordinator
        .exchange_code(&CodeExchangeRequest {
            code: "mobile-code".into(),
            code_verifier: None,
            state: started.state.clone(),
            redirect_uri: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingCodeVerifier);

    let retry = auth
        .coordinator
        .exchange_code(&CodeExchangeRequest {
            code: "mobile-code".into(),
            code_verifier: Some("verifier".into()),
            state: started.state,
            redirect_uri: None,
        })
        .await
        .unwrap_err();
    assert_eq!(retry.code, ErrorCode::InvalidState);
    assert!(auth.provider.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_mobile_exchange_forwards_verifier_and_stored_redirect() -> Result<()> {
    let auth = TestAuth::new().await?;
    let started = auth
        .coordinator
        .build_authorization_url(&mobile_request(Some("challenge")))
        .await?;

    let outcome = auth
        .coordinator
        .exchange_code(&CodeExchangeRequest {
            code: "mobile-code".into(),
            code_verifier: Some("the-verifier".into()),
            state: started.state,
            redirect_uri: Some(MOBILE_REDIRECT.into()),
        })
        .await?;
    assert_eq!(outcome.client_type, ClientType::Mobile);
    assert!(outcome.is_new_user);

    let calls = auth.provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].code, "mobile-code");
    assert_eq!(calls[0].redirect_uri, MOBILE_REDIRECT);
    assert_eq!(calls[0].code_verifier.as_deref(), Some("the-verifier"));
    Ok(())
}

#[tokio::test]
async fn test_exchange_rejects_web_issued_state() -> Result<()> {
    let auth = TestAuth::new().await?;
    let started = auth.coordinator.build_authorization_url(&web_request()).await?;

    let err = auth
        .coordinator
        .exchange_code(&CodeExchangeRequest {
            code: "code".into(),
            code_verifier: Some("verifier".into()),
            state: started.state,
            redirect_uri: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ClientTypeMismatch);
    Ok(())
}

#[tokio::test]
async fn test_exchange_rejects_redirect_mismatch() -> Result<()> {
    let auth = TestAuth::new().await?;
    let started = auth
        .coordinator
        .build_authorization_url(&mobile_request(None))
        .await?;

    let err = auth
        .coordinator
        .exchange_code(&CodeExchangeRequest {
            code: "code".into(),
            code_verifier: None,
            state: started.state,
            redirect_uri: Some("hireline://other/callback".into()),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RedirectUriMismatch);
    assert!(auth.provider.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_returning_user_reuses_account_and_link() -> Result<()> {
    let auth = TestAuth::new().await?;

    let first = auth.coordinator.build_authorization_url(&web_request()).await?;
    let first = auth.coordinator.handle_callback("c1", &first.state).await?;

    let second = auth.coordinator.build_authorization_url(&web_request()).await?;
    let second = auth.coordinator.handle_callback("c2", &second.state).await?;

    assert!(first.is_new_user);
    assert!(!second.is_new_user);
    assert_eq!(first.user.id, second.user.id);

    let links = auth.coordinator.list_provider_links(first.user.id).await?;
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].provider, "google");
    assert_eq!(links[0].access_token.as_deref(), Some("provider-at-c2"));
    Ok(())
}

#[tokio::test]
async fn test_existing_email_account_gets_linked() -> Result<()> {
    let auth = TestAuth::new().await?;
    let existing = common::create_test_user(&auth.database, "ana@example.com").await?;

    let started = auth.coordinator.build_authorization_url(&web_request()).await?;
    let outcome = auth.coordinator.handle_callback("c", &started.state).await?;

    assert!(!outcome.is_new_user);
    assert_eq!(outcome.user.id, existing.id);
    assert_eq!(auth.coordinator.list_provider_links(existing.id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_profile_without_email_fails() -> Result<()> {
    let auth = TestAuth::new().await?;
    auth.provider.set_profile(ProviderProfile {
        provider_user_id: "no-email-sub".into(),
        email: None,
        email_verified: false,
        name: None,
        picture: None,
        raw: json!({ "sub": "no-email-sub" }),
    });

    let started = auth.coordinator.build_authorization_url(&web_request()).await?;
    let err = auth
        .coordinator
        .handle_callback("c", &started.state)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OAuthUserInfoFailed);
    Ok(())
}

#[tokio::test]
async fn test_provider_exchange_failure_keeps_provider_body() -> Result<()> {
    let auth = TestAuth::new().await?;
    auth.provider.fail_exchange(true);

    let started = auth.coordinator.build_authorization_url(&web_request()).await?;
    let err = auth
        .coordinator
        .handle_callback("c", &started.state)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OAuthExchangeFailed);
    assert_eq!(err.details["provider_response"], r#"{"error":"invalid_grant"}"#);

    // The state is spent; the client must restart the flow
    auth.provider.fail_exchange(false);
    let err = auth
        .coordinator
        .handle_callback("c", &started.state)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidState);
    Ok(())
}

#[tokio::test]
async fn test_one_time_code_is_single_use() -> Result<()> {
    let auth = TestAuth::new().await?;

    let code = auth.coordinator.create_one_time_code("access-token-1", None).await?;
    assert_eq!(auth.coordinator.consume_one_time_code(&code).await?, "access-token-1");

    let err = auth.coordinator.consume_one_time_code(&code).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AuthInvalid);
    Ok(())
}

#[tokio::test]
async fn test_one_time_code_expires() -> Result<()> {
    let auth = TestAuth::new().await?;

    let code = auth
        .coordinator
        .create_one_time_code("access-token-2", Some(Duration::from_millis(50)))
        .await?;
    tokio::time::sleep(Duration::from_millis(120)).await;

    let err = auth.coordinator.consume_one_time_code(&code).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AuthInvalid);
    Ok(())
}

#[tokio::test]
async fn test_disconnect_provider() -> Result<()> {
    let auth = TestAuth::new().await?;
    let started = auth.coordinator.build_authorization_url(&web_request()).await?;
    let outcome = auth.coordinator.handle_callback("c", &started.state).await?;

    auth.coordinator.disconnect_provider(outcome.user.id, "google").await?;
    assert!(auth.coordinator.list_provider_links(outcome.user.id).await?.is_empty());

    let err = auth
        .coordinator
        .disconnect_provider(outcome.user.id, "google")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    Ok(())
}

#[tokio::test]
async fn test_exchange_checks_state_before_code() -> Result<()> {
    let auth = TestAuth::new().await?;

    let err = auth
        .coordinator
        .exchange_code(&CodeExchangeRequest {
            code: String::new(),
            code_verifier: None,
            state: String::new(),
            redirect_uri: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidState);
    Ok(())
}

#[tokio::test]
async fn test_pending_login_survives_a_burst_of_new_flows() -> Result<()> {
    let auth = TestAuth::new().await?;
    let pending = auth.coordinator.build_authorization_url(&web_request()).await?;

    let mut rejected = 0;
    for _ in 0..1_000 {
        if let Err(err) = auth.coordinator.build_authorization_url(&web_request()).await {
            assert_eq!(err.code, ErrorCode::StorageError);
            rejected += 1;
        }
    }
    assert_eq!(rejected, 1);

    let outcome = auth.coordinator.handle_callback("code", &pending.state).await?;
    assert!(outcome.is_new_user);
    Ok(())
}
