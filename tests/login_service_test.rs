// ABOUTME: End-to-end tests for login orchestration across web and mobile clients
// ABOUTME: Browser callbacks, one-time code hand-off, PKCE exchange, refresh and logout
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use common::{TestAuth, MOBILE_BRIDGE, MOBILE_REDIRECT};
use hireline_auth::{
    auth::TokenIssuer,
    errors::ErrorCode,
    models::DeviceInfo,
    services::{AuthorizationUrlRequest, BrowserLoginOutcome, CodeExchangeRequest},
};

const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

fn browser_device() -> DeviceInfo {
    DeviceInfo {
        user_agent: Some(CHROME_UA.to_owned()),
        ip_address: Some("198.51.100.20".to_owned()),
        ..DeviceInfo::default()
    }
}

#[tokio::test]
async fn test_web_login_issues_access_and_refresh_tokens() -> Result<()> {
    let auth = TestAuth::new().await?;
    let started = auth
        .coordinator
        .build_authorization_url(&AuthorizationUrlRequest {
            post_login_redirect_uri: Some("/dashboard".into()),
            ..AuthorizationUrlRequest::default()
        })
        .await?;

    let outcome = auth
        .login
        .complete_browser_callback("code", &started.state, browser_device(), false)
        .await?;

    let BrowserLoginOutcome::Web {
        session,
        redirect_to,
    } = outcome
    else {
        panic!("expected a web outcome");
    };
    assert_eq!(redirect_to.as_deref(), Some("/dashboard"));
    assert!(session.is_new_user);
    assert_eq!(auth.token_issuer.verify(&session.access_token)?.user_id()?, session.user.id);

    let devices = auth.refresh_tokens.list_active_devices(session.user.id).await?;
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].device_name.as_deref(), Some("Chrome on Windows"));
    assert_eq!(devices[0].device_type.as_deref(), Some("desktop"));

    let refreshed = auth
        .login
        .refresh(
            &session.refresh_token,
            session.user.id,
            &session.user.email,
            session.user.user_type,
        )
        .await?;
    assert_ne!(refreshed.refresh_token, session.refresh_token);
    Ok(())
}

#[tokio::test]
async fn test_mobile_browser_login_hands_off_one_time_code() -> Result<()> {
    let auth = TestAuth::new().await?;
    let started = auth
        .coordinator
        .build_authorization_url(&AuthorizationUrlRequest {
            client_type: Some("mobile".into()),
            redirect_uri: Some(MOBILE_BRIDGE.into()),
            post_login_redirect_uri: Some(MOBILE_REDIRECT.into()),
            ..AuthorizationUrlRequest::default()
        })
        .await?;

    let outcome = auth
        .login
        .complete_browser_callback("code", &started.state, DeviceInfo::default(), false)
        .await?;

    let BrowserLoginOutcome::Mobile { redirect_to } = outcome else {
        panic!("expected a mobile outcome");
    };
    let prefix = format!("{MOBILE_REDIRECT}?code=");
    assert!(redirect_to.starts_with(&prefix));
    assert!(!redirect_to.contains("access_token"));

    let code = &redirect_to[prefix.len()..];
    let access_token = auth.login.redeem_one_time_code(code).await?;
    let claims = auth.token_issuer.verify(&access_token)?;
    assert_eq!(claims.email, "ana@example.com");

    let err = auth.login.redeem_one_time_code(code).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AuthInvalid);
    Ok(())
}

#[tokio::test]
async fn test_mobile_browser_login_without_deep_link_fails() -> Result<()> {
    let auth = TestAuth::new().await?;
    let started = auth
        .coordinator
        .build_authorization_url(&AuthorizationUrlRequest {
            client_type: Some("mobile".into()),
            redirect_uri: Some(MOBILE_BRIDGE.into()),
            ..AuthorizationUrlRequest::default()
        })
        .await?;

    let err = auth
        .login
        .complete_browser_callback("code", &started.state, DeviceInfo::default(), false)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidRedirectUri);
    Ok(())
}

#[tokio::test]
async fn test_mobile_pkce_exchange_issues_session() -> Result<()> {
    let auth = TestAuth::new().await?;
    let started = auth
        .coordinator
        .build_authorization_url(&AuthorizationUrlRequest {
            client_type: Some("mobile".into()),
            redirect_uri: Some(MOBILE_REDIRECT.into()),
            code_challenge: Some("E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM".into()),
            ..AuthorizationUrlRequest::default()
        })
        .await?;

    let session = auth
        .login
        .complete_mobile_exchange(
            &CodeExchangeRequest {
                code: "app-code".into(),
                code_verifier: Some("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".into()),
                state: started.state,
                redirect_uri: Some(MOBILE_REDIRECT.into()),
            },
            DeviceInfo {
                device_id: Some("ios-device-1".into()),
                device_name: Some("Ana's iPhone".into()),
                device_type: Some("mobile".into()),
                ..DeviceInfo::default()
            },
            true,
        )
        .await?;

    assert_eq!(session.expires_in, 3600);
    let devices = auth.refresh_tokens.list_active_devices(session.user.id).await?;
    assert_eq!(devices[0].device_name.as_deref(), Some("Ana's iPhone"));
    assert_eq!(devices[0].device_id.as_deref(), Some("ios-device-1"));
    Ok(())
}

#[tokio::test]
async fn test_logout_and_logout_all() -> Result<()> {
    let auth = TestAuth::new().await?;

    let mut sessions = Vec::new();
    for code in ["c1", "c2"] {
        let started = auth
            .coordinator
            .build_authorization_url(&AuthorizationUrlRequest::default())
            .await?;
        let BrowserLoginOutcome::Web { session, .. } = auth
            .login
            .complete_browser_callback(code, &started.state, browser_device(), false)
            .await?
        else {
            panic!("expected a web outcome");
        };
        sessions.push(session);
    }
    let user = sessions[0].user.clone();

    auth.login.logout(&sessions[0].refresh_token).await;
    auth.login.logout(&sessions[0].refresh_token).await;
    assert_eq!(auth.refresh_tokens.list_active_devices(user.id).await?.len(), 1);

    assert_eq!(auth.login.logout_all(user.id).await?, 1);
    let err = auth
        .login
        .refresh(&sessions[1].refresh_token, user.id, &user.email, user.user_type)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RefreshTokenRevoked);
    Ok(())
}
