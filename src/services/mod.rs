// ABOUTME: Authentication service layer coordinating OAuth flows and session tokens
// ABOUTME: Protocol-agnostic services consumed by the HTTP layer and the maintenance CLI
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

//! Authentication service layer
//!
//! The services here own the business rules of sign-in: flow state handling,
//! PKCE and redirect validation, account linking, one-time codes and refresh
//! token lifecycle. HTTP handlers translate requests into these calls and map
//! [`AppError`](crate::errors::AppError) codes onto responses.

/// User-agent parsing into device type and display name
pub mod device;

/// Login orchestration combining OAuth outcomes with session issuance
pub mod login;

/// OAuth flow coordination: authorization URLs, callbacks, mobile code exchange
pub mod oauth_flow;

/// Refresh token issuance, rotation, revocation and cleanup
pub mod refresh_tokens;

pub use login::{BrowserLoginOutcome, LoginService, SessionTokens};
pub use oauth_flow::{
    AuthorizationUrlRequest, AuthorizationUrlResponse, CodeExchangeRequest, OAuthFlowCoordinator,
    OAuthFlowSettings, OAuthLoginOutcome,
};
pub use refresh_tokens::{IssuedRefreshToken, RefreshTokenManager, RefreshedTokens};
