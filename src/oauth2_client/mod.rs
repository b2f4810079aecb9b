// ABOUTME: OAuth 2.0 client implementation for third-party login providers
// ABOUTME: Provider abstraction plus the Google authorization-code client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

//! # OAuth 2.0 Client Module
//!
//! Hireline acts as an OAuth 2.0 client of the login provider. This module
//! builds authorization URLs, exchanges authorization codes (optionally with
//! a PKCE verifier) and fetches the provider profile.

/// Core OAuth 2.0 client implementation
pub mod client;

pub use client::{
    AuthorizationRequest, GoogleOAuthClient, OAuthProviderClient, ProviderProfile, ProviderTokens,
};
