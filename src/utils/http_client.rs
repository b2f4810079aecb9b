// ABOUTME: Shared HTTP client utilities with connection pooling and timeout configuration
// ABOUTME: Provides clients tuned for OAuth provider token and profile calls
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Connect timeout applied to every outbound client
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Create a new HTTP client with custom timeout settings
///
/// Falls back to a default client if the builder fails.
#[must_use]
pub fn create_client_with_timeout(timeout_secs: u64, connect_timeout_secs: u64) -> Client {
    ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .user_agent(concat!("hireline-auth/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Create a new HTTP client for OAuth provider calls
///
/// The request timeout matches the provider call deadline so a stalled
/// provider cannot hold a connection longer than the caller waits.
#[must_use]
pub fn oauth_client(timeout_secs: u64) -> Client {
    create_client_with_timeout(timeout_secs, CONNECT_TIMEOUT_SECS.min(timeout_secs))
}
