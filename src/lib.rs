// ABOUTME: Main library entry point for the Hireline authentication subsystem
// ABOUTME: OAuth login with PKCE, single-use state and one-time codes, refresh-token sessions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

#![deny(unsafe_code)]

//! # Hireline Auth
//!
//! Authentication and session subsystem of the Hireline job portal.
//!
//! ## Features
//!
//! - **OAuth login**: Google authorization-code flow for browser and mobile
//!   clients, with PKCE for native apps and an allow-list for deep links
//! - **Single-use state**: flow state and one-time codes live in a TTL store
//!   (in-process or Redis) and are removed atomically on first read
//! - **Refresh tokens**: hashed, device-bound, rotated on every use and capped
//!   per user with oldest-first eviction
//!
//! ## Architecture
//!
//! - **`state_store`**: `StateStore` trait with in-process and Redis backends
//! - **`oauth2_client`**: provider HTTP client (token exchange, profile fetch)
//! - **`auth`**: access token issuer (JWT)
//! - **`database`**: SQLite repositories for users, provider links and refresh tokens
//! - **`services`**: `OAuthFlowCoordinator`, `RefreshTokenManager` and `LoginService`
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use hireline_auth::config::environment::AuthConfig;
//! use hireline_auth::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = AuthConfig::from_env()?;
//!     println!("state store backend: {}", config.state_store.backend_label());
//!     Ok(())
//! }
//! ```

/// Access token issuing and verification
pub mod auth;

/// Environment-driven configuration
pub mod config;

/// Domain constants (re-exported from `hireline-core`)
pub mod constants;

/// Random token generation and hashing helpers
pub mod crypto;

/// SQLite persistence and repositories
pub mod database;

/// Unified error handling (re-exported from `hireline-core`)
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Domain models (re-exported from `hireline-core`)
pub mod models;

/// OAuth provider HTTP clients
pub mod oauth2_client;

/// OAuth flow, refresh-token and login orchestration services
pub mod services;

/// TTL key-value store for flow state and one-time codes
pub mod state_store;

/// Shared utilities
pub mod utils;
