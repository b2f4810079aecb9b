// ABOUTME: Configuration module for the Hireline authentication subsystem
// ABOUTME: Loads provider, state store, token lifecycle and database settings from the environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

//! Configuration module
//!
//! - **Environment**: complete runtime configuration from environment variables
//! - **State store**: backend selection, capacity and Redis connection tuning

/// Runtime configuration loaded from environment variables
pub mod environment;
/// State store backend and Redis connection configuration
pub mod state_store;

pub use environment::{
    AuthConfig, DatabaseConfig, GoogleOAuthConfig, JwtConfig, OAuthFlowConfig, RefreshTokenConfig,
};
pub use state_store::{RedisConnectionConfig, StateStoreConfig};
