// ABOUTME: State store configuration types for backend selection and Redis connections
// ABOUTME: Handles Redis URL, in-process capacity, sweep interval and connection retry tuning
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

use crate::constants::state_store as defaults;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// State store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateStoreConfig {
    /// Redis URL; when set the shared Redis backend is used
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Maximum live entries in the in-process backend
    pub max_entries: usize,
    /// In-process sweep interval in seconds
    pub cleanup_interval_secs: u64,
    /// Whether the in-process backend runs its background sweeper
    pub enable_background_cleanup: bool,
    /// Redis connection configuration
    #[serde(default)]
    pub redis_connection: RedisConnectionConfig,
}

impl Default for StateStoreConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            max_entries: defaults::DEFAULT_MAX_ENTRIES,
            cleanup_interval_secs: defaults::DEFAULT_CLEANUP_INTERVAL_SECS,
            enable_background_cleanup: true,
            redis_connection: RedisConnectionConfig::default(),
        }
    }
}

impl StateStoreConfig {
    /// Load state store configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty()),
            max_entries: env::var("STATE_STORE_MAX_ENTRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::DEFAULT_MAX_ENTRIES),
            cleanup_interval_secs: env::var("STATE_STORE_CLEANUP_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults::DEFAULT_CLEANUP_INTERVAL_SECS),
            enable_background_cleanup: true,
            redis_connection: RedisConnectionConfig::from_env(),
        }
    }

    /// Sweep interval as a `Duration`
    #[must_use]
    pub const fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    /// Human-readable backend label
    #[must_use]
    pub const fn backend_label(&self) -> &'static str {
        if self.redis_url.is_some() {
            "redis"
        } else {
            "memory"
        }
    }
}

/// Redis connection and retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConnectionConfig {
    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,
    /// Response/command timeout in seconds
    pub response_timeout_secs: u64,
    /// Number of reconnection retries after connection drop
    pub reconnection_retries: usize,
    /// Exponential backoff base for retry delays
    pub retry_exponent_base: u64,
    /// Maximum retry delay in milliseconds
    pub max_retry_delay_ms: u64,
    /// Number of retries for initial connection at startup
    pub initial_connection_retries: u32,
    /// Initial retry delay in milliseconds (doubles with exponential backoff)
    pub initial_retry_delay_ms: u64,
}

impl Default for RedisConnectionConfig {
    fn default() -> Self {
        Self {
            connection_timeout_secs: defaults::REDIS_CONNECTION_TIMEOUT_SECS,
            response_timeout_secs: defaults::REDIS_RESPONSE_TIMEOUT_SECS,
            reconnection_retries: defaults::REDIS_RECONNECTION_RETRIES,
            retry_exponent_base: defaults::REDIS_RETRY_EXPONENT_BASE,
            max_retry_delay_ms: defaults::REDIS_MAX_RETRY_DELAY_MS,
            initial_connection_retries: defaults::REDIS_INITIAL_CONNECTION_RETRIES,
            initial_retry_delay_ms: defaults::REDIS_INITIAL_RETRY_DELAY_MS,
        }
    }
}

impl RedisConnectionConfig {
    /// Load Redis connection configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            connection_timeout_secs: env::var("REDIS_CONNECTION_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::REDIS_CONNECTION_TIMEOUT_SECS),
            response_timeout_secs: env::var("REDIS_RESPONSE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::REDIS_RESPONSE_TIMEOUT_SECS),
            initial_connection_retries: env::var("REDIS_INITIAL_CONNECTION_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::REDIS_INITIAL_CONNECTION_RETRIES),
            ..Self::default()
        }
    }
}
