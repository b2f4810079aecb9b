// ABOUTME: TTL key-value store abstraction for OAuth flow state and one-time codes
// ABOUTME: Pluggable backends (in-process LRU, Redis) behind a single save/consume contract
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

//! # State Store
//!
//! Short-lived, single-use records keyed by a random token. Two operations:
//!
//! - `save(key, value, ttl)` stores a value and silently overwrites an existing key
//! - `consume(key)` atomically reads and deletes; of any number of concurrent
//!   consumers of the same key, exactly one receives the value
//!
//! Expired entries read as absent even before they are physically removed.
//! Backend errors are returned to the caller; nothing falls back to another
//! backend mid-flight.

/// Backend selection from configuration
pub mod factory;
/// In-process backend with LRU bound and background sweep
pub mod memory;
/// Redis backend using native TTL and `GETDEL`
pub mod redis;

pub use factory::create_state_store;
pub use memory::InMemoryStateStore;
pub use redis::RedisStateStore;

use crate::constants::state_store::{FLOW_STATE_NAMESPACE, KEY_PREFIX, ONE_TIME_CODE_NAMESPACE};
use crate::errors::AppResult;
use std::fmt;
use std::time::Duration;

/// Namespaced state store key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StateKey {
    /// OAuth flow state, keyed by the state token
    FlowState(String),
    /// One-time code, keyed by the code
    OneTimeCode(String),
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FlowState(token) => write!(f, "{KEY_PREFIX}{FLOW_STATE_NAMESPACE}{token}"),
            Self::OneTimeCode(code) => write!(f, "{KEY_PREFIX}{ONE_TIME_CODE_NAMESPACE}{code}"),
        }
    }
}

/// TTL key-value store with atomic consume
#[async_trait::async_trait]
pub trait StateStore: Send + Sync {
    /// Store `value` under `key` for `ttl`, replacing any existing entry
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend is unreachable
    async fn save(&self, key: &StateKey, value: String, ttl: Duration) -> AppResult<()>;

    /// Atomically fetch and delete `key`
    ///
    /// Returns `None` for unknown, expired or already-consumed keys.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend is unreachable
    async fn consume(&self, key: &StateKey) -> AppResult<Option<String>>;

    /// Verify the backend is reachable
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend does not respond
    async fn health_check(&self) -> AppResult<()>;

    /// Backend identifier for logs
    fn backend_name(&self) -> &'static str;
}
