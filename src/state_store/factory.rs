// ABOUTME: State store factory selecting the backend from configuration
// ABOUTME: Redis when a URL is configured, otherwise the in-process store; never falls back
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

use super::{InMemoryStateStore, RedisStateStore, StateStore};
use crate::config::state_store::StateStoreConfig;
use crate::errors::AppResult;
use std::sync::Arc;
use tracing::info;

/// Build the configured state store backend
///
/// A configured but unreachable Redis is an error: silently switching to the
/// in-process store would break single-use guarantees across instances.
///
/// # Errors
///
/// Returns an error if the Redis backend cannot be reached
pub async fn create_state_store(config: &StateStoreConfig) -> AppResult<Arc<dyn StateStore>> {
    if config.redis_url.is_some() {
        let store = RedisStateStore::connect(config).await?;
        info!("Initialized Redis state store");
        return Ok(Arc::new(store));
    }

    info!(
        "Initializing in-process state store (max entries: {}, sweep every {}s)",
        config.max_entries, config.cleanup_interval_secs
    );
    Ok(Arc::new(InMemoryStateStore::new(config)))
}
