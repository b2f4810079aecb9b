// ABOUTME: Redis state store using native key expiry and atomic GETDEL
// ABOUTME: Shared backend for multi-instance deployments with connection retry on startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

use super::{StateKey, StateStore};
use crate::config::state_store::{RedisConnectionConfig, StateStoreConfig};
use crate::errors::{AppError, AppResult};
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use std::time::Duration;
use tracing::{info, warn};

/// Redis-backed state store
///
/// Uses Redis `ConnectionManager` for automatic reconnection. Entries expire
/// through `SET ... PX`, and `GETDEL` makes consume a single server-side
/// operation, so concurrent consumers across instances cannot both succeed.
#[derive(Clone)]
pub struct RedisStateStore {
    manager: ConnectionManager,
}

impl RedisStateStore {
    /// Connect to Redis using the configured URL
    ///
    /// # Errors
    ///
    /// Returns a config error if no Redis URL is configured, or a storage
    /// error if the connection cannot be established after all retries
    pub async fn connect(config: &StateStoreConfig) -> AppResult<Self> {
        let redis_url = config
            .redis_url
            .as_ref()
            .ok_or_else(|| AppError::config("Redis URL is required for the Redis state store"))?;

        let conn_config = &config.redis_connection;

        info!(
            "Connecting state store to Redis (timeout={}s, response_timeout={}s, retries={})",
            conn_config.connection_timeout_secs,
            conn_config.response_timeout_secs,
            conn_config.initial_connection_retries
        );

        let client = redis::Client::open(redis_url.as_str())
            .map_err(|e| AppError::config(format!("Invalid Redis URL: {e}")))?;

        let manager = Self::connect_with_retry(&client, conn_config).await?;

        info!("State store connected to Redis");

        Ok(Self { manager })
    }

    /// Connect with exponential backoff retry on failure
    async fn connect_with_retry(
        client: &redis::Client,
        conn_config: &RedisConnectionConfig,
    ) -> AppResult<ConnectionManager> {
        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(Duration::from_secs(conn_config.connection_timeout_secs))
            .set_response_timeout(Duration::from_secs(conn_config.response_timeout_secs))
            .set_number_of_retries(conn_config.reconnection_retries)
            .set_exponent_base(conn_config.retry_exponent_base)
            .set_max_delay(conn_config.max_retry_delay_ms);

        let max_retries = conn_config.initial_connection_retries;
        let mut delay_ms = conn_config.initial_retry_delay_ms;
        let mut last_error = None;

        for attempt in 0..=max_retries {
            match ConnectionManager::new_with_config(client.clone(), manager_config.clone()).await {
                Ok(manager) => {
                    if attempt > 0 {
                        info!("Redis connection established after {} retries", attempt);
                    }
                    return Ok(manager);
                }
                Err(e) => {
                    if attempt < max_retries {
                        warn!(
                            "Redis connection attempt {}/{} failed, retrying in {}ms: {}",
                            attempt + 1,
                            max_retries + 1,
                            delay_ms,
                            e
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        delay_ms = (delay_ms * 2).min(conn_config.max_retry_delay_ms);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(AppError::storage(format!(
            "Failed to connect to Redis after {} attempts: {}",
            max_retries + 1,
            last_error.map_or_else(|| "unknown error".to_owned(), |e| e.to_string())
        )))
    }

    fn ttl_millis(ttl: Duration) -> u64 {
        u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
    }
}

#[async_trait::async_trait]
impl StateStore for RedisStateStore {
    async fn save(&self, key: &StateKey, value: String, ttl: Duration) -> AppResult<()> {
        let mut conn = self.manager.clone();

        let (): () = redis::cmd("SET")
            .arg(key.to_string())
            .arg(value)
            .arg("PX")
            .arg(Self::ttl_millis(ttl))
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::storage(format!("Redis SET failed: {e}")).with_source(e))?;
        Ok(())
    }

    async fn consume(&self, key: &StateKey) -> AppResult<Option<String>> {
        let mut conn = self.manager.clone();

        let value: Option<String> = redis::cmd("GETDEL")
            .arg(key.to_string())
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::storage(format!("Redis GETDEL failed: {e}")).with_source(e))?;
        Ok(value)
    }

    async fn health_check(&self) -> AppResult<()> {
        let mut conn = self.manager.clone();

        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::storage(format!("Redis health check failed: {e}")))?;

        if pong == "PONG" {
            Ok(())
        } else {
            Err(AppError::storage(format!(
                "Redis health check returned unexpected response: {pong}"
            )))
        }
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_millis_never_zero() {
        assert_eq!(RedisStateStore::ttl_millis(Duration::ZERO), 1);
        assert_eq!(RedisStateStore::ttl_millis(Duration::from_secs(300)), 300_000);
    }

    #[tokio::test]
    async fn test_connect_requires_url() {
        let err = RedisStateStore::connect(&StateStoreConfig::default())
            .await
            .err()
            .map(|e| e.code);
        assert_eq!(err, Some(crate::errors::ErrorCode::ConfigError));
    }
}
