// ABOUTME: State store constants for key namespaces, TTLs, capacity and sweep interval
// ABOUTME: Shared by the in-process and Redis state store backends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

/// Key namespace prefix applied by every backend
pub const KEY_PREFIX: &str = "hireline:";

/// Namespace for OAuth flow state entries
pub const FLOW_STATE_NAMESPACE: &str = "oauth_state:";

/// Namespace for one-time code entries
pub const ONE_TIME_CODE_NAMESPACE: &str = "otc:";

/// OAuth flow state TTL (5 minutes)
pub const DEFAULT_STATE_TTL_SECS: u64 = 300;

/// Upper bound accepted for OAuth flow state TTLs (1 hour)
pub const MAX_STATE_TTL_SECS: u64 = 3_600;

/// One-time code TTL (2 minutes), also the upper bound
pub const DEFAULT_ONE_TIME_CODE_TTL_SECS: u64 = 120;

/// Upper bound accepted for one-time code TTLs
pub const MAX_ONE_TIME_CODE_TTL_SECS: u64 = 120;

/// Interval of the in-process expiry sweep
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60;

/// Maximum live entries in the in-process store
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Redis connection timeout in seconds
pub const REDIS_CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Redis response timeout in seconds
pub const REDIS_RESPONSE_TIMEOUT_SECS: u64 = 3;

/// Reconnection attempts after an established connection drops
pub const REDIS_RECONNECTION_RETRIES: usize = 3;

/// Attempts for the initial connection at startup
pub const REDIS_INITIAL_CONNECTION_RETRIES: u32 = 3;

/// Initial retry delay for the startup connection (doubles per attempt)
pub const REDIS_INITIAL_RETRY_DELAY_MS: u64 = 500;

/// Retry delay cap in milliseconds
pub const REDIS_MAX_RETRY_DELAY_MS: u64 = 5_000;

/// Exponential backoff base for reconnection delays
pub const REDIS_RETRY_EXPONENT_BASE: u64 = 2;
