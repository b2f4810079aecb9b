// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Protocol values and lifecycle defaults for the Hireline auth subsystem
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

//! Constants module
//!
//! Constants are grouped by domain rather than kept in a single large file.

/// OAuth provider identifiers, endpoints and protocol parameter values
pub mod oauth;
/// State store key namespaces, TTLs and sweep defaults
pub mod state_store;
/// Access and refresh token lifecycle defaults
pub mod tokens;

/// Service identifiers used in logs and token claims
pub mod service_names {
    /// Service name for structured logging
    pub const HIRELINE_AUTH: &str = "hireline-auth";
    /// Default JWT issuer
    pub const DEFAULT_ISSUER: &str = "hireline";
    /// Audience claim for access tokens consumed by the portal API
    pub const PORTAL_API_AUDIENCE: &str = "hireline-api";
}
