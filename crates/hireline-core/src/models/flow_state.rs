// ABOUTME: Ephemeral OAuth flow state stored between authorization request and callback
// ABOUTME: Records redirect targets, PKCE challenge and client type for one login attempt
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of client driving an OAuth login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    /// Browser client (cookie session)
    #[default]
    Web,
    /// Native mobile app (deep link, PKCE)
    Mobile,
}

impl ClientType {
    /// Normalize a client-supplied value; anything unrecognized is `Web`
    #[must_use]
    pub fn normalize(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("mobile") => Self::Mobile,
            _ => Self::Web,
        }
    }

    /// Wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Mobile => "mobile",
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State recorded when an authorization URL is issued
///
/// Lives in the state store for at most its TTL and is removed by the first
/// successful consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowState {
    /// Redirect URI sent to the provider
    pub redirect_uri: String,
    /// Where the client wants to land after login (web page or deep link)
    pub post_login_redirect_uri: Option<String>,
    /// PKCE code challenge
    pub code_challenge: Option<String>,
    /// PKCE code challenge method
    pub code_challenge_method: Option<String>,
    /// Client type that started the flow
    pub client_type: ClientType,
    /// When the flow started
    pub created_at: DateTime<Utc>,
}
