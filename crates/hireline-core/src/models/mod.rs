// ABOUTME: Core data models for the Hireline authentication subsystem
// ABOUTME: Re-exports users, provider links, refresh tokens and OAuth flow state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

//! # Data Models
//!
//! - `User`: local account resolved from a provider identity
//! - `ProviderLink`: persistent binding of a user to a provider identity
//! - `RefreshToken`: hashed, device-bound long-lived credential
//! - `FlowState`: ephemeral record backing one OAuth login attempt

mod flow_state;
mod provider_link;
mod refresh_token;
mod user;

pub use flow_state::{ClientType, FlowState};
pub use provider_link::{NewProviderLink, ProviderLink, ProviderTokenUpdate};
pub use refresh_token::{DeviceInfo, DeviceSummary, RefreshToken, RevocationReason};
pub use user::{User, UserType};
