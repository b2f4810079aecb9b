// ABOUTME: Core types and constants for the Hireline authentication subsystem
// ABOUTME: Foundation crate with error handling, domain models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

#![deny(unsafe_code)]

//! # Hireline Core
//!
//! Foundation crate providing shared types and constants for the Hireline
//! authentication subsystem. This crate is designed to change infrequently,
//! enabling incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **constants**: Protocol and lifecycle defaults organized by domain
//! - **models**: Users, provider links, refresh tokens and OAuth flow state

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants and configuration defaults organized by domain
pub mod constants;

/// Core data models (User, ProviderLink, RefreshToken, FlowState)
pub mod models;
