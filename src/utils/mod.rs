// ABOUTME: Shared utility modules
// ABOUTME: HTTP client construction for outbound provider calls
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

/// Shared HTTP client utilities
pub mod http_client;
