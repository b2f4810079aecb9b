// ABOUTME: Domain models re-exported from hireline-core
// ABOUTME: Users, provider links, refresh tokens and OAuth flow state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

pub use hireline_core::models::*;
