// ABOUTME: Unified error handling re-exported from hireline-core
// ABOUTME: AppError, ErrorCode and the JSON error body used by HTTP handlers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

pub use hireline_core::errors::*;
