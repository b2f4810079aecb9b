// ABOUTME: Domain constants re-exported from hireline-core
// ABOUTME: OAuth endpoints, state store namespaces and token lifecycle defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

pub use hireline_core::constants::*;
