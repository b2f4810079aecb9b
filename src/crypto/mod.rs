// ABOUTME: Cryptographic helpers for random tokens, hashing and PKCE challenges
// ABOUTME: Centralizes all randomness and digest operations for the auth subsystem
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

//! Cryptographic utilities
//!
//! Random values come from `ring::rand::SystemRandom` and are encoded as
//! URL-safe base64 without padding so they can travel in query strings.

use crate::errors::{AppError, AppResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};

/// Number of characters kept by [`redact`]
const REDACTED_PREFIX_LEN: usize = 8;

/// Generate `num_bytes` of secure randomness encoded as URL-safe base64
///
/// # Errors
///
/// Returns an internal error if the system RNG fails
pub fn generate_random_token(num_bytes: usize) -> AppResult<String> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; num_bytes];
    rng.fill(&mut bytes)
        .map_err(|_| AppError::internal("System RNG failure while generating token"))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// SHA-256 digest of `input` as lowercase hex
#[must_use]
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// S256 PKCE challenge for a code verifier
#[must_use]
pub fn pkce_s256_challenge(code_verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code_verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Short prefix of a secret for log correlation
#[must_use]
pub fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(REDACTED_PREFIX_LEN).collect();
    format!("{prefix}...")
}
