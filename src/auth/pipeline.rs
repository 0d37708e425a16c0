// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token validation pipeline.
//!
//! Stages, in order, each short-circuiting with its own classified error:
//!
//! 1. Split the compact token and decode the header
//! 2. Decode the claims payload
//! 3. Verify the signature (algorithm allow-list, key lookup, RS256)
//! 4. Validate temporal and identity claims
//!
//! The pipeline holds no mutable state; the same token at the same `now`
//! always yields the same outcome.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use super::claims::{decode_claims, Identity};
use super::error::AuthError;
use super::jwks::KeyRing;
use super::signature::verify_signature;
use super::token::CompactToken;
use super::validator::ClaimsValidator;

#[derive(Debug, Clone)]
pub struct TokenValidationPipeline {
    key_ring: Arc<KeyRing>,
    validator: ClaimsValidator,
}

impl TokenValidationPipeline {
    pub fn new(key_ring: Arc<KeyRing>, validator: ClaimsValidator) -> Self {
        Self {
            key_ring,
            validator,
        }
    }

    /// Validate `token` against the current wall clock.
    pub fn validate(&self, token: &str) -> Result<Identity, AuthError> {
        self.validate_at(token, Utc::now().timestamp())
    }

    /// Validate `token` at Unix time `now`.
    #[instrument(skip_all, fields(now = now))]
    pub fn validate_at(&self, token: &str, now: i64) -> Result<Identity, AuthError> {
        let token = CompactToken::parse(token)?;
        let header = token.header()?;
        let claims = decode_claims(&token.payload_bytes()?)?;

        verify_signature(
            &header,
            token.signing_input(),
            token.signature(),
            &self.key_ring,
        )?;

        self.validator.validate(&claims, now)?;

        tracing::debug!(target: "auth.pipeline", kid = %header.kid, "Token validated");
        Ok(Identity::from_claims(claims))
    }
}
