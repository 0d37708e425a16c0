// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Claim decoding and the authenticated identity.
//!
//! The `aud` claim may arrive as a single string or as an array of strings.
//! Decoding is an explicit two-attempt state machine:
//!
//! 1. Decode with a scalar `aud`.
//! 2. If, and only if, step 1 failed with a data error (a JSON type mismatch,
//!    not a syntax error) and `aud` is a JSON array, decode again with an
//!    array `aud`.
//!
//! Every other field has exactly one accepted shape in both attempts, so a
//! type error anywhere else fails both attempts and surfaces as
//! [`AuthError::MalformedClaims`].

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde_json::error::Category;

use super::error::AuthError;

/// Normalized claim set.
///
/// `audience` is always a set regardless of the wire encoding.
#[derive(Clone, PartialEq, Eq)]
pub struct Claims {
    pub issuer: String,
    /// Caller identity - redacted in Debug output
    pub subject: String,
    pub audience: BTreeSet<String>,
    pub expires_at: Option<i64>,
    pub issued_at: Option<i64>,
    pub not_before: Option<i64>,
    pub token_id: Option<String>,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("issuer", &self.issuer)
            .field("subject", &"[REDACTED]")
            .field("audience", &self.audience)
            .field("expires_at", &self.expires_at)
            .field("issued_at", &self.issued_at)
            .field("not_before", &self.not_before)
            .field("token_id", &self.token_id)
            .finish()
    }
}

/// Result of a successful validation, published into request scope.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    /// Subject identifier from the issuer, opaque to this service
    pub subject: String,
    pub claims: Claims,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("subject", &"[REDACTED]")
            .field("claims", &self.claims)
            .finish()
    }
}

impl Identity {
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            subject: claims.subject.clone(),
            claims,
        }
    }
}

/// Wire shape with `aud` as a single string.
#[derive(Deserialize)]
struct ScalarAudienceClaims {
    #[serde(default)]
    iss: String,
    sub: String,
    #[serde(default)]
    aud: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(default)]
    nbf: Option<i64>,
    #[serde(default)]
    jti: Option<String>,
}

/// Wire shape with `aud` as an array of strings.
#[derive(Deserialize)]
struct ArrayAudienceClaims {
    #[serde(default)]
    iss: String,
    sub: String,
    aud: Vec<String>,
    #[serde(default)]
    exp: Option<i64>,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(default)]
    nbf: Option<i64>,
    #[serde(default)]
    jti: Option<String>,
}

impl From<ScalarAudienceClaims> for Claims {
    fn from(wire: ScalarAudienceClaims) -> Self {
        Self {
            issuer: wire.iss,
            subject: wire.sub,
            audience: wire.aud.into_iter().collect(),
            expires_at: wire.exp,
            issued_at: wire.iat,
            not_before: wire.nbf,
            token_id: wire.jti,
        }
    }
}

impl From<ArrayAudienceClaims> for Claims {
    fn from(wire: ArrayAudienceClaims) -> Self {
        Self {
            issuer: wire.iss,
            subject: wire.sub,
            audience: wire.aud.into_iter().collect(),
            expires_at: wire.exp,
            issued_at: wire.iat,
            not_before: wire.nbf,
            token_id: wire.jti,
        }
    }
}

/// Only the `aud` member, kept raw to tell the two wire shapes apart.
#[derive(Deserialize)]
struct RawAudience {
    #[serde(default)]
    aud: serde_json::Value,
}

/// Whether the payload is a JSON object whose `aud` is an array.
fn audience_is_array(payload: &[u8]) -> bool {
    serde_json::from_slice::<RawAudience>(payload).is_ok_and(|raw| raw.aud.is_array())
}

/// Decode a JSON claim payload into normalized [`Claims`].
pub fn decode_claims(payload: &[u8]) -> Result<Claims, AuthError> {
    let claims: Claims = match serde_json::from_slice::<ScalarAudienceClaims>(payload) {
        Ok(wire) => wire.into(),
        Err(e) if e.classify() == Category::Data && audience_is_array(payload) => {
            serde_json::from_slice::<ArrayAudienceClaims>(payload)
                .map_err(|retry| {
                    tracing::debug!(
                        target: "auth.claims",
                        error = %retry,
                        "Claims rejected under array audience shape"
                    );
                    AuthError::MalformedClaims
                })?
                .into()
        }
        Err(e) => {
            tracing::debug!(target: "auth.claims", error = %e, "Claims payload rejected");
            return Err(AuthError::MalformedClaims);
        }
    };

    if claims.subject.is_empty() {
        tracing::debug!(target: "auth.claims", "Claims rejected: empty subject");
        return Err(AuthError::MalformedClaims);
    }

    Ok(claims)
}
