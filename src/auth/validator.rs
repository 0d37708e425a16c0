// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Temporal and identity claim validation.
//!
//! Checks run in a fixed order (exp, iat, nbf, aud, iss) and the first
//! failure is returned. Issuer and audience use constant-time comparison.

use subtle::{Choice, ConstantTimeEq};

use super::claims::Claims;
use super::error::AuthError;

/// Clock skew tolerated on `iat`, in seconds.
pub const ISSUED_AT_LEEWAY_SECS: i64 = 1;

/// Which temporal claims must be present.
///
/// The default requires none: an absent claim passes its check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub require_expires_at: bool,
    pub require_issued_at: bool,
    pub require_not_before: bool,
}

/// Validates claims against the configured issuer and audience.
#[derive(Debug, Clone)]
pub struct ClaimsValidator {
    expected_issuer: String,
    expected_audience: String,
    policy: ValidationPolicy,
}

impl ClaimsValidator {
    pub fn new(
        expected_issuer: impl Into<String>,
        expected_audience: impl Into<String>,
        policy: ValidationPolicy,
    ) -> Self {
        Self {
            expected_issuer: expected_issuer.into(),
            expected_audience: expected_audience.into(),
            policy,
        }
    }

    /// Validate `claims` at Unix time `now`.
    pub fn validate(&self, claims: &Claims, now: i64) -> Result<(), AuthError> {
        check_expires_at(
            required(claims.expires_at, self.policy.require_expires_at, "exp")?,
            now,
        )?;
        check_issued_at(
            required(claims.issued_at, self.policy.require_issued_at, "iat")?,
            now,
        )?;
        check_not_before(
            required(claims.not_before, self.policy.require_not_before, "nbf")?,
            now,
        )?;
        check_audience(claims, &self.expected_audience)?;
        check_issuer(&claims.issuer, &self.expected_issuer)
    }
}

fn required(
    value: Option<i64>,
    is_required: bool,
    name: &'static str,
) -> Result<Option<i64>, AuthError> {
    match value {
        None if is_required => Err(AuthError::MissingRequiredClaim(name)),
        other => Ok(other),
    }
}

/// `Expired` iff present and `now > exp`.
pub fn check_expires_at(expires_at: Option<i64>, now: i64) -> Result<(), AuthError> {
    match expires_at {
        Some(exp) if now > exp => Err(AuthError::Expired),
        _ => Ok(()),
    }
}

/// `IssuedInFuture` iff present and `iat > now + leeway`.
pub fn check_issued_at(issued_at: Option<i64>, now: i64) -> Result<(), AuthError> {
    match issued_at {
        Some(iat) if iat > now.saturating_add(ISSUED_AT_LEEWAY_SECS) => {
            Err(AuthError::IssuedInFuture)
        }
        _ => Ok(()),
    }
}

/// `NotYetValid` iff present and `now < nbf`.
pub fn check_not_before(not_before: Option<i64>, now: i64) -> Result<(), AuthError> {
    match not_before {
        Some(nbf) if now < nbf => Err(AuthError::NotYetValid),
        _ => Ok(()),
    }
}

/// Expected audience must be a member of the claim's audience set.
pub fn check_audience(claims: &Claims, expected: &str) -> Result<(), AuthError> {
    // Every member is compared; no early exit on a match.
    let found = claims
        .audience
        .iter()
        .fold(Choice::from(0), |found, candidate| {
            found | candidate.as_bytes().ct_eq(expected.as_bytes())
        });

    if bool::from(found) {
        Ok(())
    } else {
        Err(AuthError::AudienceMismatch)
    }
}

pub fn check_issuer(issuer: &str, expected: &str) -> Result<(), AuthError> {
    if bool::from(issuer.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        Err(AuthError::IssuerMismatch)
    }
}
