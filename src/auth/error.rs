// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Every stage of token validation returns one of these classified variants so
//! that logs can tell an expired token from a forged one. The HTTP response is
//! the same `401` for all of them.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Authentication error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Token is not three segments, is oversized, or its header does not decode
    #[error("token header is malformed")]
    MalformedHeader,
    /// Token payload does not decode into a claim set
    #[error("token claims are malformed")]
    MalformedClaims,
    /// Header names a key that is not in the key ring
    #[error("token signing key is unknown")]
    UnknownKeyId,
    /// Header names an algorithm other than the allow-listed one
    #[error("token signing algorithm is not supported")]
    UnsupportedAlgorithm,
    /// Signature does not verify against the named key
    #[error("token signature is invalid")]
    InvalidSignature,
    /// `exp` is in the past
    #[error("token has expired")]
    Expired,
    /// `iat` is beyond the allowed clock skew
    #[error("token was issued in the future")]
    IssuedInFuture,
    /// `nbf` is in the future
    #[error("token is not yet valid")]
    NotYetValid,
    /// Expected audience is not in the token's audience set
    #[error("token audience does not match")]
    AudienceMismatch,
    /// Token issuer differs from the expected issuer
    #[error("token issuer does not match")]
    IssuerMismatch,
    /// A temporal claim the policy requires is absent
    #[error("token is missing required claim `{0}`")]
    MissingRequiredClaim(&'static str),
    /// No usable bearer credential on the request
    #[error("request is not authenticated")]
    Unauthorized,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: &'static str,
    error_code: &'static str,
}

impl AuthError {
    /// Stable identifier for logs and metrics. Never sent to the caller.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MalformedHeader => "malformed_header",
            AuthError::MalformedClaims => "malformed_claims",
            AuthError::UnknownKeyId => "unknown_key_id",
            AuthError::UnsupportedAlgorithm => "unsupported_algorithm",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::Expired => "expired",
            AuthError::IssuedInFuture => "issued_in_future",
            AuthError::NotYetValid => "not_yet_valid",
            AuthError::AudienceMismatch => "audience_mismatch",
            AuthError::IssuerMismatch => "issuer_mismatch",
            AuthError::MissingRequiredClaim(_) => "missing_required_claim",
            AuthError::Unauthorized => "unauthorized",
        }
    }

    /// Whether the failure looks like a forgery attempt rather than a stale or
    /// misrouted token.
    pub fn is_suspicious(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidSignature | AuthError::UnsupportedAlgorithm | AuthError::UnknownKeyId
        )
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(AuthErrorBody {
            error: "unauthorized",
            error_code: "unauthorized",
        });
        let mut response = (self.status_code(), body).into_response();
        response
            .headers_mut()
            .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        response
    }
}
