// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Compact token splitting and header decoding.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::Deserialize;

use super::error::AuthError;

/// Maximum accepted compact token length in bytes (8KB).
///
/// Checked before any base64 or JSON work.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Decoded first segment of a token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Header {
    /// Signing algorithm named by the issuer
    pub alg: String,
    /// Signing key identifier. Empty when the header omits it.
    #[serde(default)]
    pub kid: String,
}

/// Borrowed view of the three segments of a compact token.
///
/// The split is on the first two `.` separators only.
#[derive(Debug, Clone, Copy)]
pub struct CompactToken<'a> {
    raw: &'a str,
    header: &'a str,
    payload: &'a str,
    signature: &'a str,
}

impl<'a> CompactToken<'a> {
    /// Split a compact token into header, payload and signature segments.
    pub fn parse(raw: &'a str) -> Result<Self, AuthError> {
        if raw.len() > MAX_TOKEN_SIZE_BYTES {
            tracing::debug!(
                target: "auth.token",
                token_size = raw.len(),
                max_size = MAX_TOKEN_SIZE_BYTES,
                "Token rejected: size exceeds maximum allowed"
            );
            return Err(AuthError::MalformedHeader);
        }

        // Any further '.' stays in the signature segment and fails its
        // canonical base64url check as InvalidSignature.
        let mut segments = raw.splitn(3, '.');
        let (Some(header), Some(payload), Some(signature)) =
            (segments.next(), segments.next(), segments.next())
        else {
            return Err(AuthError::MalformedHeader);
        };

        if header.is_empty() || payload.is_empty() {
            return Err(AuthError::MalformedHeader);
        }

        Ok(Self {
            raw,
            header,
            payload,
            signature,
        })
    }

    /// Decode the header segment.
    pub fn header(&self) -> Result<Header, AuthError> {
        let bytes = Base64UrlUnpadded::decode_vec(self.header).map_err(|e| {
            tracing::debug!(target: "auth.token", error = %e, "Failed to decode header base64");
            AuthError::MalformedHeader
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::debug!(target: "auth.token", error = %e, "Failed to parse header JSON");
            AuthError::MalformedHeader
        })
    }

    /// Decode the payload segment to raw JSON bytes.
    pub fn payload_bytes(&self) -> Result<Vec<u8>, AuthError> {
        Base64UrlUnpadded::decode_vec(self.payload).map_err(|e| {
            tracing::debug!(target: "auth.token", error = %e, "Failed to decode payload base64");
            AuthError::MalformedClaims
        })
    }

    /// The `header.payload` bytes the signature was computed over.
    pub fn signing_input(&self) -> &'a str {
        // header and payload are non-empty prefixes of raw joined by one '.'
        &self.raw[..self.header.len() + 1 + self.payload.len()]
    }

    /// The still-encoded signature segment.
    pub fn signature(&self) -> &'a str {
        self.signature
    }
}
