// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signature verification with a single allow-listed algorithm.
//!
//! The header's `alg` is checked before the key is looked up or any signature
//! byte is decoded, so `none`, `HS256` and every other value are rejected even
//! when the named key exists.

use base64ct::{Base64UrlUnpadded, Encoding};

use super::error::AuthError;
use super::jwks::KeyRing;
use super::token::Header;

/// The only accepted signing algorithm: RSASSA-PKCS1-v1_5 with SHA-256.
pub const ALLOWED_ALGORITHM: &str = "RS256";

/// Verify `signature_segment` over `signing_input` with the key named by
/// `header.kid`.
pub fn verify_signature(
    header: &Header,
    signing_input: &str,
    signature_segment: &str,
    key_ring: &KeyRing,
) -> Result<(), AuthError> {
    if header.alg != ALLOWED_ALGORITHM {
        return Err(AuthError::UnsupportedAlgorithm);
    }

    let key = key_ring.resolve(&header.kid)?;

    // Non-canonical encodings are rejected so that every segment byte counts.
    let signature = Base64UrlUnpadded::decode_vec(signature_segment)
        .ok()
        .filter(|bytes| Base64UrlUnpadded::encode_string(bytes) == signature_segment)
        .ok_or(AuthError::InvalidSignature)?;

    key.verify(signing_input.as_bytes(), &signature)
}
