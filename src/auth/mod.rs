// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token authentication for the API.
//!
//! ## Auth Flow
//!
//! 1. At startup the key-set document is fetched once and turned into an
//!    immutable [`KeyRing`]
//! 2. Clients send `Authorization: Bearer <token>`
//! 3. The [`AuthenticationGate`] runs the [`TokenValidationPipeline`]:
//!    - split the compact token and decode its header
//!    - decode claims (scalar or array `aud`)
//!    - check `alg` is RS256, resolve `kid`, verify the signature
//!    - validate `exp`, `iat`, `nbf`, `aud`, `iss`
//! 4. The resulting [`Identity`] is placed in request extensions and read by
//!    handlers through the [`Auth`] extractor
//!
//! ## Security
//!
//! - Only RS256 is accepted; the check runs before any key lookup
//! - Issuer and audience comparisons are constant-time
//! - Every failure is a `401` with the same body; causes are logged only
//! - Unknown `kid`s fail; there is no refetch on the request path

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod middleware;
pub mod pipeline;
pub mod signature;
pub mod token;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

pub use claims::{decode_claims, Claims, Identity};
pub use error::AuthError;
pub use extractor::Auth;
pub use jwks::{KeyRing, KeyRingError};
pub use middleware::{authenticate, AuthenticationGate, PublicRoutes};
pub use pipeline::TokenValidationPipeline;
pub use validator::{ClaimsValidator, ValidationPolicy};
