// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for auth tests: key material, JWKS documents and a token
//! minter that signs with `ring`.

use std::sync::Arc;

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine,
};
use ring::rand::SystemRandom;
use ring::signature::{RsaKeyPair, RSA_PKCS1_SHA256};
use serde_json::{json, Value};

use super::jwks::KeyRing;
use super::pipeline::TokenValidationPipeline;
use super::validator::{ClaimsValidator, ValidationPolicy};

pub const PRIMARY_KID: &str = "key-primary";
pub const SECONDARY_KID: &str = "key-secondary";
pub const PRIMARY_KEY_PEM: &str = include_str!("../../testdata/primary-key.pem");
pub const PRIMARY_CERT_PEM: &str = include_str!("../../testdata/primary-cert.pem");
pub const SECONDARY_KEY_PEM: &str = include_str!("../../testdata/secondary-key.pem");
pub const SECONDARY_CERT_PEM: &str = include_str!("../../testdata/secondary-cert.pem");
/// RSA-1024 self-signed certificate.
pub const WEAK_RSA_CERT_PEM: &str = include_str!("../../testdata/weak-rsa-cert.pem");
/// ECDSA P-256 self-signed certificate.
pub const EC_P256_CERT_PEM: &str = include_str!("../../testdata/ec-p256-cert.pem");

pub const ISSUER: &str = "https://issuer.example.com/";
pub const AUDIENCE: &str = "hive-api";
pub const NOW: i64 = 1_700_000_000;

pub fn cert_der(cert_pem: &str) -> Vec<u8> {
    pem::parse(cert_pem).unwrap().contents().to_vec()
}

/// JWKS document with one x5c entry per `(kid, cert_pem)`.
pub fn jwks_document(entries: &[(&str, &str)]) -> String {
    let keys: Vec<Value> = entries
        .iter()
        .map(|(kid, cert_pem)| {
            json!({
                "kty": "RSA",
                "use": "sig",
                "alg": "RS256",
                "kid": kid,
                "x5c": [STANDARD.encode(cert_der(cert_pem))],
            })
        })
        .collect();
    json!({ "keys": keys }).to_string()
}

/// Ring holding both fixture keys.
pub fn key_ring() -> KeyRing {
    let doc = jwks_document(&[
        (PRIMARY_KID, PRIMARY_CERT_PEM),
        (SECONDARY_KID, SECONDARY_CERT_PEM),
    ]);
    KeyRing::build(doc.as_bytes()).unwrap()
}

pub fn pipeline() -> TokenValidationPipeline {
    TokenValidationPipeline::new(
        Arc::new(key_ring()),
        ClaimsValidator::new(ISSUER, AUDIENCE, ValidationPolicy::default()),
    )
}

/// Claims that pass validation at [`NOW`].
pub fn valid_claims() -> Value {
    json!({
        "iss": ISSUER,
        "sub": "user_2abc",
        "aud": AUDIENCE,
        "exp": NOW + 3600,
        "iat": NOW - 10,
        "nbf": NOW - 10,
        "jti": "token-1",
    })
}

/// Sign `header` and `claims` with a PKCS#8 RSA key.
pub fn sign_token(header: &Value, claims: &Value, key_pem: &str) -> String {
    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    );
    let key_pair = RsaKeyPair::from_pkcs8(pem::parse(key_pem).unwrap().contents()).unwrap();
    let mut signature = vec![0; key_pair.public().modulus_len()];
    key_pair
        .sign(
            &RSA_PKCS1_SHA256,
            &SystemRandom::new(),
            signing_input.as_bytes(),
            &mut signature,
        )
        .unwrap();
    format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature))
}

/// RS256 token signed with the primary key.
pub fn mint(claims: &Value) -> String {
    sign_token(
        &json!({"alg": "RS256", "typ": "JWT", "kid": PRIMARY_KID}),
        claims,
        PRIMARY_KEY_PEM,
    )
}

/// Token with an arbitrary header and a literal signature segment.
pub fn unsigned_token(header: &Value, claims: &Value, signature: &str) -> String {
    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string()),
        signature
    )
}
