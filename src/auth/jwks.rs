// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing-key ring built from a JWKS document.
//!
//! ## Lifecycle
//!
//! - The key-set document is fetched once at startup ([`KeyRing::fetch`])
//! - Every entry's first `x5c` certificate must parse to an RSA key, or the
//!   whole build fails; a partial ring is never returned
//! - The ring is immutable afterwards and shared behind an `Arc`
//! - An unknown `kid` is a per-request [`AuthError::UnknownKeyId`], never a
//!   refetch

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use base64ct::{Base64, Encoding};
use ring::signature::{self, UnparsedPublicKey};
use serde::Deserialize;
use thiserror::Error;
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;
use x509_parser::public_key::PublicKey;

use super::error::AuthError;

/// Default timeout for the startup key-set fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Smallest RSA modulus accepted into the ring.
const MIN_RSA_KEY_BITS: usize = 2048;

/// Errors raised while building the key ring at startup.
#[derive(Debug, Error)]
pub enum KeyRingError {
    #[error("failed to fetch key set: {0}")]
    Fetch(String),

    #[error("key set document is invalid: {0}")]
    Document(String),

    #[error("key `{kid}` has no x5c certificate chain")]
    EmptyChain { kid: String },

    #[error("key `{kid}` certificate could not be parsed: {reason}")]
    Certificate { kid: String, reason: String },

    #[error("key `{kid}` is not an RSA key")]
    UnsupportedKey { kid: String },

    #[error("key `{kid}` is {bits} bits, below the 2048-bit minimum")]
    WeakKey { kid: String, bits: usize },
}

#[derive(Deserialize)]
struct JwksDocument {
    keys: Vec<JwksEntry>,
}

#[derive(Deserialize)]
struct JwksEntry {
    kid: String,
    #[serde(default)]
    x5c: Vec<String>,
}

/// RSA public key usable only with RS256 verification.
#[derive(Clone)]
pub struct RsaPublicKey {
    key: UnparsedPublicKey<Vec<u8>>,
    bits: usize,
}

impl RsaPublicKey {
    /// Verify an RSASSA-PKCS1-v1_5 SHA-256 signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), AuthError> {
        self.key
            .verify(message, signature)
            .map_err(|_| AuthError::InvalidSignature)
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.bits
    }
}

impl fmt::Debug for RsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaPublicKey")
            .field("bits", &self.bits)
            .finish_non_exhaustive()
    }
}

/// Immutable map from key id to verification key.
#[derive(Debug, Clone, Default)]
pub struct KeyRing {
    keys: HashMap<String, RsaPublicKey>,
}

impl KeyRing {
    /// Build a ring from raw JWKS document bytes.
    pub fn build(document: &[u8]) -> Result<Self, KeyRingError> {
        let document: JwksDocument = serde_json::from_slice(document)
            .map_err(|e| KeyRingError::Document(e.to_string()))?;

        let mut keys = HashMap::with_capacity(document.keys.len());
        for entry in document.keys {
            let key = public_key_from_chain(&entry)?;
            if keys.insert(entry.kid.clone(), key).is_some() {
                tracing::warn!(target: "auth.jwks", kid = %entry.kid, "Duplicate kid in key set, keeping last entry");
            }
        }

        Ok(Self { keys })
    }

    /// Fetch the key-set document and build the ring.
    ///
    /// Called once during startup; the client should carry a timeout.
    pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<Self, KeyRingError> {
        tracing::debug!(target: "auth.jwks", url = %url, "Fetching key set");

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| KeyRingError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(KeyRingError::Fetch(format!(
                "HTTP {} from key set endpoint",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| KeyRingError::Fetch(e.to_string()))?;

        let ring = Self::build(&body)?;
        tracing::info!(target: "auth.jwks", key_count = ring.len(), "Key ring built");
        Ok(ring)
    }

    /// Look up the key for `kid`.
    pub fn resolve(&self, kid: &str) -> Result<&RsaPublicKey, AuthError> {
        self.keys.get(kid).ok_or(AuthError::UnknownKeyId)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key ids in the ring, sorted.
    pub fn key_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.keys.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Extract the RSA key from the first certificate of an entry's chain.
fn public_key_from_chain(entry: &JwksEntry) -> Result<RsaPublicKey, KeyRingError> {
    let first = entry.x5c.first().ok_or_else(|| KeyRingError::EmptyChain {
        kid: entry.kid.clone(),
    })?;

    let der = Base64::decode_vec(first).map_err(|e| KeyRingError::Certificate {
        kid: entry.kid.clone(),
        reason: format!("invalid base64: {e}"),
    })?;

    let (_, cert) = X509Certificate::from_der(&der).map_err(|e| KeyRingError::Certificate {
        kid: entry.kid.clone(),
        reason: e.to_string(),
    })?;

    let spki = cert.public_key();
    let bits = match spki.parsed() {
        Ok(PublicKey::RSA(rsa)) => rsa.key_size(),
        Ok(_) => {
            return Err(KeyRingError::UnsupportedKey {
                kid: entry.kid.clone(),
            })
        }
        Err(e) => {
            return Err(KeyRingError::Certificate {
                kid: entry.kid.clone(),
                reason: e.to_string(),
            })
        }
    };

    if bits < MIN_RSA_KEY_BITS {
        return Err(KeyRingError::WeakKey {
            kid: entry.kid.clone(),
            bits,
        });
    }

    // subjectPublicKey of an rsaEncryption SPKI is the PKCS#1 RSAPublicKey DER
    let pkcs1 = spki.subject_public_key.data.to_vec();

    Ok(RsaPublicKey {
        key: UnparsedPublicKey::new(&signature::RSA_PKCS1_2048_8192_SHA256, pkcs1),
        bits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_support::{
        cert_der, jwks_document, EC_P256_CERT_PEM, PRIMARY_CERT_PEM, PRIMARY_KID,
        SECONDARY_CERT_PEM, SECONDARY_KID, WEAK_RSA_CERT_PEM,
    };
    use base64::{engine::general_purpose::STANDARD, Engine};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn build_indexes_every_key() {
        let doc = jwks_document(&[
            (PRIMARY_KID, PRIMARY_CERT_PEM),
            (SECONDARY_KID, SECONDARY_CERT_PEM),
        ]);
        let ring = KeyRing::build(doc.as_bytes()).unwrap();

        assert_eq!(ring.len(), 2);
        assert_eq!(ring.key_ids(), vec![PRIMARY_KID, SECONDARY_KID]);
        assert_eq!(ring.resolve(PRIMARY_KID).unwrap().bits(), 2048);
    }

    #[test]
    fn resolve_unknown_kid_is_classified() {
        let doc = jwks_document(&[(PRIMARY_KID, PRIMARY_CERT_PEM)]);
        let ring = KeyRing::build(doc.as_bytes()).unwrap();

        assert_eq!(
            ring.resolve("rotated-away").unwrap_err(),
            AuthError::UnknownKeyId
        );
        assert_eq!(ring.resolve("").unwrap_err(), AuthError::UnknownKeyId);
    }

    #[test]
    fn build_ignores_extra_jwk_members_and_later_certs() {
        let cert = STANDARD.encode(cert_der(PRIMARY_CERT_PEM));
        let doc = serde_json::json!({
            "keys": [{
                "kty": "RSA",
                "use": "sig",
                "alg": "RS256",
                "kid": PRIMARY_KID,
                "n": "ignored",
                "e": "AQAB",
                "x5c": [cert, "not-even-base64!"],
                "x5t": "ignored"
            }]
        });
        let ring = KeyRing::build(doc.to_string().as_bytes()).unwrap();
        assert!(ring.resolve(PRIMARY_KID).is_ok());
    }

    #[test]
    fn build_fails_fast_on_any_bad_entry() {
        let good = STANDARD.encode(cert_der(PRIMARY_CERT_PEM));
        let doc = serde_json::json!({
            "keys": [
                {"kid": PRIMARY_KID, "x5c": [good]},
                {"kid": "broken", "x5c": [STANDARD.encode(b"not a certificate")]}
            ]
        });
        let err = KeyRing::build(doc.to_string().as_bytes()).unwrap_err();
        assert!(
            matches!(&err, KeyRingError::Certificate { kid, .. } if kid == "broken"),
            "got {err:?}"
        );
    }

    #[test]
    fn build_rejects_missing_chain() {
        let doc = r#"{"keys":[{"kid":"k","kty":"RSA"}]}"#;
        assert!(matches!(
            KeyRing::build(doc.as_bytes()),
            Err(KeyRingError::EmptyChain { .. })
        ));
    }

    #[test]
    fn build_rejects_weak_rsa_key() {
        let doc = jwks_document(&[(PRIMARY_KID, PRIMARY_CERT_PEM), ("weak", WEAK_RSA_CERT_PEM)]);
        let err = KeyRing::build(doc.as_bytes()).unwrap_err();
        assert!(
            matches!(&err, KeyRingError::WeakKey { kid, bits: 1024 } if kid == "weak"),
            "got {err:?}"
        );
    }

    #[test]
    fn build_rejects_non_rsa_key() {
        let doc = jwks_document(&[("ec", EC_P256_CERT_PEM)]);
        let err = KeyRing::build(doc.as_bytes()).unwrap_err();
        assert!(
            matches!(&err, KeyRingError::UnsupportedKey { kid } if kid == "ec"),
            "got {err:?}"
        );
    }

    #[test]
    fn build_rejects_bad_base64_certificate() {
        let doc = r#"{"keys":[{"kid":"k","x5c":["%%%"]}]}"#;
        assert!(matches!(
            KeyRing::build(doc.as_bytes()),
            Err(KeyRingError::Certificate { .. })
        ));
    }

    #[test]
    fn build_rejects_invalid_document() {
        assert!(matches!(
            KeyRing::build(b"not json"),
            Err(KeyRingError::Document(_))
        ));
        assert!(matches!(
            KeyRing::build(br#"{"nokeys":[]}"#),
            Err(KeyRingError::Document(_))
        ));
        assert!(matches!(
            KeyRing::build(br#"{"keys":[{"x5c":[]}]}"#),
            Err(KeyRingError::Document(_))
        ));
    }

    #[test]
    fn empty_key_set_builds_empty_ring() {
        let ring = KeyRing::build(br#"{"keys":[]}"#).unwrap();
        assert!(ring.is_empty());
    }

    #[tokio::test]
    async fn fetch_builds_ring_from_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(jwks_document(&[(PRIMARY_KID, PRIMARY_CERT_PEM)])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/.well-known/jwks.json", server.uri());
        let ring = KeyRing::fetch(&client, &url).await.unwrap();

        assert_eq!(ring.key_ids(), vec![PRIMARY_KID]);
    }

    #[tokio::test]
    async fn fetch_reports_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let err = KeyRing::fetch(&client, &server.uri()).await.unwrap_err();
        assert!(matches!(err, KeyRingError::Fetch(msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn fetch_reports_invalid_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let err = KeyRing::fetch(&client, &server.uri()).await.unwrap_err();
        assert!(matches!(err, KeyRingError::Document(_)));
    }
}
