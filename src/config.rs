// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `AUTH_JWKS_URL` | Key-set document URL, fetched once at startup | Required |
//! | `AUTH_ISSUER` | Expected token issuer (`iss`) | Required |
//! | `AUTH_AUDIENCE` | Expected token audience (`aud`) | Required |
//! | `AUTH_REQUIRE_EXP` | Reject tokens without `exp` | `false` |
//! | `AUTH_REQUIRE_IAT` | Reject tokens without `iat` | `false` |
//! | `AUTH_REQUIRE_NBF` | Reject tokens without `nbf` | `false` |
//! | `JWKS_FETCH_TIMEOUT_SECS` | Timeout for the key-set fetch | `10` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::auth::jwks::DEFAULT_FETCH_TIMEOUT;
use crate::auth::ValidationPolicy;
use crate::logging::LogFormat;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWKS_URL_ENV: &str = "AUTH_JWKS_URL";
pub const ISSUER_ENV: &str = "AUTH_ISSUER";
pub const AUDIENCE_ENV: &str = "AUTH_AUDIENCE";
pub const REQUIRE_EXP_ENV: &str = "AUTH_REQUIRE_EXP";
pub const REQUIRE_IAT_ENV: &str = "AUTH_REQUIRE_IAT";
pub const REQUIRE_NBF_ENV: &str = "AUTH_REQUIRE_NBF";
pub const JWKS_FETCH_TIMEOUT_ENV: &str = "JWKS_FETCH_TIMEOUT_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub jwks_url: Url,
    pub issuer: String,
    pub audience: String,
    pub policy: ValidationPolicy,
    pub jwks_fetch_timeout: Duration,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a map (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let host = vars
            .get(HOST_ENV)
            .cloned()
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match vars.get(PORT_ENV) {
            Some(raw) => raw.parse().map_err(|e| ConfigError::InvalidValue {
                name: PORT_ENV,
                reason: format!("{e}"),
            })?,
            None => DEFAULT_PORT,
        };

        let jwks_url = parse_jwks_url(required(vars, JWKS_URL_ENV)?)?;
        let issuer = required(vars, ISSUER_ENV)?.to_string();
        let audience = required(vars, AUDIENCE_ENV)?.to_string();

        let policy = ValidationPolicy {
            require_expires_at: flag(vars, REQUIRE_EXP_ENV)?,
            require_issued_at: flag(vars, REQUIRE_IAT_ENV)?,
            require_not_before: flag(vars, REQUIRE_NBF_ENV)?,
        };

        let jwks_fetch_timeout = match vars.get(JWKS_FETCH_TIMEOUT_ENV) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: JWKS_FETCH_TIMEOUT_ENV,
                        reason: "must be a positive number of seconds".to_string(),
                    })
                }
            },
            None => DEFAULT_FETCH_TIMEOUT,
        };

        let log_format = match vars.get(LOG_FORMAT_ENV) {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::InvalidValue {
                name: LOG_FORMAT_ENV,
                reason,
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            host,
            port,
            jwks_url,
            issuer,
            audience,
            policy,
            jwks_fetch_timeout,
            log_format,
        })
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Required, non-empty variable.
fn required<'a>(
    vars: &'a HashMap<String, String>,
    name: &'static str,
) -> Result<&'a str, ConfigError> {
    match vars.get(name).map(|v| v.trim()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvVar(name)),
    }
}

fn flag(vars: &HashMap<String, String>, name: &'static str) -> Result<bool, ConfigError> {
    match vars.get(name).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("false") | Some("0") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some(other) => Err(ConfigError::InvalidValue {
            name,
            reason: format!("expected true/false, got `{other}`"),
        }),
    }
}

fn parse_jwks_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        name: JWKS_URL_ENV,
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "https" => Ok(url),
        "http" => {
            tracing::warn!(url = %url, "Key-set URL is not HTTPS");
            Ok(url)
        }
        other => Err(ConfigError::InvalidValue {
            name: JWKS_URL_ENV,
            reason: format!("unsupported scheme `{other}`"),
        }),
    }
}
