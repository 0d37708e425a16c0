// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! The gate runs as a route layer, so requests for unknown paths fall through
//! to the router's 404 fallback without touching authentication. For matched
//! routes it:
//!
//! 1. Lets allow-listed public routes through untouched
//! 2. Extracts the token from `Authorization: Bearer <token>`
//! 3. Runs the [`TokenValidationPipeline`]
//! 4. Inserts the resulting [`Identity`] into request extensions
//!
//! Every failure answers `401` with the same body; the classified cause is
//! only logged.
//!
//! ```rust,ignore
//! let gate = Arc::new(AuthenticationGate::new(pipeline, PublicRoutes::default()));
//! let app = Router::new()
//!     .route("/v1/users/me", get(get_current_user))
//!     .route_layer(axum::middleware::from_fn_with_state(gate, authenticate));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{AuthError, Identity, TokenValidationPipeline};

/// Routes that bypass authentication.
#[derive(Debug, Clone)]
pub struct PublicRoutes {
    exact: Vec<String>,
    prefixes: Vec<String>,
}

impl PublicRoutes {
    /// An empty allow-list: every matched route requires a bearer token.
    pub fn none() -> Self {
        Self {
            exact: Vec::new(),
            prefixes: Vec::new(),
        }
    }

    /// Allow a single exact path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.exact.push(path.into());
        self
    }

    /// Allow every path starting with `prefix`. Include the trailing `/`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into());
        self
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.exact.iter().any(|p| p == path)
            || self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

impl Default for PublicRoutes {
    /// Health probes and API docs.
    fn default() -> Self {
        Self::none()
            .with_path("/health")
            .with_path("/health/live")
            .with_path("/health/ready")
            .with_path("/docs")
            .with_path("/api-doc/openapi.json")
            .with_prefix("/docs/")
    }
}

/// HTTP-layer adapter around the validation pipeline.
#[derive(Debug, Clone)]
pub struct AuthenticationGate {
    pipeline: Arc<TokenValidationPipeline>,
    public_routes: PublicRoutes,
}

impl AuthenticationGate {
    pub fn new(pipeline: Arc<TokenValidationPipeline>, public_routes: PublicRoutes) -> Self {
        Self {
            pipeline,
            public_routes,
        }
    }

    /// Authenticate a request's headers.
    ///
    /// Returns `Ok(None)` for public routes.
    pub fn authenticate(
        &self,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<Option<Identity>, AuthError> {
        if self.public_routes.is_public(path) {
            return Ok(None);
        }

        let token = bearer_token(headers)?;
        self.pipeline.validate(token).map(Some)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::Unauthorized)?
        .to_str()
        .map_err(|_| AuthError::Unauthorized)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::Unauthorized)?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(AuthError::Unauthorized);
    }

    let token = token.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthError::Unauthorized);
    }

    Ok(token)
}

/// Authentication middleware function.
pub async fn authenticate(
    State(gate): State<Arc<AuthenticationGate>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();

    match gate.authenticate(&path, request.headers()) {
        Ok(Some(identity)) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Ok(None) => next.run(request).await,
        Err(err) => {
            if err.is_suspicious() {
                tracing::warn!(target: "auth.gate", path = %path, error_code = err.error_code(), "Request rejected");
            } else {
                tracing::debug!(target: "auth.gate", path = %path, error_code = err.error_code(), "Request rejected");
            }
            err.into_response()
        }
    }
}
