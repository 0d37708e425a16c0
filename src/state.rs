// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{
    AuthenticationGate, ClaimsValidator, KeyRing, PublicRoutes, TokenValidationPipeline,
};

/// Shared application state. Everything in it is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub key_ring: Arc<KeyRing>,
    pub gate: Arc<AuthenticationGate>,
}

impl AppState {
    pub fn new(key_ring: Arc<KeyRing>, validator: ClaimsValidator) -> Self {
        Self::with_public_routes(key_ring, validator, PublicRoutes::default())
    }

    pub fn with_public_routes(
        key_ring: Arc<KeyRing>,
        validator: ClaimsValidator,
        public_routes: PublicRoutes,
    ) -> Self {
        let pipeline = TokenValidationPipeline::new(Arc::clone(&key_ring), validator);
        Self {
            key_ring,
            gate: Arc::new(AuthenticationGate::new(Arc::new(pipeline), public_routes)),
        }
    }
}
