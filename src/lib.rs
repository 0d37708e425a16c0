// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer Gate - token authentication for HTTP APIs
//!
//! Validates RS256 bearer tokens against a key set fetched once at startup
//! and publishes the caller's identity to downstream handlers.
//!
//! ## Modules
//!
//! - `api` - HTTP router and handlers (Axum)
//! - `auth` - Token validation pipeline and authentication gate
//! - `config` - Environment configuration
//! - `logging` - Tracing subscriber setup

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod state;
