// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{env, error::Error, sync::Arc};

use bearer_gate::{
    api::router,
    auth::{ClaimsValidator, KeyRing},
    config::{AppConfig, LOG_FORMAT_ENV},
    logging::{self, LogFormat},
    state::AppState,
};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Logging comes up before the rest of the config so config warnings are seen.
    let log_format: LogFormat = env::var(LOG_FORMAT_ENV)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();
    logging::init(log_format);

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    info!(
        issuer = %config.issuer,
        audience = %config.audience,
        jwks_url = %config.jwks_url,
        "Starting bearer gate"
    );

    let client = reqwest::Client::builder()
        .timeout(config.jwks_fetch_timeout)
        .build()?;

    let key_ring = match KeyRing::fetch(&client, config.jwks_url.as_str()).await {
        Ok(ring) => ring,
        Err(e) => {
            error!("Failed to load key set: {}", e);
            return Err(e.into());
        }
    };
    if key_ring.is_empty() {
        tracing::warn!("Key set is empty; every token will be rejected");
    }

    let validator = ClaimsValidator::new(&config.issuer, &config.audience, config.policy);
    let app = router(AppState::new(Arc::new(key_ring), validator));

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("Listening on {} (docs at /docs)", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => {
                error!("Failed to listen for SIGINT: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
