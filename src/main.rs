// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Referral Service API Server
//!
//! Phone-number authentication with one-time codes and invite-code referrals.

use referral_service::{
    config::{Config, StoreBackend},
    db::{FirestoreDb, MemoryStore, UserStore},
    services::{CodeSender, LogCodeSender, ReferralService, TwilioCodeSender},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting referral service");

    let store: Arc<dyn UserStore> = match config.store_backend {
        StoreBackend::Firestore => Arc::new(
            FirestoreDb::new(&config.gcp_project_id)
                .await
                .expect("Failed to connect to Firestore"),
        ),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory user store; records are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let sender: Arc<dyn CodeSender> = match &config.twilio {
        Some(twilio) => {
            tracing::info!("Auth codes will be delivered via Twilio SMS");
            Arc::new(TwilioCodeSender::new(twilio))
        }
        None => {
            tracing::info!(
                delay_ms = config.dispatch_delay.as_millis() as u64,
                "Auth codes will be logged (no SMS provider configured)"
            );
            Arc::new(LogCodeSender::new(config.dispatch_delay))
        }
    };

    let referral_service = ReferralService::new(store, sender, config.referral_policy);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        referral_service,
    });

    // Build router
    let app = referral_service::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("referral_service=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
