// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! TextoPronto API Server
//!
//! Generates WhatsApp sales messages with Gemini for signed-in users, within
//! the free-tier quota or without limit on the pro plan.

use std::sync::Arc;
use textopronto::{
    config::{Config, StoreBackend},
    db::{FirestoreDb, MemoryStore, ProfileStore},
    services::{FirebaseTokenVerifier, GeminiClient},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting TextoPronto API");

    if config.webhook_secret.is_none() {
        tracing::warn!("WEBHOOK_SECRET not set; payment webhooks will be rejected");
    }

    let store: Arc<dyn ProfileStore> = match config.store_backend {
        StoreBackend::Firestore => Arc::new(
            FirestoreDb::new(&config.gcp_project_id)
                .await
                .expect("Failed to connect to Firestore"),
        ),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory profile store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let generator = Arc::new(
        GeminiClient::new(config.gemini_api_key.clone(), config.gemini_model.clone())
            .expect("Failed to initialize Gemini client"),
    );
    tracing::info!(model = %config.gemini_model, "Gemini client initialized");

    let identity = Arc::new(
        FirebaseTokenVerifier::new(&config.gcp_project_id)
            .expect("Failed to initialize ID token verifier"),
    );

    let state = Arc::new(AppState::new(config.clone(), store, generator, identity));

    let app = textopronto::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("textopronto=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
