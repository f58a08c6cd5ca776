// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! TextoPronto: ready-made WhatsApp sales messages
//!
//! This crate provides the backend API that generates sales copy with an AI
//! model, gated by a free-tier quota kept on each user's Firestore profile.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::ProfileStore;
use services::{GenerationWorkflow, IdentityVerifier, MessageGenerator};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ProfileStore>,
    pub generator: Arc<dyn MessageGenerator>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub workflow: GenerationWorkflow,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn ProfileStore>,
        generator: Arc<dyn MessageGenerator>,
        identity: Arc<dyn IdentityVerifier>,
    ) -> Self {
        let workflow = GenerationWorkflow::new(store.clone(), generator.clone());
        Self {
            config,
            store,
            generator,
            identity,
            workflow,
        }
    }
}
