// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod billing;
pub mod gemini;
pub mod generator;
pub mod identity;
pub mod workflow;

pub use billing::{upgrade_plan_by_email, UpgradeError};
pub use gemini::GeminiClient;
pub use generator::{GenerationError, MessageGenerator};
pub use identity::{FirebaseTokenVerifier, Identity, IdentityError, IdentityVerifier};
pub use workflow::{GenerationOutcome, GenerationWorkflow};
