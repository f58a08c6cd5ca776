// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod message;
pub mod profile;
pub mod sales_tag;

pub use message::GeneratedMessage;
pub use profile::{Plan, UserProfile, FREE_LIMIT};
pub use sales_tag::SalesTag;
