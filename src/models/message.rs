//! Generated message history entries.

use crate::models::SalesTag;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A message produced by one successful generation.
///
/// Stored at: `messages/{id}`, queried by `user_id` ordered by `created_at` descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GeneratedMessage {
    pub id: String,
    pub user_id: String,
    pub sales_tag: SalesTag,
    pub text: String,
    /// RFC 3339, UTC
    pub created_at: String,
}

impl GeneratedMessage {
    pub fn new(user_id: &str, sales_tag: SalesTag, text: String, created_at: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            sales_tag,
            text,
            created_at,
        }
    }
}
