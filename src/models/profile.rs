//! User profile model: plan tier and usage counter.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Generations a `free` account may perform.
pub const FREE_LIMIT: u64 = 5;

/// Subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
}

/// User profile stored in Firestore.
///
/// Stored at: `users/{user_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Identity provider uid (also used as document ID)
    pub user_id: String,
    /// Email address (phone sign-ins usually have none)
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub plan: Plan,
    /// Successful generations, across all plans
    #[serde(default)]
    pub message_count: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl UserProfile {
    /// A freshly provisioned account: free plan, nothing used yet.
    pub fn new_free(
        user_id: impl Into<String>,
        email: Option<String>,
        display_name: Option<String>,
        now: &str,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            email,
            display_name,
            plan: Plan::Free,
            message_count: 0,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    /// Whether the free-tier quota blocks another generation.
    ///
    /// Pro accounts never consult the counter.
    pub fn quota_exhausted(&self) -> bool {
        self.plan == Plan::Free && self.message_count >= FREE_LIMIT
    }

    /// Generations left on the free tier, `None` when unlimited.
    pub fn remaining(&self) -> Option<u64> {
        match self.plan {
            Plan::Free => Some(FREE_LIMIT.saturating_sub(self.message_count)),
            Plan::Pro => None,
        }
    }
}
