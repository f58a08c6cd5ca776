//! Database layer: the profile store contract and its backends.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{GeneratedMessage, Plan, UserProfile};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    /// User profiles (keyed by identity provider uid)
    pub const USERS: &str = "users";
    /// Generated message history
    pub const MESSAGES: &str = "messages";
}

/// Per-user profile and history persistence.
///
/// `message_count` is only ever changed through [`ProfileStore::record_generation`],
/// which must apply the increment atomically on the store side. A plain
/// read-increment-write loses updates when the same account submits from two
/// tabs at once.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Get a profile by user ID.
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError>;

    /// Insert a profile if none exists for `profile.user_id`.
    ///
    /// Returns the stored profile: the given one, or the existing one if another
    /// request created it first.
    async fn create_profile(&self, profile: &UserProfile) -> Result<UserProfile, AppError>;

    /// Atomically increment `message_count` by one and append `message` to the
    /// user's history. Both writes land or neither does.
    async fn record_generation(
        &self,
        user_id: &str,
        message: &GeneratedMessage,
    ) -> Result<(), AppError>;

    /// Change the plan without touching any other field.
    async fn set_plan(&self, user_id: &str, plan: Plan) -> Result<(), AppError>;

    /// Profiles whose email equals `email`, at most `limit` of them.
    async fn find_profiles_by_email(
        &self,
        email: &str,
        limit: u32,
    ) -> Result<Vec<UserProfile>, AppError>;

    /// A user's history, most recent first.
    async fn list_messages(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<GeneratedMessage>, AppError>;
}
