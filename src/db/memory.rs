//! In-memory profile store for tests and offline development.

use crate::db::ProfileStore;
use crate::error::AppError;
use crate::models::{GeneratedMessage, Plan, UserProfile};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Process-local [`ProfileStore`].
///
/// The usage increment happens under the profile's shard lock, which gives the
/// same no-lost-update guarantee as Firestore's server-side transform.
#[derive(Default)]
pub struct MemoryStore {
    profiles: DashMap<String, UserProfile>,
    messages: DashMap<String, Vec<GeneratedMessage>>,
    operations: AtomicU64,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a profile directly (test seeding).
    pub fn insert_profile(&self, profile: UserProfile) {
        self.profiles.insert(profile.user_id.clone(), profile);
    }

    /// Number of store operations served so far.
    pub fn operation_count(&self) -> u64 {
        self.operations.load(Ordering::SeqCst)
    }

    /// Make every subsequent write fail with `AppError::Database`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn begin_op(&self) {
        self.operations.fetch_add(1, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database("Write rejected (injected failure)".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        self.begin_op();
        Ok(self.profiles.get(user_id).map(|p| p.value().clone()))
    }

    async fn create_profile(&self, profile: &UserProfile) -> Result<UserProfile, AppError> {
        self.begin_op();
        self.check_writable()?;
        Ok(self
            .profiles
            .entry(profile.user_id.clone())
            .or_insert_with(|| profile.clone())
            .value()
            .clone())
    }

    async fn record_generation(
        &self,
        user_id: &str,
        message: &GeneratedMessage,
    ) -> Result<(), AppError> {
        self.begin_op();
        self.check_writable()?;

        let mut profile = self
            .profiles
            .get_mut(user_id)
            .ok_or_else(|| AppError::Database(format!("No profile document for {user_id}")))?;
        profile.message_count += 1;
        self.messages
            .entry(user_id.to_string())
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn set_plan(&self, user_id: &str, plan: Plan) -> Result<(), AppError> {
        self.begin_op();
        self.check_writable()?;

        let mut profile = self
            .profiles
            .get_mut(user_id)
            .ok_or_else(|| AppError::Database(format!("No profile document for {user_id}")))?;
        profile.plan = plan;
        profile.updated_at = crate::time_utils::now_rfc3339();
        Ok(())
    }

    async fn find_profiles_by_email(
        &self,
        email: &str,
        limit: u32,
    ) -> Result<Vec<UserProfile>, AppError> {
        self.begin_op();
        Ok(self
            .profiles
            .iter()
            .filter(|p| p.email.as_deref() == Some(email))
            .take(limit as usize)
            .map(|p| p.value().clone())
            .collect())
    }

    async fn list_messages(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<GeneratedMessage>, AppError> {
        self.begin_op();
        let mut history: Vec<GeneratedMessage> = self
            .messages
            .get(user_id)
            .map(|msgs| msgs.iter().rev().cloned().collect())
            .unwrap_or_default();
        // Stable: entries created in the same millisecond stay newest-first.
        history.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        history.truncate(limit as usize);
        Ok(history)
    }
}
