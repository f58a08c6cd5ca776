//! Quota-gated message generation.
//!
//! One submission runs `check login → load/provision profile → check quota →
//! generate → record`, and always resolves to a [`GenerationOutcome`]. The
//! quota check strictly precedes the generation call, which strictly precedes
//! the increment, so failed generations are never charged.
//!
//! The limit is soft: two concurrent submissions from the same account can both
//! pass the check before either is recorded. Each success still increments
//! atomically, so the counter never loses an update (4 → 6, not 5).

use crate::db::ProfileStore;
use crate::error::AppError;
use crate::models::{GeneratedMessage, SalesTag, UserProfile, FREE_LIMIT};
use crate::services::generator::MessageGenerator;
use crate::services::identity::Identity;
use crate::time_utils::now_rfc3339;
use std::sync::Arc;

/// Shown for any upstream or storage failure.
pub const GENERATION_FAILED_MESSAGE: &str =
    "Ocorreu um problema com a IA. Por favor, tente novamente.";
pub const NEEDS_AUTHENTICATION_MESSAGE: &str = "Faça login para gerar sua mensagem.";

/// Terminal state of one submission.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// No signed-in user. The caller prompts for login and resubmits.
    NeedsAuthentication,
    /// Free tier used up; only an upgrade unblocks it.
    QuotaExceeded { message_count: u64, limit: u64 },
    /// Nothing was charged; the user may retry.
    GenerationFailed { reason: String },
    Generated(GeneratedMessage),
}

impl GenerationOutcome {
    /// Message for the end user, `None` on success.
    pub fn user_message(&self) -> Option<String> {
        match self {
            GenerationOutcome::NeedsAuthentication => Some(NEEDS_AUTHENTICATION_MESSAGE.to_string()),
            GenerationOutcome::QuotaExceeded { limit, .. } => Some(format!(
                "Você atingiu o limite de {limit} mensagens gratuitas. \
                 Assine o plano Pro para continuar gerando."
            )),
            GenerationOutcome::GenerationFailed { reason } => Some(reason.clone()),
            GenerationOutcome::Generated(_) => None,
        }
    }
}

/// Orchestrates generation requests against injected store and generator.
#[derive(Clone)]
pub struct GenerationWorkflow {
    store: Arc<dyn ProfileStore>,
    generator: Arc<dyn MessageGenerator>,
}

impl GenerationWorkflow {
    pub fn new(store: Arc<dyn ProfileStore>, generator: Arc<dyn MessageGenerator>) -> Self {
        Self { store, generator }
    }

    /// Load the user's profile, creating a free one on first use.
    pub async fn ensure_profile(&self, identity: &Identity) -> Result<UserProfile, AppError> {
        if let Some(profile) = self.store.get_profile(&identity.user_id).await? {
            return Ok(profile);
        }

        let profile = UserProfile::new_free(
            identity.user_id.clone(),
            identity.email.clone(),
            identity.display_name.clone(),
            &now_rfc3339(),
        );
        self.store.create_profile(&profile).await
    }

    /// Run one generation submission.
    ///
    /// `niche_details` is expected to be non-empty (validated at the API edge).
    pub async fn request_generation(
        &self,
        user: Option<&Identity>,
        sales_tag: Option<SalesTag>,
        niche_details: &str,
    ) -> GenerationOutcome {
        let Some(identity) = user else {
            return GenerationOutcome::NeedsAuthentication;
        };
        let sales_tag = sales_tag.unwrap_or_default();
        let user_id = identity.user_id.as_str();

        let profile = match self.ensure_profile(identity).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::error!(user_id, error = %e, "Failed to load profile");
                return failed();
            }
        };

        if profile.quota_exhausted() {
            tracing::info!(
                user_id,
                message_count = profile.message_count,
                "Free quota exhausted"
            );
            return GenerationOutcome::QuotaExceeded {
                message_count: profile.message_count,
                limit: FREE_LIMIT,
            };
        }

        let text = match self.generator.generate(sales_tag, niche_details).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(user_id, sales_tag = %sales_tag, error = %e, "Generation failed");
                return failed();
            }
        };

        let message = GeneratedMessage::new(user_id, sales_tag, text, now_rfc3339());

        if let Err(e) = self.store.record_generation(user_id, &message).await {
            // The increment and history write are one unit; the text is dropped
            // rather than handed out uncharged.
            tracing::error!(user_id, error = %e, "Failed to record generation");
            return failed();
        }

        tracing::info!(
            user_id,
            sales_tag = %sales_tag,
            plan = ?profile.plan,
            message_count = profile.message_count + 1,
            "Message generated"
        );

        GenerationOutcome::Generated(message)
    }

    /// The user's generated messages, most recent first.
    pub async fn history(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<GeneratedMessage>, AppError> {
        self.store.list_messages(user_id, limit).await
    }
}

fn failed() -> GenerationOutcome {
    GenerationOutcome::GenerationFailed {
        reason: GENERATION_FAILED_MESSAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::Plan;
    use crate::services::generator::GenerationError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Barrier;

    /// Generator that echoes its input, or fails when told to.
    #[derive(Default)]
    struct FakeGenerator {
        fail: AtomicBool,
        calls: AtomicUsize,
        barrier: Option<Barrier>,
    }

    #[async_trait]
    impl MessageGenerator for FakeGenerator {
        async fn generate(
            &self,
            sales_tag: SalesTag,
            niche_details: &str,
        ) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(barrier) = &self.barrier {
                barrier.wait().await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(GenerationError::Status {
                    status: 503,
                    body: "overloaded".to_string(),
                });
            }
            Ok(format!("[{}] {}", sales_tag.slug(), niche_details))
        }

        async fn suggest_niche_details(
            &self,
            _sales_tag: SalesTag,
        ) -> Result<String, GenerationError> {
            Ok("velas".to_string())
        }
    }

    fn identity(user_id: &str) -> Identity {
        Identity {
            user_id: user_id.to_string(),
            email: Some(format!("{user_id}@example.com")),
            display_name: None,
            sign_in_provider: Some("google.com".to_string()),
        }
    }

    fn seed(store: &MemoryStore, user_id: &str, plan: Plan, count: u64) {
        let mut profile = UserProfile::new_free(user_id, None, None, "2026-01-01T00:00:00.000Z");
        profile.plan = plan;
        profile.message_count = count;
        store.insert_profile(profile);
    }

    fn setup(generator: FakeGenerator) -> (GenerationWorkflow, Arc<MemoryStore>, Arc<FakeGenerator>) {
        let store = Arc::new(MemoryStore::new());
        let generator = Arc::new(generator);
        let workflow = GenerationWorkflow::new(store.clone(), generator.clone());
        (workflow, store, generator)
    }

    async fn count(store: &MemoryStore, user_id: &str) -> u64 {
        store
            .get_profile(user_id)
            .await
            .unwrap()
            .unwrap()
            .message_count
    }

    #[tokio::test]
    async fn test_unauthenticated_touches_nothing() {
        let (workflow, store, generator) = setup(FakeGenerator::default());

        let outcome = workflow
            .request_generation(None, Some(SalesTag::Promotion), "velas")
            .await;

        assert_eq!(outcome, GenerationOutcome::NeedsAuthentication);
        assert_eq!(store.operation_count(), 0);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_first_use_provisions_free_profile() {
        let (workflow, store, _) = setup(FakeGenerator::default());
        let user = identity("new-user");

        let outcome = workflow
            .request_generation(Some(&user), None, "I sell handmade candles")
            .await;

        let GenerationOutcome::Generated(message) = outcome else {
            panic!("expected Generated, got {outcome:?}");
        };
        assert_eq!(message.sales_tag, SalesTag::Greeting);
        assert_eq!(message.text, "[greeting] I sell handmade candles");

        let profile = store.get_profile("new-user").await.unwrap().unwrap();
        assert_eq!(profile.plan, Plan::Free);
        assert_eq!(profile.message_count, 1);
        assert_eq!(profile.email.as_deref(), Some("new-user@example.com"));
    }

    #[tokio::test]
    async fn test_quota_exceeded_at_limit() {
        let (workflow, store, generator) = setup(FakeGenerator::default());
        seed(&store, "u1", Plan::Free, FREE_LIMIT);

        let outcome = workflow
            .request_generation(Some(&identity("u1")), Some(SalesTag::Thanks), "velas")
            .await;

        assert_eq!(
            outcome,
            GenerationOutcome::QuotaExceeded {
                message_count: 5,
                limit: 5
            }
        );
        assert_eq!(count(&store, "u1").await, 5);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert!(outcome.user_message().unwrap().contains("limite de 5"));
    }

    #[tokio::test]
    async fn test_last_free_generation_allowed() {
        let (workflow, store, _) = setup(FakeGenerator::default());
        seed(&store, "u1", Plan::Free, FREE_LIMIT - 1);

        let outcome = workflow
            .request_generation(Some(&identity("u1")), None, "velas")
            .await;

        assert!(matches!(outcome, GenerationOutcome::Generated(_)));
        assert_eq!(count(&store, "u1").await, FREE_LIMIT);
    }

    #[tokio::test]
    async fn test_pro_never_quota_exceeded() {
        let (workflow, store, _) = setup(FakeGenerator::default());
        seed(&store, "pro", Plan::Pro, 9999);

        for _ in 0..3 {
            let outcome = workflow
                .request_generation(Some(&identity("pro")), None, "velas")
                .await;
            assert!(matches!(outcome, GenerationOutcome::Generated(_)));
        }
        assert_eq!(count(&store, "pro").await, 10002);
    }

    #[tokio::test]
    async fn test_failed_generation_not_charged() {
        let (workflow, store, generator) = setup(FakeGenerator::default());
        seed(&store, "u1", Plan::Free, 2);
        generator.fail.store(true, Ordering::SeqCst);

        let outcome = workflow
            .request_generation(Some(&identity("u1")), None, "velas")
            .await;

        assert_eq!(
            outcome,
            GenerationOutcome::GenerationFailed {
                reason: GENERATION_FAILED_MESSAGE.to_string()
            }
        );
        assert_eq!(count(&store, "u1").await, 2);
        assert!(workflow.history("u1", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bookkeeping_failure_discards_message() {
        let (workflow, store, _) = setup(FakeGenerator::default());
        seed(&store, "u1", Plan::Free, 1);
        store.set_fail_writes(true);

        let outcome = workflow
            .request_generation(Some(&identity("u1")), None, "velas")
            .await;

        assert!(matches!(outcome, GenerationOutcome::GenerationFailed { .. }));
        assert_eq!(count(&store, "u1").await, 1);
    }

    #[tokio::test]
    async fn test_store_unavailable_is_generation_failed() {
        let generator = Arc::new(FakeGenerator::default());
        let workflow = GenerationWorkflow::new(
            Arc::new(crate::db::FirestoreDb::new_mock()),
            generator.clone(),
        );

        let outcome = workflow
            .request_generation(Some(&identity("u1")), None, "velas")
            .await;

        assert!(matches!(outcome, GenerationOutcome::GenerationFailed { .. }));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_increments_exactly_once() {
        let (workflow, store, _) = setup(FakeGenerator::default());
        seed(&store, "u1", Plan::Free, 0);

        for expected in 1..=3 {
            workflow
                .request_generation(Some(&identity("u1")), None, "velas")
                .await;
            assert_eq!(count(&store, "u1").await, expected);
        }
        assert_eq!(workflow.history("u1", 10).await.unwrap().len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_submissions_both_counted() {
        // Both submissions pass the check at 4 before either records.
        let (workflow, store, _) = setup(FakeGenerator {
            barrier: Some(Barrier::new(2)),
            ..Default::default()
        });
        seed(&store, "u1", Plan::Free, 4);

        let user = identity("u1");
        let (a, b) = tokio::join!(
            workflow.request_generation(Some(&user), None, "aba 1"),
            workflow.request_generation(Some(&user), None, "aba 2"),
        );

        assert!(matches!(a, GenerationOutcome::Generated(_)));
        assert!(matches!(b, GenerationOutcome::Generated(_)));
        assert_eq!(count(&store, "u1").await, 6);

        let outcome = workflow
            .request_generation(Some(&user), None, "aba 3")
            .await;
        assert!(matches!(outcome, GenerationOutcome::QuotaExceeded { .. }));
    }

    #[tokio::test]
    async fn test_history_newest_first() {
        let (workflow, _, _) = setup(FakeGenerator::default());
        let user = identity("u1");

        for details in ["um", "dois", "três"] {
            workflow
                .request_generation(Some(&user), Some(SalesTag::FollowUp), details)
                .await;
        }

        let texts: Vec<String> = workflow
            .history("u1", 10)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(
            texts,
            ["[follow-up] três", "[follow-up] dois", "[follow-up] um"]
        );
    }
}
