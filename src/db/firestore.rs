// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed profile store.
//!
//! Collections:
//! - `users/{user_id}`: plan and usage counter
//! - `messages/{id}`: generated message history (needs a composite index on
//!   `user_id` ASC, `created_at` DESC)

use crate::db::{collections, ProfileStore};
use crate::error::AppError;
use crate::models::{GeneratedMessage, Plan, UserProfile};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Field name of the usage counter, used by the increment transform.
const MESSAGE_COUNT_FIELD: &str = "message_count";

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Partial profile document written by [`FirestoreDb::set_plan`].
///
/// The update builder reads the stored document back into this type, so it
/// must deserialize from a full profile too.
#[derive(Debug, Serialize, Deserialize)]
struct PlanUpdate {
    plan: Plan,
    updated_at: String,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a disconnected client (offline mode).
    ///
    /// Every operation returns `AppError::Database`.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }
}

#[async_trait]
impl ProfileStore for FirestoreDb {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn create_profile(&self, profile: &UserProfile) -> Result<UserProfile, AppError> {
        // Insert fails if the document already exists, so two first logins
        // racing each other can't reset a counter.
        let inserted: Result<UserProfile, _> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&profile.user_id)
            .object(profile)
            .execute()
            .await;

        match inserted {
            Ok(stored) => {
                tracing::info!(user_id = %profile.user_id, "Profile created");
                Ok(stored)
            }
            Err(e) => match self.get_profile(&profile.user_id).await? {
                Some(existing) => {
                    tracing::debug!(
                        user_id = %profile.user_id,
                        "Profile created concurrently, using existing"
                    );
                    Ok(existing)
                }
                None => Err(AppError::Database(format!("Failed to create profile: {}", e))),
            },
        }
    }

    async fn record_generation(
        &self,
        user_id: &str,
        message: &GeneratedMessage,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // Server-side increment: concurrent commits each add one.
        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user_id)
            .transforms(|t| t.fields([t.field(MESSAGE_COUNT_FIELD).increment(1)]))
            .only_transform()
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add increment to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::MESSAGES)
            .document_id(&message.id)
            .object(message)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add message to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(user_id, message_id = %message.id, "Generation recorded");
        Ok(())
    }

    async fn set_plan(&self, user_id: &str, plan: Plan) -> Result<(), AppError> {
        let update = PlanUpdate {
            plan,
            updated_at: crate::time_utils::now_rfc3339(),
        };

        // Masked to the two fields so a concurrent increment survives.
        let _: PlanUpdate = self
            .get_client()?
            .fluent()
            .update()
            .fields(firestore::paths!(PlanUpdate::{plan, updated_at}))
            .in_col(collections::USERS)
            .document_id(user_id)
            .object(&update)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn find_profiles_by_email(
        &self,
        email: &str,
        limit: u32,
    ) -> Result<Vec<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("email").eq(email)]))
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_messages(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<GeneratedMessage>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::MESSAGES)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
