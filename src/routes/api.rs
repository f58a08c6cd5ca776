// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes: tag catalog, suggestions, message generation and history.

use crate::error::{AppError, Result};
use crate::middleware::auth::{optional_auth, require_auth, AuthUser, MaybeUser};
use crate::models::{GeneratedMessage, Plan, SalesTag, UserProfile, FREE_LIMIT};
use crate::services::generator::FALLBACK_NICHE_SUGGESTION;
use crate::services::GenerationOutcome;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationError};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const DEFAULT_HISTORY_LIMIT: u32 = 20;
const MAX_HISTORY_LIMIT: u32 = 100;

/// API routes.
///
/// `/api/messages` carries different auth per method: anyone may submit (the
/// workflow answers anonymous users with `needs_authentication`), only a
/// signed-in user may read history.
pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let require = middleware::from_fn_with_state(state.clone(), require_auth);
    let optional = middleware::from_fn_with_state(state, optional_auth);

    Router::new()
        .route("/api/sales-tags", get(list_sales_tags))
        .route("/api/suggestions", post(suggest_niche_details))
        .route(
            "/api/messages",
            get(list_messages)
                .route_layer(require.clone())
                .merge(post(create_message).route_layer(optional)),
        )
        .route("/api/me", get(get_me).route_layer(require))
}

// ─── Sales Tags ──────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct SalesTagResponse {
    pub slug: SalesTag,
    pub label: String,
    pub is_default: bool,
}

async fn list_sales_tags() -> Json<Vec<SalesTagResponse>> {
    let default = SalesTag::default();
    Json(
        SalesTag::ALL
            .into_iter()
            .map(|tag| SalesTagResponse {
                slug: tag,
                label: tag.label(),
                is_default: tag == default,
            })
            .collect(),
    )
}

// ─── Suggestions ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    #[serde(default)]
    pub sales_tag: SalesTag,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionResponse {
    pub suggested_details: String,
    /// True when the model failed and the stock example was returned.
    pub fallback: bool,
}

/// Suggest niche details for a tag. Never fails on model errors.
async fn suggest_niche_details(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SuggestionRequest>, JsonRejection>,
) -> Result<Json<SuggestionResponse>> {
    let Json(request) = payload?;

    let response = match state.generator.suggest_niche_details(request.sales_tag).await {
        Ok(text) => SuggestionResponse {
            suggested_details: text,
            fallback: false,
        },
        Err(e) => {
            tracing::warn!(sales_tag = %request.sales_tag, error = %e, "Suggestion failed, using fallback");
            SuggestionResponse {
                suggested_details: FALLBACK_NICHE_SUGGESTION.to_string(),
                fallback: true,
            }
        }
    };

    Ok(Json(response))
}

// ─── Message Generation ──────────────────────────────────────

fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be empty".into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMessageRequest {
    /// Defaults to the greeting tag when omitted.
    #[serde(default)]
    pub sales_tag: Option<SalesTag>,
    #[validate(custom(function = "not_blank"))]
    pub niche_details: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub sales_tag: SalesTag,
    pub text: String,
    pub created_at: String,
}

impl From<GeneratedMessage> for MessageResponse {
    fn from(message: GeneratedMessage) -> Self {
        Self {
            id: message.id,
            sales_tag: message.sales_tag,
            text: message.text,
            created_at: message.created_at,
        }
    }
}

/// Body returned for every non-success outcome.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeErrorResponse {
    /// `needs_authentication`, `quota_exceeded` or `generation_failed`
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub message_count: Option<u64>,
}

impl IntoResponse for GenerationOutcome {
    fn into_response(self) -> Response {
        let message = self.user_message().unwrap_or_default();
        let (status, error, limit, message_count) = match self {
            GenerationOutcome::Generated(generated) => {
                return (StatusCode::CREATED, Json(MessageResponse::from(generated)))
                    .into_response();
            }
            GenerationOutcome::NeedsAuthentication => {
                (StatusCode::UNAUTHORIZED, "needs_authentication", None, None)
            }
            GenerationOutcome::QuotaExceeded {
                message_count,
                limit,
            } => (
                StatusCode::PAYMENT_REQUIRED,
                "quota_exceeded",
                Some(limit),
                Some(message_count),
            ),
            GenerationOutcome::GenerationFailed { .. } => {
                (StatusCode::BAD_GATEWAY, "generation_failed", None, None)
            }
        };

        let body = OutcomeErrorResponse {
            error: error.to_string(),
            message,
            limit,
            message_count,
        };
        (status, Json(body)).into_response()
    }
}

/// Submit a generation request.
async fn create_message(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<MaybeUser>,
    payload: std::result::Result<Json<GenerateMessageRequest>, JsonRejection>,
) -> Result<GenerationOutcome> {
    let Json(request) = payload?;
    request.validate()?;

    // Runs to completion even if the client disconnects mid-generation.
    let workflow = state.workflow.clone();
    let outcome = tokio::spawn(async move {
        workflow
            .request_generation(user.0.as_ref(), request.sales_tag, &request.niche_details)
            .await
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("generation task failed: {e}")))?;

    Ok(outcome)
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MessagesResponse {
    pub messages: Vec<MessageResponse>,
}

/// Get the user's message history, most recent first.
async fn list_messages(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(identity)): Extension<AuthUser>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<MessagesResponse>> {
    let limit = match query.limit {
        None => DEFAULT_HISTORY_LIMIT,
        Some(0) => return Err(AppError::BadRequest("limit must be at least 1".to_string())),
        Some(n) => n.min(MAX_HISTORY_LIMIT),
    };

    let messages = state.workflow.history(&identity.user_id, limit).await?;

    Ok(Json(MessagesResponse {
        messages: messages.into_iter().map(MessageResponse::from).collect(),
    }))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub plan: Plan,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub message_count: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub free_limit: u64,
    /// `null` for pro accounts
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub remaining: Option<u64>,
}

impl From<UserProfile> for UserResponse {
    fn from(profile: UserProfile) -> Self {
        let remaining = profile.remaining();
        Self {
            user_id: profile.user_id,
            email: profile.email,
            display_name: profile.display_name,
            plan: profile.plan,
            message_count: profile.message_count,
            free_limit: FREE_LIMIT,
            remaining,
        }
    }
}

/// Get current user profile, provisioning it on first sign-in.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(identity)): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state.workflow.ensure_profile(&identity).await?;
    Ok(Json(profile.into()))
}
