// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Payment provider webhook: upgrades a paying customer to the pro plan.

use crate::services::billing::{upgrade_plan_by_email, UpgradeError};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Webhook routes. The unversioned path is kept for already-configured providers.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/webhooks/v1/payment", post(handle_payment))
        .route("/api/webhooks/payment", post(handle_payment))
}

/// Payment confirmation payload, contract v1.
#[derive(Debug, Deserialize)]
struct PaymentEvent {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn reject(status: StatusCode, error: &str) -> Response {
    let body = WebhookResponse {
        success: false,
        user_id: None,
        error: Some(error.to_string()),
    };
    (status, Json(body)).into_response()
}

/// Check `Authorization: Bearer <secret>` without leaking timing.
///
/// An unset secret rejects everything.
fn is_authorized(secret: Option<&str>, headers: &HeaderMap) -> bool {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        return false;
    };
    let Some(provided) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        return false;
    };

    let expected = format!("Bearer {secret}");
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Handle a payment confirmation.
///
/// The body is only parsed after the caller is authenticated, so an
/// unauthenticated request never reaches the store.
async fn handle_payment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !is_authorized(state.config.webhook_secret.as_deref(), &headers) {
        tracing::warn!("Payment webhook rejected: bad or missing authorization");
        return reject(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    let email = serde_json::from_slice::<PaymentEvent>(&body)
        .ok()
        .and_then(|event| event.email)
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty());
    let Some(email) = email else {
        tracing::warn!("Payment webhook missing email");
        return reject(StatusCode::BAD_REQUEST, "Email is required");
    };

    match upgrade_plan_by_email(state.store.as_ref(), &email).await {
        Ok(user_id) => {
            tracing::info!(user_id = %user_id, "Payment webhook processed");
            let body = WebhookResponse {
                success: true,
                user_id: Some(user_id),
                error: None,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(UpgradeError::ProfileNotFound) => {
            tracing::warn!("Payment webhook for unknown customer");
            tracing::debug!(email = %email, "Unmatched payment email");
            reject(StatusCode::NOT_FOUND, "User not found")
        }
        Err(e @ UpgradeError::AmbiguousEmail(_)) => {
            tracing::error!(error = %e, "Payment webhook matched several profiles");
            reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
        Err(UpgradeError::Store(e)) => {
            tracing::error!(error = %e, "Payment webhook failed");
            reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_is_authorized() {
        assert!(is_authorized(Some("abc123"), &auth("Bearer abc123")));
        assert!(!is_authorized(Some("abc123"), &auth("Bearer wrong")));
        assert!(!is_authorized(Some("abc123"), &auth("abc123")));
        assert!(!is_authorized(Some("abc123"), &auth("Bearer abc1234")));
        assert!(!is_authorized(Some("abc123"), &HeaderMap::new()));
    }

    #[test]
    fn test_unset_secret_rejects_everything() {
        assert!(!is_authorized(None, &auth("Bearer ")));
        assert!(!is_authorized(Some(""), &auth("Bearer ")));
    }
}
