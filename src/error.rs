// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .iter()
                    .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| "invalid value".to_string());
                format!("{field}: {message}")
            })
            .collect();
        fields.sort();
        AppError::BadRequest(fields.join("; "))
    }
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Form {
        #[validate(length(min = 1, message = "must not be empty"))]
        name: String,
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_internal_details_not_leaked() {
        let response =
            AppError::Database("connection reset by peer at 10.0.0.3".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error"], "database_error");
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn test_status_per_variant() {
        let cases = [
            (
                AppError::BadRequest("limit".to_string()),
                StatusCode::BAD_REQUEST,
                "bad_request",
            ),
            (
                AppError::Database("down".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
            ),
            (
                AppError::Internal(anyhow::anyhow!("task panicked")),
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
            ),
        ];

        for (err, status, code) in cases {
            // Exhaustive so a new variant has to be added here.
            match &err {
                AppError::BadRequest(_) | AppError::Database(_) | AppError::Internal(_) => {}
            }
            let response = err.into_response();
            assert_eq!(response.status(), status);
            assert_eq!(body_json(response).await["error"], code);
        }
    }

    #[tokio::test]
    async fn test_validation_errors_become_bad_request() {
        let err: AppError = Form {
            name: String::new(),
        }
        .validate()
        .unwrap_err()
        .into();

        match &err {
            AppError::BadRequest(msg) => assert_eq!(msg, "name: must not be empty"),
            other => panic!("unexpected error: {other:?}"),
        }

        let json = body_json(err.into_response()).await;
        assert_eq!(json["error"], "bad_request");
        assert_eq!(json["details"], "name: must not be empty");
    }
}
