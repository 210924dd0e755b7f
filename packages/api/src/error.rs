//! # API error taxonomy
//!
//! Every handler returns `Result<_, ApiError>`. The variants are the only outcomes a
//! client can observe; anything a handler cannot classify is turned into
//! [`ApiError::Internal`], logged server-side and reported with a generic message.
//!
//! | Variant | Status | Body |
//! |---------|--------|------|
//! | `Validation` | 400 | `{message: "Validation failed", errors: [{field, message}]}` |
//! | `Unauthorized` | 401 | `{message}` (deliberately generic) |
//! | `Forbidden` | 403 | `{message: "Not authorized"}` |
//! | `NotFound` | 404 | `{message}` |
//! | `Conflict` | 409 | `{message}` |
//! | `Internal` | 500 | `{message: "Server error"}` |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use store::StoreError;
use thiserror::Error;

use crate::auth::{PasswordError, TokenError};

/// A single field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden")]
    Forbidden,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized("Invalid credentials".to_string())
    }

    pub fn record_not_found() -> Self {
        ApiError::NotFound("Record not found".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(errors) => json!({
                "message": "Validation failed",
                "errors": errors,
            }),
            ApiError::Conflict(message)
            | ApiError::Unauthorized(message)
            | ApiError::NotFound(message) => json!({ "message": message }),
            ApiError::Forbidden => json!({ "message": "Not authorized" }),
            ApiError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                json!({ "message": "Server error" })
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate("email") => ApiError::Conflict("User already exists".to_string()),
            StoreError::Duplicate(what) => ApiError::Conflict(format!("Duplicate {}", what)),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Signing(detail) => ApiError::Internal(detail),
            _ => ApiError::Unauthorized("Invalid or expired token".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let err = ApiError::Validation(vec![FieldError::new("title", "Title is required")]);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["errors"][0]["field"], "title");
        assert_eq!(body["errors"][0]["message"], "Title is required");
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response = ApiError::Internal("connection refused".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["message"], "Server error");
    }

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(
            ApiError::from(StoreError::Duplicate("email")),
            ApiError::Conflict(ref m) if m == "User already exists"
        ));
        assert!(matches!(
            ApiError::from(StoreError::Backend("boom".to_string())),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn test_token_error_mapping() {
        assert_eq!(
            ApiError::from(TokenError::Expired).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(TokenError::Signing("key".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
