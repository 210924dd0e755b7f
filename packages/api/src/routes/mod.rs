//! # HTTP routes
//!
//! Builds the axum [`Router`] for the whole API. Routes are split in two groups:
//!
//! | Group | Guard | Routes |
//! |-------|-------|--------|
//! | public | none | `GET /`, `POST /api/auth/register`, `POST /api/auth/login`, `GET /api/records/public`, `GET /uploads/*` |
//! | protected | [`require_identity`] | `GET /api/auth/me`, `PUT /api/auth/password`, `POST|GET /api/records`, `GET|PUT|DELETE /api/records/{id}` |
//!
//! Cross-cutting layers (CORS, tracing, security headers, rate limiting) are added by
//! the server binary so tests can drive this router directly.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, FromRequest, Request};
use axum::middleware;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower_http::services::ServeDir;

use crate::auth::{require_identity, CredentialStore, TokenService};
use crate::error::{ApiError, FieldError};
use crate::records::RecordService;
use crate::uploads::{UploadStore, UPLOADS_PREFIX};

mod auth;
mod records;

/// Default request body limit (covers photo uploads).
pub const DEFAULT_BODY_LIMIT: usize = 5 * 1024 * 1024;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialStore>,
    pub tokens: Arc<TokenService>,
    pub records: RecordService,
    pub uploads: UploadStore,
    pub body_limit: usize,
}

/// JSON body extractor that reports malformed input as a 400 validation error.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            ApiError::Validation(vec![FieldError::new("body", e.body_text())])
        })?;
        Ok(JsonBody(value))
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "MedVault API is running" }))
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/password", put(auth::change_password))
        .route(
            "/api/records",
            post(records::create).get(records::list_owned),
        )
        .route(
            "/api/records/{id}",
            get(records::get_one)
                .put(records::update)
                .delete(records::delete),
        )
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            require_identity,
        ));

    let uploads = ServeDir::new(state.uploads.dir());
    let body_limit = state.body_limit;

    Router::new()
        .route("/", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/records/public", get(records::list_public))
        .merge(protected)
        .nest_service(UPLOADS_PREFIX, uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
