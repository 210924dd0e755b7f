//! # API crate: the MedVault backend core
//!
//! Everything between the HTTP socket and the persistence traits in the `store`
//! crate lives here. The `medvault` binary only loads settings, picks a store and
//! wraps [`routes::router`] in cross-cutting layers.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | Argon2id password hashing, the credential store (register / verify / change password), HS256 bearer tokens, and the request guard |
//! | [`records`] | Input normalization for records, the ownership policy, and the record service applying it |
//! | [`db`] | PostgreSQL implementation of the store traits (sqlx) and embedded migrations |
//! | [`uploads`] | Writes photo uploads to disk and hands back a `/uploads/...` reference |
//! | [`rate_limit`] | Per-IP fixed-window limiter middleware |
//! | [`security`] | Hardening response headers |
//! | [`error`] | The [`ApiError`] taxonomy and its HTTP mapping |
//! | [`models`] | Client-safe projections (`UserInfo`, `AuthResponse`) |
//! | [`routes`] | The axum router and handlers |
//!
//! ## Request flow
//!
//! credentials → [`auth::CredentialStore::verify`] → [`auth::TokenService::issue`] →
//! client sends the token → [`auth::require_identity`] resolves an
//! [`auth::Identity`] → [`records::RecordService`] applies the ownership policy.

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod records;
pub mod routes;
pub mod security;
pub mod uploads;

pub use error::{ApiError, FieldError};
pub use models::{AuthResponse, UserInfo};
pub use routes::{router, AppState};
