//! # User projections safe to send to clients
//!
//! [`store::User`] carries the Argon2 `secret_hash` and is never serialised. Every
//! response that mentions a user goes through [`UserInfo`], which keeps only the id,
//! display name and email.
//!
//! [`AuthResponse`] is the body returned by register and login: the user plus a
//! freshly issued bearer token.

use serde::{Deserialize, Serialize};
use store::User;

/// User information safe to send to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Body of a successful register or login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthResponse {
    pub user: UserInfo,
    pub token: String,
}

/// A bare `{message}` body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
