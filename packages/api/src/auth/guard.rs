//! # Access control guard
//!
//! Middleware that turns a bearer token into an [`Identity`] on the request.
//!
//! ```text
//! NoToken      -> 401 "Access denied. No token provided."
//! TokenPresent -> validate -> Authenticated(identity) | 401 "Invalid or expired token"
//! ```
//!
//! The guard only resolves *who* is calling. Whether that caller may touch a given
//! record is decided later by [`crate::records::policy`].
//!
//! Tokens are read from `Authorization: Bearer <token>` or `x-auth-token: <token>`.
//! A well-formed `Authorization` header wins when both are present.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use super::token::TokenService;
use crate::error::ApiError;

/// Secondary token header.
pub const X_AUTH_TOKEN: &str = "x-auth-token";

/// The caller resolved from a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
}

/// Pick the token from the request headers, if any.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    bearer.or_else(|| {
        headers
            .get(X_AUTH_TOKEN)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    })
}

/// Resolve the identity for a set of headers.
pub fn authenticate(tokens: &TokenService, headers: &HeaderMap) -> Result<Identity, ApiError> {
    let Some(token) = extract_token(headers) else {
        return Err(ApiError::Unauthorized(
            "Access denied. No token provided.".to_string(),
        ));
    };

    match tokens.validate(token) {
        Ok(subject) => Ok(Identity {
            id: subject.id,
            email: subject.email,
        }),
        Err(e) => {
            tracing::warn!("JWT auth error: {}", e);
            Err(e.into())
        }
    }
}

/// Axum middleware: reject unauthenticated requests, otherwise attach the
/// [`Identity`] to the request extensions.
pub async fn require_identity(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&tokens, request.headers()) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Identity>().cloned().ok_or_else(|| {
            ApiError::Unauthorized("Access denied. No token provided.".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::TokenConfig;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_extract_bearer() {
        let map = headers(&[("authorization", "Bearer abc")]);
        assert_eq!(extract_token(&map), Some("abc"));
    }

    #[test]
    fn test_extract_x_auth_token() {
        let map = headers(&[("x-auth-token", "xyz")]);
        assert_eq!(extract_token(&map), Some("xyz"));
    }

    #[test]
    fn test_authorization_takes_precedence() {
        let map = headers(&[("authorization", "Bearer abc"), ("x-auth-token", "xyz")]);
        assert_eq!(extract_token(&map), Some("abc"));
    }

    #[test]
    fn test_malformed_authorization_falls_back() {
        let map = headers(&[("authorization", "Basic dXNlcjpwYXNz"), ("x-auth-token", "xyz")]);
        assert_eq!(extract_token(&map), Some("xyz"));

        let map = headers(&[("authorization", "Bearer "), ("x-auth-token", "xyz")]);
        assert_eq!(extract_token(&map), Some("xyz"));
    }

    #[test]
    fn test_no_token() {
        assert_eq!(extract_token(&HeaderMap::new()), None);
        let map = headers(&[("authorization", "Basic dXNlcjpwYXNz")]);
        assert_eq!(extract_token(&map), None);
    }

    #[test]
    fn test_authenticate() {
        let tokens = TokenService::new(TokenConfig::new("guard-secret")).unwrap();
        let id = Uuid::new_v4();
        let token = tokens.issue(id, "a@x.com").unwrap();

        let identity =
            authenticate(&tokens, &headers(&[("x-auth-token", token.as_str())])).unwrap();
        assert_eq!(identity.id, id);
        assert_eq!(identity.email, "a@x.com");

        let err = authenticate(&tokens, &HeaderMap::new()).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m.starts_with("Access denied")));

        let err = authenticate(&tokens, &headers(&[("authorization", "Bearer junk")])).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Invalid or expired token"));
    }
}
