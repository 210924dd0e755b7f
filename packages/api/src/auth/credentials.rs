//! # Credential store: registration, login and password change
//!
//! Wraps a [`UserStore`] with the rules for local accounts:
//!
//! - emails are trimmed and lowercased before every lookup and insert, so
//!   `" A@X.com "` and `"a@x.com"` are the same account;
//! - the plaintext password is hashed **before** the store sees anything
//!   ([`CredentialStore::register`] and [`CredentialStore::change_password`] are
//!   the only two places that hash);
//! - [`CredentialStore::verify`] answers "no such user" and "wrong password" with
//!   the same [`ApiError::Unauthorized`], and runs a hash verification in both
//!   cases so the two paths cost about the same.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use store::{NewUser, User, UserStore};
use uuid::Uuid;

use super::password::PasswordHasher;
use crate::error::{ApiError, FieldError};

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern is valid")
});

/// Trim and lowercase an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_password(field: &'static str, password: &str, errors: &mut Vec<FieldError>) {
    if password.trim().is_empty() {
        errors.push(FieldError::new(field, "Password is required"));
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            field,
            format!("Password must be at least {} characters long", MIN_PASSWORD_LEN),
        ));
    }
}

/// Validated registration input.
#[derive(Debug)]
struct Registration {
    name: String,
    email: String,
}

fn validate_registration(
    name: &str,
    email: &str,
    password: &str,
) -> Result<Registration, ApiError> {
    let name = name.trim();
    let email = normalize_email(email);
    let mut errors = Vec::new();

    if name.is_empty() {
        errors.push(FieldError::new("name", "Name is required"));
    } else if name.chars().count() < MIN_NAME_LEN {
        errors.push(FieldError::new(
            "name",
            format!("Name must be at least {} characters long", MIN_NAME_LEN),
        ));
    }

    if email.is_empty() {
        errors.push(FieldError::new("email", "Email is required"));
    } else if !EMAIL_RE.is_match(&email) {
        errors.push(FieldError::new("email", "Please provide a valid email address"));
    }

    check_password("password", password, &mut errors);

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    Ok(Registration {
        name: name.to_string(),
        email,
    })
}

/// Local account management on top of a [`UserStore`].
pub struct CredentialStore {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    /// Verified against when the email is unknown.
    dummy_hash: String,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserStore>, hasher: PasswordHasher) -> Result<Self, ApiError> {
        let dummy_hash = hasher.hash("medvault-dummy-password")?;
        Ok(Self {
            users,
            hasher,
            dummy_hash,
        })
    }

    /// Create a new account. Fails with `Validation` or `Conflict`.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let registration = validate_registration(name, email, password)?;

        if self
            .users
            .find_user_by_email(&registration.email)
            .await?
            .is_some()
        {
            return Err(ApiError::Conflict("User already exists".to_string()));
        }

        let secret_hash = self.hasher.hash(password)?;
        // The store re-checks uniqueness atomically; a racing insert maps to Conflict.
        let user = self
            .users
            .insert_user(NewUser {
                name: registration.name,
                email: registration.email,
                secret_hash,
            })
            .await?;

        tracing::info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Check an email + password pair.
    pub async fn verify(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::Validation(vec![FieldError::new(
                if email.is_empty() { "email" } else { "password" },
                "Email and password are required",
            )]));
        }

        let user = self.users.find_user_by_email(&email).await?;
        let hash = user
            .as_ref()
            .map(|u| u.secret_hash.as_str())
            .unwrap_or(self.dummy_hash.as_str());
        let valid = self.hasher.verify(password, hash)?;

        match user {
            Some(user) if valid => Ok(user),
            _ => {
                tracing::warn!("Failed login attempt");
                Err(ApiError::invalid_credentials())
            }
        }
    }

    /// Replace a user's password after re-checking the current one.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        check_password("newPassword", new_password, &mut errors);
        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        let Some(user) = self.users.find_user_by_id(user_id).await? else {
            return Err(ApiError::NotFound("User not found".to_string()));
        };
        if !self.hasher.verify(current_password, &user.secret_hash)? {
            return Err(ApiError::invalid_credentials());
        }

        let secret_hash = self.hasher.hash(new_password)?;
        if !self.users.update_secret_hash(user_id, secret_hash).await? {
            return Err(ApiError::NotFound("User not found".to_string()));
        }
        tracing::info!("Password changed for user {}", user_id);
        Ok(())
    }

    pub async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, ApiError> {
        Ok(self.users.find_user_by_id(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::test_hasher;
    use store::MemoryStore;

    fn credentials() -> (CredentialStore, MemoryStore) {
        let store = MemoryStore::new();
        let creds = CredentialStore::new(Arc::new(store.clone()), test_hasher()).unwrap();
        (creds, store)
    }

    #[tokio::test]
    async fn test_register_hashes_and_normalizes() {
        let (creds, store) = credentials();
        let user = creds.register(" Ann ", " A@X.com ", "secret1").await.unwrap();

        assert_eq!(user.name, "Ann");
        assert_eq!(user.email, "a@x.com");
        assert_ne!(user.secret_hash, "secret1");

        let stored = store.find_user_by_email("a@x.com").await.unwrap().unwrap();
        assert_ne!(stored.secret_hash, "secret1");
        assert!(!stored.secret_hash.contains("secret1"));
    }

    #[tokio::test]
    async fn test_register_then_verify() {
        let (creds, _) = credentials();
        let user = creds.register("Ann", "a@x.com", "secret1").await.unwrap();

        let verified = creds.verify("A@x.com", "secret1").await.unwrap();
        assert_eq!(verified.id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_normalized_email_conflicts() {
        let (creds, _) = credentials();
        creds.register("Ann", "a@x.com", "secret1").await.unwrap();

        let err = creds
            .register("Annie", "  A@X.COM", "another1")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_validation_reports_each_field() {
        let (creds, _) = credentials();
        let err = creds.register("A", "not-an-email", "123").await.unwrap_err();

        let ApiError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "email", "password"]);
    }

    #[tokio::test]
    async fn test_verify_does_not_distinguish_unknown_user() {
        let (creds, _) = credentials();
        creds.register("Ann", "a@x.com", "secret1").await.unwrap();

        let wrong_password = creds.verify("a@x.com", "wrong-pass").await.unwrap_err();
        let unknown_user = creds.verify("b@x.com", "secret1").await.unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert!(matches!(wrong_password, ApiError::Unauthorized(ref m) if m == "Invalid credentials"));
    }

    #[tokio::test]
    async fn test_change_password() {
        let (creds, _) = credentials();
        let user = creds.register("Ann", "a@x.com", "secret1").await.unwrap();

        let err = creds
            .change_password(user.id, "wrong-pass", "secret2")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));

        creds
            .change_password(user.id, "secret1", "secret2")
            .await
            .unwrap();
        assert!(creds.verify("a@x.com", "secret1").await.is_err());
        assert!(creds.verify("a@x.com", "secret2").await.is_ok());
    }

    #[tokio::test]
    async fn test_change_password_validates_new_password() {
        let (creds, _) = credentials();
        let user = creds.register("Ann", "a@x.com", "secret1").await.unwrap();

        let err = creds.change_password(user.id, "secret1", "abc").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
