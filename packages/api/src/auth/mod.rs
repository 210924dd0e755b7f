//! Authentication: password hashing, local credentials, bearer tokens and the
//! request guard.

mod credentials;
mod guard;
mod password;
mod token;

pub use credentials::{normalize_email, CredentialStore, MIN_NAME_LEN, MIN_PASSWORD_LEN};
pub use guard::{authenticate, extract_token, require_identity, Identity, X_AUTH_TOKEN};
pub use password::{HashConfig, PasswordError, PasswordHasher};
pub use token::{
    parse_lifetime, Claims, TokenConfig, TokenConfigError, TokenError, TokenService,
    TokenSubject, DEFAULT_TOKEN_LIFETIME,
};
