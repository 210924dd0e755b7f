//! Store error types.

use thiserror::Error;

/// Errors surfaced by a [`crate::UserStore`] or [`crate::RecordStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint was violated (e.g. a second user with the same email).
    #[error("duplicate {0}")]
    Duplicate(&'static str),

    /// The backend could not be reached or its state is unusable.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}
