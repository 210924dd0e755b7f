//! # Domain models for users and records
//!
//! Defines the data structures persisted by a [`crate::UserStore`] /
//! [`crate::RecordStore`] backend and returned to the `api` crate.
//!
//! ## Types
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`User`] | A registered identity. Holds the Argon2 `secret_hash` and is therefore **not** `Serialize`; the `api` crate projects it into a client-safe `UserInfo` before it leaves the server. |
//! | [`NewUser`] | Insert payload for a user. Carries an already-derived hash, never a plaintext password. |
//! | [`Record`] | A personal entry owned by exactly one user. Serialises as camelCase JSON. |
//! | [`NewRecord`] | Insert payload for a record; `owner_id` is filled in from the authenticated identity. |
//! | [`RecordPatch`] | Partial update. `None` fields keep their stored value. |
//! | [`OwnerSummary`] / [`PublicRecord`] | A record joined with the owner's display fields for the public listing. |
//!
//! Timestamps (`created_at`, `updated_at`) are always assigned by the store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Full user row. Never sent to clients as-is.
#[derive(Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Trimmed, lowercased login key.
    pub email: String,
    /// Argon2 PHC string.
    pub secret_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("secret_hash", &"<redacted>")
            .finish()
    }
}

/// Insert payload for a user.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub secret_hash: String,
}

/// A personal record entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub photo_ref: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a record.
#[derive(Clone, Debug)]
pub struct NewRecord {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub photo_ref: Option<String>,
    pub is_public: bool,
}

/// Partial update for a record. Only `Some` fields overwrite.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub photo_ref: Option<String>,
    pub is_public: Option<bool>,
}

impl RecordPatch {
    /// True when the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch to a record in place. Does not touch timestamps.
    pub fn apply_to(self, record: &mut Record) {
        if let Some(title) = self.title {
            record.title = title;
        }
        if let Some(description) = self.description {
            record.description = description;
        }
        if let Some(date) = self.date {
            record.date = date;
        }
        if let Some(photo_ref) = self.photo_ref {
            record.photo_ref = Some(photo_ref);
        }
        if let Some(is_public) = self.is_public {
            record.is_public = is_public;
        }
    }
}

/// Owner display fields attached to public records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OwnerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// A public record together with its owner's display fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PublicRecord {
    #[serde(flatten)]
    pub record: Record,
    pub owner: OwnerSummary,
}
