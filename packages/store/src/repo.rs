//! # Persistence traits: the document-store boundary
//!
//! The `api` crate never talks to a database directly. Every read and write goes
//! through the two traits below, so the same handlers run against the in-memory
//! [`crate::MemoryStore`] (tests, local runs without a database) or the PostgreSQL
//! store in `api::db`.
//!
//! Each method is a single-document operation. Implementations must make
//! [`UserStore::insert_user`] atomic with respect to the email uniqueness check;
//! nothing else relies on multi-step consistency.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{NewRecord, NewUser, PublicRecord, Record, RecordPatch, User};

/// Storage for user identities.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Fails with [`StoreError::Duplicate`] if the email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Look up a user by normalized email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Replace the stored hash. Returns `false` if the user does not exist.
    async fn update_secret_hash(&self, id: Uuid, secret_hash: String)
        -> Result<bool, StoreError>;
}

/// Storage for records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_record(&self, record: NewRecord) -> Result<Record, StoreError>;

    async fn find_record(&self, id: Uuid) -> Result<Option<Record>, StoreError>;

    /// All records owned by `owner_id`, newest first.
    async fn list_records_by_owner(&self, owner_id: Uuid) -> Result<Vec<Record>, StoreError>;

    /// All records with `is_public == true`, newest first, joined with their owner.
    async fn list_public_records(&self) -> Result<Vec<PublicRecord>, StoreError>;

    /// Apply a partial update. Returns `None` if the record does not exist.
    async fn update_record(
        &self,
        id: Uuid,
        patch: RecordPatch,
    ) -> Result<Option<Record>, StoreError>;

    /// Delete a record. Returns `false` if it did not exist.
    async fn delete_record(&self, id: Uuid) -> Result<bool, StoreError>;
}
