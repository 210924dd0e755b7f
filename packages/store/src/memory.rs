use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{NewRecord, NewUser, OwnerSummary, PublicRecord, Record, RecordPatch, User};
use crate::repo::{RecordStore, UserStore};

/// In-memory store for testing and for running without a database.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
    /// Kept in insertion order so that equal timestamps still list newest first.
    records: Arc<Mutex<Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
}

/// Newest first; ties keep the most recently inserted first.
fn newest_first(records: &[Record], keep: impl Fn(&Record) -> bool) -> Vec<Record> {
    let mut out: Vec<Record> = records.iter().rev().filter(|r| keep(*r)).cloned().collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    out
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = lock(&self.users)?;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email"));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            secret_hash: user.secret_hash,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(lock(&self.users)?
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(lock(&self.users)?.get(&id).cloned())
    }

    async fn update_secret_hash(
        &self,
        id: Uuid,
        secret_hash: String,
    ) -> Result<bool, StoreError> {
        let mut users = lock(&self.users)?;
        let Some(user) = users.get_mut(&id) else {
            return Ok(false);
        };
        user.secret_hash = secret_hash;
        user.updated_at = Utc::now();
        Ok(true)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_record(&self, record: NewRecord) -> Result<Record, StoreError> {
        let now = Utc::now();
        let record = Record {
            id: Uuid::new_v4(),
            owner_id: record.owner_id,
            title: record.title,
            description: record.description,
            date: record.date,
            photo_ref: record.photo_ref,
            is_public: record.is_public,
            created_at: now,
            updated_at: now,
        };
        lock(&self.records)?.push(record.clone());
        Ok(record)
    }

    async fn find_record(&self, id: Uuid) -> Result<Option<Record>, StoreError> {
        Ok(lock(&self.records)?.iter().find(|r| r.id == id).cloned())
    }

    async fn list_records_by_owner(&self, owner_id: Uuid) -> Result<Vec<Record>, StoreError> {
        let records = lock(&self.records)?;
        Ok(newest_first(&records, |r| r.owner_id == owner_id))
    }

    async fn list_public_records(&self) -> Result<Vec<PublicRecord>, StoreError> {
        let public = {
            let records = lock(&self.records)?;
            newest_first(&records, |r| r.is_public)
        };
        let users = lock(&self.users)?;

        // Records whose owner vanished are skipped, like an inner join would.
        Ok(public
            .into_iter()
            .filter_map(|record| {
                let owner = users.get(&record.owner_id)?;
                Some(PublicRecord {
                    owner: OwnerSummary {
                        id: owner.id,
                        name: owner.name.clone(),
                        email: owner.email.clone(),
                    },
                    record,
                })
            })
            .collect())
    }

    async fn update_record(
        &self,
        id: Uuid,
        patch: RecordPatch,
    ) -> Result<Option<Record>, StoreError> {
        let mut records = lock(&self.records)?;
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        patch.apply_to(record);
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn delete_record(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut records = lock(&self.records)?;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ann".to_string(),
            email: email.to_string(),
            secret_hash: "$argon2id$stub".to_string(),
        }
    }

    fn new_record(owner_id: Uuid, title: &str, is_public: bool) -> NewRecord {
        NewRecord {
            owner_id,
            title: title.to_string(),
            description: "D".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            photo_ref: None,
            is_public,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("a@x.com")).await.unwrap();

        let by_email = store.find_user_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);

        let by_id = store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@x.com");

        assert!(store.find_user_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@x.com")).await.unwrap();

        let err = store.insert_user(new_user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("email")));
    }

    #[tokio::test]
    async fn test_update_secret_hash() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("a@x.com")).await.unwrap();

        assert!(store
            .update_secret_hash(user.id, "$argon2id$new".to_string())
            .await
            .unwrap());
        let reloaded = store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.secret_hash, "$argon2id$new");

        assert!(!store
            .update_secret_hash(Uuid::new_v4(), "x".to_string())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_list_by_owner_newest_first() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        store.insert_record(new_record(owner, "first", false)).await.unwrap();
        store.insert_record(new_record(other, "theirs", false)).await.unwrap();
        store.insert_record(new_record(owner, "second", true)).await.unwrap();

        let mine = store.list_records_by_owner(owner).await.unwrap();
        let titles: Vec<_> = mine.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_list_public_joins_owner() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("a@x.com")).await.unwrap();

        store.insert_record(new_record(user.id, "private", false)).await.unwrap();
        store.insert_record(new_record(user.id, "shared", true)).await.unwrap();

        let public = store.list_public_records().await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].record.title, "shared");
        assert_eq!(public[0].owner.email, "a@x.com");
        assert_eq!(public[0].owner.id, user.id);
    }

    #[tokio::test]
    async fn test_update_and_delete_record() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let record = store.insert_record(new_record(owner, "T", false)).await.unwrap();

        let patch = RecordPatch {
            description: Some("Updated".to_string()),
            ..Default::default()
        };
        let updated = store.update_record(record.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.title, "T");
        assert_eq!(updated.description, "Updated");
        assert!(updated.updated_at >= record.updated_at);

        assert!(store
            .update_record(Uuid::new_v4(), RecordPatch::default())
            .await
            .unwrap()
            .is_none());

        assert!(store.delete_record(record.id).await.unwrap());
        assert!(!store.delete_record(record.id).await.unwrap());
        assert!(store.find_record(record.id).await.unwrap().is_none());
    }
}
