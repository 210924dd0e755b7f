//! Record operations with the ownership policy applied inline.

use std::sync::Arc;

use store::{NewRecord, PublicRecord, Record, RecordPatch, RecordStore};
use uuid::Uuid;

use super::input::{NewRecordInput, RecordChanges};
use super::policy::{authorize_mutation, authorize_read};
use crate::auth::Identity;
use crate::error::ApiError;

/// Parse a path id. Anything that is not a UUID cannot name a record.
pub fn parse_record_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::record_not_found())
}

#[derive(Clone)]
pub struct RecordService {
    records: Arc<dyn RecordStore>,
}

impl RecordService {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    /// Create a record owned by `requester`.
    pub async fn create(
        &self,
        requester: &Identity,
        input: NewRecordInput,
        photo_ref: Option<String>,
    ) -> Result<Record, ApiError> {
        let record = self
            .records
            .insert_record(NewRecord {
                owner_id: requester.id,
                title: input.title,
                description: input.description,
                date: input.date,
                photo_ref,
                is_public: input.is_public,
            })
            .await?;
        tracing::info!("User {} created record {}", requester.id, record.id);
        Ok(record)
    }

    /// The requester's own records, newest first.
    pub async fn list_owned(&self, requester: &Identity) -> Result<Vec<Record>, ApiError> {
        Ok(self.records.list_records_by_owner(requester.id).await?)
    }

    /// Every public record with its owner's display fields.
    pub async fn list_public(&self) -> Result<Vec<PublicRecord>, ApiError> {
        Ok(self.records.list_public_records().await?)
    }

    async fn fetch(&self, id: Uuid) -> Result<Record, ApiError> {
        self.records
            .find_record(id)
            .await?
            .ok_or_else(ApiError::record_not_found)
    }

    /// Read one record: visible if public or owned.
    pub async fn get(&self, requester: &Identity, id: Uuid) -> Result<Record, ApiError> {
        let record = self.fetch(id).await?;
        authorize_read(&record, Some(requester.id))?;
        Ok(record)
    }

    /// Fetch a record the requester is allowed to mutate.
    pub async fn get_for_update(&self, requester: &Identity, id: Uuid) -> Result<Record, ApiError> {
        let record = self.fetch(id).await?;
        authorize_mutation(&record, requester.id)?;
        Ok(record)
    }

    /// Apply a partial update. Owner only.
    pub async fn update(
        &self,
        requester: &Identity,
        id: Uuid,
        changes: RecordChanges,
        photo_ref: Option<String>,
    ) -> Result<Record, ApiError> {
        let record = self.get_for_update(requester, id).await?;

        let patch = RecordPatch {
            title: changes.title,
            description: changes.description,
            date: changes.date,
            photo_ref,
            is_public: changes.is_public,
        };
        if patch.is_empty() {
            return Ok(record);
        }

        let updated = self
            .records
            .update_record(id, patch)
            .await?
            .ok_or_else(ApiError::record_not_found)?;
        tracing::info!("User {} updated record {}", requester.id, id);
        Ok(updated)
    }

    /// Delete a record. Owner only.
    pub async fn delete(&self, requester: &Identity, id: Uuid) -> Result<(), ApiError> {
        self.get_for_update(requester, id).await?;
        if !self.records.delete_record(id).await? {
            return Err(ApiError::record_not_found());
        }
        tracing::info!("User {} deleted record {}", requester.id, id);
        Ok(())
    }
}
