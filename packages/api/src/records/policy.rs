//! # Ownership policy
//!
//! Pure rules deciding what a requester may do with a record. They are evaluated
//! inside every record operation, after the guard has resolved the identity.
//!
//! | Operation | Allowed when |
//! |-----------|--------------|
//! | read by id | `record.is_public` or requester owns it |
//! | update / delete | requester owns it (the public flag is irrelevant) |

use store::Record;
use uuid::Uuid;

use crate::error::ApiError;

/// Whether `requester` (if any) may see `record`.
pub fn can_read(record: &Record, requester: Option<Uuid>) -> bool {
    record.is_public || requester == Some(record.owner_id)
}

/// Whether `requester` may update or delete `record`.
pub fn can_mutate(record: &Record, requester: Uuid) -> bool {
    record.owner_id == requester
}

pub fn authorize_read(record: &Record, requester: Option<Uuid>) -> Result<(), ApiError> {
    if can_read(record, requester) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

pub fn authorize_mutation(record: &Record, requester: Uuid) -> Result<(), ApiError> {
    if can_mutate(record, requester) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn record(owner_id: Uuid, is_public: bool) -> Record {
        let now = Utc::now();
        Record {
            id: Uuid::new_v4(),
            owner_id,
            title: "T".to_string(),
            description: "D".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            photo_ref: None,
            is_public,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_private_record_only_visible_to_owner() {
        let owner = Uuid::new_v4();
        let private = record(owner, false);

        assert!(can_read(&private, Some(owner)));
        assert!(!can_read(&private, Some(Uuid::new_v4())));
        assert!(!can_read(&private, None));
        assert!(matches!(
            authorize_read(&private, Some(Uuid::new_v4())),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn test_public_record_visible_to_anyone() {
        let public = record(Uuid::new_v4(), true);
        assert!(can_read(&public, Some(Uuid::new_v4())));
        assert!(can_read(&public, None));
    }

    #[test]
    fn test_only_owner_mutates_regardless_of_visibility() {
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        for is_public in [false, true] {
            let r = record(owner, is_public);
            assert!(authorize_mutation(&r, owner).is_ok());
            assert!(matches!(
                authorize_mutation(&r, stranger),
                Err(ApiError::Forbidden)
            ));
        }
    }
}
