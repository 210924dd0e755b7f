//! Personal records: input normalization, the ownership policy and the service
//! that applies it.

pub mod input;
pub mod policy;
mod service;

pub use input::{NewRecordInput, RecordChanges, RecordForm, UploadedFile};
pub use service::{parse_record_id, RecordService};
