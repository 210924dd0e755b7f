pub mod error;
pub mod models;
pub mod repo;

mod memory;
pub use memory::MemoryStore;

pub use error::StoreError;
pub use models::{NewRecord, NewUser, OwnerSummary, PublicRecord, Record, RecordPatch, User};
pub use repo::{RecordStore, UserStore};
