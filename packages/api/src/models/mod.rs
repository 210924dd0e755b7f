//! Client-facing projections of the domain models.

mod user;

pub use user::{AuthResponse, MessageResponse, UserInfo};
