//! # Database module: PostgreSQL persistence
//!
//! The PostgreSQL implementation of the [`store::UserStore`] and
//! [`store::RecordStore`] traits, plus the connection pool it runs on.
//!
//! ## Design
//!
//! [`connect`] opens a [`sqlx::PgPool`] and [`migrate`] applies the migrations
//! embedded from `packages/api/migrations`. [`PgStore`] wraps the pool; every trait
//! method is a single statement, so the only consistency guarantee relied on is
//! PostgreSQL's per-statement atomicity. Email uniqueness is enforced by the
//! `users_email_key` unique index and surfaces as [`store::StoreError::Duplicate`].
//!
//! Queries use the runtime-checked `sqlx::query_as` API so the crate builds without
//! a live database.

mod pg;
mod pool;

pub use pg::PgStore;
pub use pool::{connect, migrate};
