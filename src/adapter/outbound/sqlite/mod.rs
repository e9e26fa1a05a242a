//! SQLite persistence adapter.
//!
//! Provides the SQLite-backed [`RecordStore`](crate::port::RecordStore)
//! using Diesel ORM. Uniqueness rules live in the schema as unique indexes.

pub mod database;
pub mod store;

pub use store::SqliteRecordStore;
