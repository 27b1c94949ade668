//! Storage backend implementations.
//!
//! - [`redb`] - Embedded Redb database, file-backed or in-memory

pub mod redb;

pub use self::redb::{RedbConfig, RedbEngine};
