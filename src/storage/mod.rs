//! Storage Layer - SQLite-backed persistence
//!
//! System of record is a single SQLite table:
//! - people(id, name, birth_year, ..., homeworld, films, species, starships, vehicles)
//!
//! The pipeline only sees the [`PeopleSink`] trait, so any backend that can
//! create its schema and append a batch can stand in for SQLite.

pub mod schema;
pub mod sqlite;

pub use sqlite::{PeopleStats, SqliteStore};

use crate::Result;
use crate::person::Person;
use async_trait::async_trait;

/// Destination for fetched people.
#[async_trait]
pub trait PeopleSink: Send + Sync {
    /// Create tables and indexes if they are missing. Safe to call repeatedly.
    async fn create_schema_if_absent(&self) -> Result<()>;

    /// Append a batch in one transaction and return how many rows were written.
    ///
    /// Each call is independent: a failure rolls back this batch only.
    async fn insert_batch(&self, people: Vec<Person>) -> Result<usize>;
}
