//! # swapi-sync - SWAPI people loader
//!
//! Pulls people from the Star Wars API and stores them in a flat SQLite table.
//!
//! swapi-sync provides:
//! - A name resolver that turns related-resource URLs into display names
//! - A person fetcher that resolves homeworld, films, species, starships and vehicles
//! - A chunked batch pipeline with overlapping storage commits
//! - SQLite-backed storage behind the [`storage::PeopleSink`] trait

pub mod person;
pub mod config;
pub mod client;
pub mod pipeline;
pub mod storage;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenient access
pub use person::{Person, PersonPayload};
pub use client::{HttpConfig, SwapiClient};
pub use pipeline::{FailurePolicy, Pipeline, RunReport, SyncPlan};
pub use storage::{PeopleSink, SqliteStore};

/// Result type alias for swapi-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for swapi-sync operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Malformed JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid resource URL: {0}")]
    InvalidUrl(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Configuration error: {0}")]
    Config(String),
}
