//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Write-once page persistence keyed by URL
//! - Run tracking
//! - Aggregate statistics for reporting

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{InsertOutcome, Storage, StorageError, StorageResult};

use chrono::{DateTime, Utc};
use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, StorageError> {
    SqliteStorage::new(path)
}

/// A fetched and extracted page, as persisted
///
/// Records are immutable once written: the store rejects a second record for
/// the same `url` rather than replacing the first.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub url: String,
    pub parent_url: Option<String>,
    /// Raw response body
    pub html: String,
    /// Body length in bytes
    pub html_length: usize,
    pub title: Option<String>,
    pub headings: Vec<String>,
    /// Leading paragraphs, bounded by `paragraph-limit`
    pub paragraphs: Vec<String>,
    pub meta_description: Option<String>,
    /// Leading eligible outbound links, bounded by `stored-link-limit`
    pub links: Vec<String>,
    /// Number of eligible outbound links before truncation
    pub links_count: usize,
    pub depth: u32,
    pub status_code: u16,
    pub scraped_at: DateTime<Utc>,
    pub content_type: String,
    /// Identity of the worker that fetched the page
    pub worker: String,
}

/// Body size distribution across stored pages
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeStats {
    pub min: u64,
    pub max: u64,
    pub avg: f64,
    pub total: u64,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub visited_count: u64,
    pub persisted_count: u64,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
