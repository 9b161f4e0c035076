//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{PageRecord, RunRecord, RunStatus, SizeStats};
use thiserror::Error;

/// Errors that can occur during storage operations
///
/// Every variant means the store can no longer be trusted to record pages;
/// an address that is already stored is reported through
/// [`InsertOutcome::Duplicate`] instead.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Run not found: {0}")]
    RunNotFound(i64),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Outcome of persisting a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The page was written
    Inserted,
    /// A page with the same URL already exists; nothing was written
    Duplicate,
}

/// Trait for storage backend implementations
///
/// All methods take `&self`: one store is shared by every crawl worker, so
/// implementations provide their own interior synchronization.
pub trait Storage: Send + Sync {
    // ===== Pages =====

    /// Persists a page keyed by its URL, never overwriting an existing row
    fn insert_page(&self, page: &PageRecord) -> StorageResult<InsertOutcome>;

    /// Gets a page by URL
    fn get_page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>>;

    /// Lists the URLs stored at one crawl depth, in insertion order
    fn list_pages_at_depth(&self, depth: u32) -> StorageResult<Vec<String>>;

    /// Gets total page count
    fn count_all(&self) -> StorageResult<u64>;

    // ===== Statistics =====

    /// Body size distribution over all stored pages, `None` when empty
    fn size_stats(&self) -> StorageResult<Option<SizeStats>>;

    /// Page counts grouped by the worker that stored them, largest first
    fn count_by_worker(&self) -> StorageResult<Vec<(String, u64)>>;

    /// Page counts grouped by crawl depth, shallowest first
    fn count_by_depth(&self) -> StorageResult<Vec<(u32, u64)>>;

    /// Most recently stored pages as `(scraped_at, url)`, newest first
    fn recent_pages(&self, limit: usize) -> StorageResult<Vec<(String, String)>>;

    // ===== Run Management =====

    /// Creates a new crawl run
    fn create_run(&self, config_hash: &str) -> StorageResult<i64>;

    /// Records the final status and counters of a run
    fn finish_run(
        &self,
        run_id: i64,
        status: RunStatus,
        visited: u64,
        persisted: u64,
    ) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;
}
