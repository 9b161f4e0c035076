//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{InsertOutcome, Storage, StorageError, StorageResult};
use crate::storage::{PageRecord, RunRecord, RunStatus, SizeStats};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const PAGE_COLUMNS: &str = "url, parent_url, html, html_length, title, headings, paragraphs,
     meta_description, links, links_count, depth, status_code, scraped_at, content_type, worker";

/// SQLite storage backend
///
/// The connection sits behind a mutex so a single instance can be shared by
/// all crawl workers.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA mmap_size = 268435456;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

/// Returns true if the error is a UNIQUE / PRIMARY KEY violation
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        }
        _ => false,
    }
}

fn json_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        url: row.get(0)?,
        parent_url: row.get(1)?,
        html: row.get(2)?,
        html_length: row.get::<_, i64>(3)? as usize,
        title: row.get(4)?,
        headings: json_column(row, 5)?,
        paragraphs: json_column(row, 6)?,
        meta_description: row.get(7)?,
        links: json_column(row, 8)?,
        links_count: row.get::<_, i64>(9)? as usize,
        depth: row.get(10)?,
        status_code: row.get(11)?,
        scraped_at: timestamp_column(row, 12)?,
        content_type: row.get(13)?,
        worker: row.get(14)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
        visited_count: row.get::<_, i64>(5)? as u64,
        persisted_count: row.get::<_, i64>(6)? as u64,
    })
}

impl Storage for SqliteStorage {
    // ===== Pages =====

    fn insert_page(&self, page: &PageRecord) -> StorageResult<InsertOutcome> {
        let headings = serde_json::to_string(&page.headings)?;
        let paragraphs = serde_json::to_string(&page.paragraphs)?;
        let links = serde_json::to_string(&page.links)?;

        let conn = self.conn()?;
        let result = conn.execute(
            &format!(
                "INSERT INTO pages ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                PAGE_COLUMNS
            ),
            params![
                page.url,
                page.parent_url,
                page.html,
                page.html_length as i64,
                page.title,
                headings,
                paragraphs,
                page.meta_description,
                links,
                page.links_count as i64,
                page.depth,
                page.status_code,
                page.scraped_at.to_rfc3339(),
                page.content_type,
                page.worker,
            ],
        );

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    fn get_page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>> {
        let conn = self.conn()?;
        let page = conn
            .query_row(
                &format!("SELECT {} FROM pages WHERE url = ?1", PAGE_COLUMNS),
                params![url],
                page_from_row,
            )
            .optional()?;

        Ok(page)
    }

    fn list_pages_at_depth(&self, depth: u32) -> StorageResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT url FROM pages WHERE depth = ?1 ORDER BY id")?;

        let urls = stmt
            .query_map(params![depth], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(urls)
    }

    fn count_all(&self) -> StorageResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Statistics =====

    fn size_stats(&self) -> StorageResult<Option<SizeStats>> {
        let conn = self.conn()?;
        let stats = conn.query_row(
            "SELECT COUNT(*), MIN(html_length), MAX(html_length), AVG(html_length), SUM(html_length)
             FROM pages",
            [],
            |row| {
                let count: i64 = row.get(0)?;
                if count == 0 {
                    return Ok(None);
                }
                Ok(Some(SizeStats {
                    min: row.get::<_, i64>(1)? as u64,
                    max: row.get::<_, i64>(2)? as u64,
                    avg: row.get(3)?,
                    total: row.get::<_, i64>(4)? as u64,
                }))
            },
        )?;

        Ok(stats)
    }

    fn count_by_worker(&self) -> StorageResult<Vec<(String, u64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT worker, COUNT(*) AS count FROM pages GROUP BY worker ORDER BY count DESC, worker",
        )?;

        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn count_by_depth(&self) -> StorageResult<Vec<(u32, u64)>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT depth, COUNT(*) FROM pages GROUP BY depth ORDER BY depth")?;

        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn recent_pages(&self, limit: usize) -> StorageResult<Vec<(String, String)>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT scraped_at, url FROM pages ORDER BY scraped_at DESC, id DESC LIMIT ?1")?;

        let rows = stmt
            .query_map(params![limit as i64], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    // ===== Run Management =====

    fn create_run(&self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn finish_run(
        &self,
        run_id: i64,
        status: RunStatus,
        visited: u64,
        persisted: u64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, visited_count = ?3, persisted_count = ?4
             WHERE id = ?5",
            params![
                status.to_db_string(),
                now,
                visited as i64,
                persisted as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, started_at, finished_at, config_hash, status, visited_count, persisted_count
             FROM runs WHERE id = ?1",
            params![run_id],
            run_from_row,
        )
        .optional()?
        .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let conn = self.conn()?;
        let run = conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, visited_count, persisted_count
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }
}
