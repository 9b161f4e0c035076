//! Statistics generation from crawl database
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::storage::{RunRecord, SizeStats, Storage, StorageResult};

/// Number of recent pages listed in the report
pub const RECENT_LIMIT: usize = 5;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Total number of pages stored
    pub total_pages: u64,

    /// Body size distribution, `None` for an empty store
    pub sizes: Option<SizeStats>,

    /// Page counts by crawl depth
    pub pages_by_depth: Vec<(u32, u64)>,

    /// Page counts by the worker that fetched them
    pub pages_by_worker: Vec<(String, u64)>,

    /// Most recently stored pages as `(scraped_at, url)`
    pub recent: Vec<(String, String)>,

    /// The latest recorded run, if any
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> StorageResult<CrawlStatistics> {
    Ok(CrawlStatistics {
        total_pages: storage.count_all()?,
        sizes: storage.size_stats()?,
        pages_by_depth: storage.count_by_depth()?,
        pages_by_worker: storage.count_by_worker()?,
        recent: storage.recent_pages(RECENT_LIMIT)?,
        latest_run: storage.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Total pages stored: {}", stats.total_pages);
    if let Some(run) = &stats.latest_run {
        println!(
            "  Latest run: #{} {} ({} visited, {} saved)",
            run.id,
            run.status.to_db_string(),
            run.visited_count,
            run.persisted_count
        );
    }
    println!();

    if let Some(sizes) = &stats.sizes {
        println!("Page Sizes:");
        println!("  Average: {:.0} bytes", sizes.avg);
        println!("  Largest: {} bytes", sizes.max);
        println!("  Smallest: {} bytes", sizes.min);
        println!("  Total: {:.2} MB", sizes.total as f64 / (1024.0 * 1024.0));
        println!();
    }

    if !stats.pages_by_depth.is_empty() {
        println!("Pages by Depth:");
        for (depth, count) in &stats.pages_by_depth {
            println!("  Depth {}: {} ({:.1}%)", depth, count, share(*count, stats.total_pages));
        }
        println!();
    }

    if !stats.pages_by_worker.is_empty() {
        println!("Pages by Worker:");
        for (worker, count) in &stats.pages_by_worker {
            println!("  {}: {}", worker, count);
        }
        println!();
    }

    if !stats.recent.is_empty() {
        println!("Recent Pages:");
        for (scraped_at, url) in &stats.recent {
            println!("  {}  {}", scraped_at, url);
        }
        println!();
    }
}

fn share(count: u64, total: u64) -> f64 {
    if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}
