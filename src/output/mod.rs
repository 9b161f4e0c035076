//! Output module for crawl reports
//!
//! This module handles:
//! - Printing the summary of a finished run
//! - Aggregating and printing store statistics

pub mod stats;

pub use stats::{load_statistics, print_statistics, CrawlStatistics};

use crate::crawler::CrawlSummary;

/// Prints the summary of one run to stdout
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    if summary.interrupted {
        println!("  Stopped early on request");
    }
    println!("  Seeds crawled: {}", summary.seeds);
    if summary.skipped_seeds > 0 {
        println!("  Seeds skipped: {}", summary.skipped_seeds);
    }
    println!("  Workers: {}", summary.workers);
    println!("  Addresses visited: {}", summary.visited);
    println!("  Pages saved: {}", summary.persisted);
    println!("  Already stored: {}", summary.duplicates);
    println!("  Failed fetches: {}", summary.fetch_failures);
    println!("  Elapsed: {:.2}s", summary.elapsed.as_secs_f64());
    println!();
}
