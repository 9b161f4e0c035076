//! Crawler module for page fetching and traversal
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with one session per worker
//! - HTML field and link extraction
//! - The shared visited registry and seed frontier
//! - Politeness pacing between fetches
//! - Depth-first traversal and overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod politeness;
mod visited;
mod worker;

pub use coordinator::{Coordinator, CrawlSettings, CrawlSummary};
pub use fetcher::{
    build_http_client, FetchError, FetchedPage, Fetcher, HttpFetcher, HttpSessionFactory,
    SessionFactory,
};
pub use frontier::Frontier;
pub use parser::{parse_html, Extractor, HtmlExtractor, PageFields};
pub use politeness::DelayPolicy;
pub use visited::VisitedRegistry;
pub use worker::{CrawlContext, CrawlCounters, CrawlTask, CrawlWorker, TraversalLimits};

