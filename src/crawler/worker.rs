//! Crawl worker - depth-first traversal of one seed at a time
//!
//! A worker takes a seed from the [`Frontier`], walks that seed's link tree
//! to exhaustion and only then asks for the next seed. Within one seed
//! everything is sequential: a node's children are visited in the order they
//! were discovered, each after a politeness pause, and only after the node
//! itself has been persisted.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::Extractor;
use crate::crawler::politeness::DelayPolicy;
use crate::crawler::visited::VisitedRegistry;
use crate::storage::{InsertOutcome, PageRecord, Storage, StorageError};
use crate::url::{Address, NormalizePolicy};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Per-page bounds applied during traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalLimits {
    /// Deepest level fetched; the seed is depth 0
    pub max_depth: u32,
    /// Children followed per page
    pub link_limit: usize,
    /// Paragraphs kept on the stored record
    pub paragraph_limit: usize,
    /// Outbound links kept on the stored record
    pub stored_link_limit: usize,
}

impl Default for TraversalLimits {
    fn default() -> Self {
        Self {
            max_depth: 2,
            link_limit: 5,
            paragraph_limit: 10,
            stored_link_limit: 100,
        }
    }
}

/// Run-wide counters updated by every worker
#[derive(Debug, Default)]
pub struct CrawlCounters {
    pub persisted: AtomicU64,
    pub duplicates: AtomicU64,
    pub fetch_failures: AtomicU64,
}

/// State shared by all workers of one run
pub struct CrawlContext {
    pub registry: VisitedRegistry,
    pub store: Arc<dyn Storage>,
    pub extractor: Arc<dyn Extractor>,
    pub limits: TraversalLimits,
    pub delay: DelayPolicy,
    pub normalize: NormalizePolicy,
    pub counters: CrawlCounters,
    pub cancel: CancellationToken,
}

/// One unit of traversal work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub address: Address,
    pub depth: u32,
    pub parent: Option<Address>,
}

impl CrawlTask {
    pub fn seed(address: Address) -> Self {
        Self {
            address,
            depth: 0,
            parent: None,
        }
    }
}

/// Stack entry; `paced` is set for every child so it waits out one delay
struct Pending {
    task: CrawlTask,
    paced: bool,
}

/// A worker with its own fetch session
pub struct CrawlWorker {
    id: String,
    fetcher: Box<dyn Fetcher>,
    ctx: Arc<CrawlContext>,
}

impl CrawlWorker {
    pub fn new(id: impl Into<String>, fetcher: Box<dyn Fetcher>, ctx: Arc<CrawlContext>) -> Self {
        Self {
            id: id.into(),
            fetcher,
            ctx,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Pulls seeds until the frontier is drained or the run is cancelled
    ///
    /// Returns the number of seeds this worker traversed. A storage failure
    /// ends the worker immediately and is handed back to the coordinator.
    pub async fn run(self, frontier: Arc<Frontier>) -> Result<usize, StorageError> {
        let mut completed = 0;

        while !self.ctx.cancel.is_cancelled() {
            let Some(seed) = frontier.pop() else {
                break;
            };

            tracing::info!(
                seed = %seed,
                host = seed.host().as_deref().unwrap_or("-"),
                "Starting seed"
            );
            self.traverse(seed.clone()).await?;
            tracing::info!(seed = %seed, "Completed seed");
            completed += 1;
        }

        Ok(completed)
    }

    /// Depth-first traversal of one seed
    ///
    /// Uses an explicit stack instead of recursion. Children are pushed in
    /// reverse so the first discovered link is popped first, and a child's
    /// whole subtree is finished before its next sibling starts.
    pub async fn traverse(&self, seed: Address) -> Result<(), StorageError> {
        let mut stack = vec![Pending {
            task: CrawlTask::seed(seed),
            paced: false,
        }];

        while let Some(Pending { task, paced }) = stack.pop() {
            if paced && !self.ctx.delay.pause(&self.ctx.cancel).await {
                tracing::debug!(url = %task.address, "Stop requested during pause");
                break;
            }

            let children = self.visit(&task).await?;
            stack.extend(children.into_iter().rev().map(|task| Pending { task, paced: true }));
        }

        Ok(())
    }

    /// Visits one node and returns the children to follow
    ///
    /// Only a storage failure is an error. Fetch failures, duplicates and
    /// depth overruns all end this branch quietly with no children.
    pub async fn visit(&self, task: &CrawlTask) -> Result<Vec<CrawlTask>, StorageError> {
        let limits = &self.ctx.limits;

        if task.depth > limits.max_depth {
            return Ok(Vec::new());
        }

        if self.ctx.cancel.is_cancelled() {
            return Ok(Vec::new());
        }

        if !self.ctx.registry.mark_visited(&task.address) {
            tracing::debug!(url = %task.address, "Already visited");
            return Ok(Vec::new());
        }

        tracing::info!(depth = task.depth, url = %task.address, "Fetching");

        let page = match self.fetcher.fetch(&task.address).await {
            Ok(page) => page,
            Err(e) => {
                self.ctx.counters.fetch_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    depth = task.depth,
                    url = %task.address,
                    error = %e,
                    "Fetch failed"
                );
                return Ok(Vec::new());
            }
        };

        if page.final_url != task.address.as_str() {
            tracing::debug!(url = %task.address, final_url = %page.final_url, "Redirected");
        }

        let base = match Url::parse(task.address.as_str()) {
            Ok(base) => base,
            Err(e) => {
                self.ctx.counters.fetch_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(url = %task.address, error = %e, "Unusable base URL");
                return Ok(Vec::new());
            }
        };

        let fields = self.ctx.extractor.extract(&page.body, &base);

        let links: Vec<Address> = fields
            .links
            .iter()
            .filter_map(|raw| match Address::new(raw, self.ctx.normalize) {
                Ok(address) => Some(address),
                Err(e) => {
                    tracing::trace!(link = %raw, reason = %e, "Skipping link");
                    None
                }
            })
            .collect();

        let record = PageRecord {
            url: task.address.to_string(),
            parent_url: task.parent.as_ref().map(|p| p.to_string()),
            // UTF-8 byte length, which is what the size statistics report
            html_length: page.body.len(),
            html: page.body,
            title: fields.title,
            headings: fields.headings,
            paragraphs: fields
                .paragraphs
                .into_iter()
                .take(limits.paragraph_limit)
                .collect(),
            meta_description: fields.meta_description,
            links: links
                .iter()
                .take(limits.stored_link_limit)
                .map(|a| a.to_string())
                .collect(),
            links_count: links.len(),
            depth: task.depth,
            status_code: page.status_code,
            scraped_at: Utc::now(),
            content_type: page.content_type,
            worker: self.id.clone(),
        };

        match self.ctx.store.insert_page(&record)? {
            InsertOutcome::Inserted => {
                self.ctx.counters.persisted.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    depth = task.depth,
                    url = %task.address,
                    title = record.title.as_deref().unwrap_or("-"),
                    bytes = record.html_length,
                    links = record.links_count,
                    "Saved page"
                );
            }
            InsertOutcome::Duplicate => {
                self.ctx.counters.duplicates.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(url = %task.address, "Already in database, skipping subtree");
                return Ok(Vec::new());
            }
        }

        if task.depth >= limits.max_depth {
            return Ok(Vec::new());
        }

        Ok(links
            .into_iter()
            .take(limits.link_limit)
            .map(|address| CrawlTask {
                address,
                depth: task.depth + 1,
                parent: Some(task.address.clone()),
            })
            .collect())
    }
}
