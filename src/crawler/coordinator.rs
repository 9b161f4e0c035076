//! Crawler coordinator - main crawl orchestration logic
//!
//! This module owns a crawl run from start to finish:
//! - Filtering seeds and loading them into the frontier
//! - Opening one fetch session per worker
//! - Spawning the bounded worker pool and waiting for it to drain
//! - Stopping every worker when the store fails
//! - Recording the run and reporting the summary

use crate::config::{Config, CrawlerConfig, PolitenessConfig};
use crate::crawler::fetcher::{HttpSessionFactory, SessionFactory};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::{Extractor, HtmlExtractor};
use crate::crawler::politeness::DelayPolicy;
use crate::crawler::visited::VisitedRegistry;
use crate::crawler::worker::{CrawlContext, CrawlCounters, CrawlWorker, TraversalLimits};
use crate::storage::{RunStatus, Storage};
use crate::url::{Address, NormalizePolicy};
use crate::{BurrowError, Result};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Run parameters derived from the configuration
#[derive(Debug, Clone, Copy)]
pub struct CrawlSettings {
    pub limits: TraversalLimits,
    pub workers: usize,
    pub delay: DelayPolicy,
    pub normalize: NormalizePolicy,
}

impl CrawlSettings {
    pub fn from_config(config: &Config) -> Self {
        Self::from_parts(&config.crawler, &config.politeness)
    }

    fn from_parts(crawler: &CrawlerConfig, politeness: &PolitenessConfig) -> Self {
        Self {
            limits: TraversalLimits {
                max_depth: crawler.max_depth,
                link_limit: crawler.link_limit,
                paragraph_limit: crawler.paragraph_limit,
                stored_link_limit: crawler.stored_link_limit,
            },
            workers: crawler.workers,
            delay: DelayPolicy::from_config(politeness),
            normalize: crawler.normalize_policy(),
        }
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self::from_parts(&CrawlerConfig::default(), &PolitenessConfig::default())
    }
}

/// Aggregate counters reported once a run ends
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSummary {
    /// Addresses claimed in the visited registry
    pub visited: usize,
    /// Pages newly written to the store
    pub persisted: u64,
    /// Pages the store already held
    pub duplicates: u64,
    /// Fetches that failed and were abandoned
    pub fetch_failures: u64,
    /// Seeds loaded into the frontier
    pub seeds: usize,
    /// Seeds dropped as ineligible
    pub skipped_seeds: usize,
    /// Workers actually started
    pub workers: usize,
    pub elapsed: Duration,
    /// True when a stop was requested before the frontier drained
    pub interrupted: bool,
}

/// Drives one crawl run over a bounded worker pool
pub struct Coordinator {
    store: Arc<dyn Storage>,
    sessions: Arc<dyn SessionFactory>,
    extractor: Arc<dyn Extractor>,
    settings: CrawlSettings,
    cancel: CancellationToken,
    config_hash: String,
}

impl Coordinator {
    /// Creates a coordinator from explicit collaborators
    ///
    /// # Arguments
    ///
    /// * `store` - Shared page store
    /// * `sessions` - Opens one fetch session per worker
    /// * `extractor` - Turns response bodies into page fields
    /// * `settings` - Depth, fan-out, pool size and pacing
    pub fn new(
        store: Arc<dyn Storage>,
        sessions: Arc<dyn SessionFactory>,
        extractor: Arc<dyn Extractor>,
        settings: CrawlSettings,
    ) -> Self {
        Self {
            store,
            sessions,
            extractor,
            settings,
            cancel: CancellationToken::new(),
            config_hash: String::new(),
        }
    }

    /// Creates a coordinator that fetches over HTTP and parses HTML
    pub fn from_config(config: &Config, store: Arc<dyn Storage>) -> Self {
        Self::new(
            store,
            Arc::new(HttpSessionFactory::new(config.network.clone())),
            Arc::new(HtmlExtractor),
            CrawlSettings::from_config(config),
        )
    }

    /// Sets the configuration fingerprint recorded with the run
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = hash.into();
        self
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// Returns a token that stops the run when cancelled
    ///
    /// Cancelling is permanent: a coordinator whose token has fired will
    /// not dispatch any further fetches.
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Crawls every eligible seed and returns the run summary
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - The frontier drained or a stop was requested
    /// * `Err(BurrowError)` - The store failed or a worker could not start
    pub async fn run(&self, seeds: &[String]) -> Result<CrawlSummary> {
        let started = Instant::now();

        let mut addresses = Vec::with_capacity(seeds.len());
        let mut skipped_seeds = 0;
        for seed in seeds {
            match Address::new(seed, self.settings.normalize) {
                Ok(address) => addresses.push(address),
                Err(e) => {
                    skipped_seeds += 1;
                    tracing::warn!(seed = %seed, reason = %e, "Skipping seed");
                }
            }
        }

        let seed_count = addresses.len();
        let frontier = Arc::new(Frontier::new(addresses));
        let worker_count = self.settings.workers.min(seed_count);

        let run_id = self.store.create_run(&self.config_hash)?;
        tracing::info!(
            run_id,
            seeds = seed_count,
            workers = worker_count,
            max_depth = self.settings.limits.max_depth,
            "Starting crawl"
        );

        let ctx = Arc::new(CrawlContext {
            registry: VisitedRegistry::new(),
            store: Arc::clone(&self.store),
            extractor: Arc::clone(&self.extractor),
            limits: self.settings.limits,
            delay: self.settings.delay,
            normalize: self.settings.normalize,
            counters: CrawlCounters::default(),
            cancel: self.cancel.clone(),
        });

        // Open every session before spawning so a bad network setup fails
        // the run without any fetch having been issued
        let mut workers = Vec::with_capacity(worker_count);
        for n in 1..=worker_count {
            let id = format!("worker-{}", n);
            match self.sessions.open_session(&id) {
                Ok(fetcher) => workers.push(CrawlWorker::new(id, fetcher, Arc::clone(&ctx))),
                Err(e) => {
                    self.record_finish(run_id, RunStatus::Failed, &ctx);
                    return Err(e);
                }
            }
        }

        let mut pool = JoinSet::new();
        for worker in workers {
            let span = tracing::info_span!("worker", id = %worker.id());
            pool.spawn(worker.run(Arc::clone(&frontier)).instrument(span));
        }

        let mut failure: Option<BurrowError> = None;
        while let Some(joined) = pool.join_next().await {
            let error = match joined {
                Ok(Ok(_)) => continue,
                Ok(Err(e)) => BurrowError::from(e),
                Err(e) => BurrowError::from(e),
            };

            if failure.is_none() {
                tracing::error!(error = %error, "Stopping all workers");
                self.cancel.cancel();
                failure = Some(error);
            }
        }

        if let Some(error) = failure {
            self.record_finish(run_id, RunStatus::Failed, &ctx);
            return Err(error);
        }

        let interrupted = self.cancel.is_cancelled();
        let status = if interrupted {
            RunStatus::Interrupted
        } else {
            RunStatus::Completed
        };
        self.record_finish(run_id, status, &ctx);

        let summary = CrawlSummary {
            visited: ctx.registry.len(),
            persisted: ctx.counters.persisted.load(Ordering::Relaxed),
            duplicates: ctx.counters.duplicates.load(Ordering::Relaxed),
            fetch_failures: ctx.counters.fetch_failures.load(Ordering::Relaxed),
            seeds: seed_count,
            skipped_seeds,
            workers: worker_count,
            elapsed: started.elapsed(),
            interrupted,
        };

        tracing::info!(
            visited = summary.visited,
            persisted = summary.persisted,
            duplicates = summary.duplicates,
            failures = summary.fetch_failures,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            interrupted,
            "Crawl finished"
        );

        Ok(summary)
    }

    /// Best-effort run bookkeeping; the crawl result stands regardless
    fn record_finish(&self, run_id: i64, status: RunStatus, ctx: &CrawlContext) {
        let result = self.store.finish_run(
            run_id,
            status,
            ctx.registry.len() as u64,
            ctx.counters.persisted.load(Ordering::Relaxed),
        );

        if let Err(e) = result {
            tracing::warn!(run_id, error = %e, "Failed to record run status");
        }
    }
}
