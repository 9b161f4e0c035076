use crate::url::NormalizePolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure for Burrow
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Start addresses, one traversal each
    #[serde(default)]
    pub seeds: Vec<String>,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub politeness: PolitenessConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    pub output: OutputConfig,
}

/// Traversal limits
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum depth to crawl from each seed (the seed itself is depth 0)
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Number of concurrent workers, each owning one seed at a time
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Outbound links followed per page
    #[serde(default = "default_link_limit")]
    pub link_limit: usize,

    /// Paragraphs kept on each stored page
    #[serde(default = "default_paragraph_limit")]
    pub paragraph_limit: usize,

    /// Outbound links kept on each stored page
    #[serde(default = "default_stored_link_limit")]
    pub stored_link_limit: usize,

    /// Drop `#fragment` before an address is used as a key
    #[serde(default)]
    pub strip_fragments: bool,
}

/// Pacing between consecutive fetches issued by one worker
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PolitenessConfig {
    /// Fixed pause before each child fetch (milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound of the uniform random extra pause (milliseconds)
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

/// Network path configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// Proxy every request goes through, e.g. `socks5h://127.0.0.1:9050`
    #[serde(default)]
    pub proxy: Option<String>,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the SQLite database file
    pub database_path: String,
}

impl CrawlerConfig {
    pub fn normalize_policy(&self) -> NormalizePolicy {
        NormalizePolicy {
            strip_fragments: self.strip_fragments,
        }
    }
}

impl PolitenessConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn jitter(&self) -> Duration {
        Duration::from_millis(self.jitter_ms)
    }
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            workers: default_workers(),
            link_limit: default_link_limit(),
            paragraph_limit: default_paragraph_limit(),
            stored_link_limit: default_stored_link_limit(),
            strip_fragments: false,
        }
    }
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_max_depth() -> u32 {
    2
}

fn default_workers() -> usize {
    5
}

fn default_link_limit() -> usize {
    5
}

fn default_paragraph_limit() -> usize {
    10
}

fn default_stored_link_limit() -> usize {
    100
}

fn default_base_delay_ms() -> u64 {
    3000
}

fn default_jitter_ms() -> u64 {
    2000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; rv:109.0) Gecko/20100101 Firefox/115.0".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}
