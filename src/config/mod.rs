//! Configuration module for Burrow
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use burrow::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("burrow.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{Config, CrawlerConfig, NetworkConfig, OutputConfig, PolitenessConfig};

pub use parser::{config_fingerprint, load_config, parse_config};
pub use validation::{validate, MAX_WORKERS};
