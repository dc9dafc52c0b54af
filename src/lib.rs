//! KC Downloader - collect and download posts from kemono and coomer
//!
//! This library provides functionality for walking a creator's posts through
//! the platforms' REST API and downloading the attached files.
//!
//! # Features
//!
//! - Fetch modes: all posts, single pages, page ranges, post-id ranges
//! - Incremental snapshot files and a resumable post detail cache
//! - Concurrent per-post downloads with size checks and verification
//! - A ledger of links with failed files, for later retries
//! - Rate limiting and retry logic
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use kc_downloader::api::{build_http_client, PlatformApi};
//! use kc_downloader::collect::{resolve, CollectOptions, DetailCache, FetchPlan, PostCollector};
//! use kc_downloader::config::{Config, Site};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("config.toml"))?;
//!     let api = PlatformApi::new(&config, Site::Kemono, build_http_client(&config.options)?);
//!
//!     let profile = api.get_profile("patreon", "12345").await?;
//!     let plan = FetchPlan::new(resolve("all", profile.post_count)?, profile.post_count);
//!     let collector = PostCollector::new(
//!         &api,
//!         DetailCache::new(&config.options.cache_directory),
//!         CollectOptions::from_options(&config.options),
//!         CancellationToken::new(),
//!     );
//!     let posts = collector
//!         .collect("patreon", "12345", &plan, Path::new("posts.json"))
//!         .await?;
//!
//!     // ... download logic
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod collect;
pub mod config;
pub mod download;
pub mod error;
pub mod fs;
pub mod ledger;
pub mod output;

// Re-exports for convenience
pub use api::{PlatformApi, PostSource};
pub use collect::{PostCollector, PostRecord, ProfileSnapshot};
pub use config::Config;
pub use download::{DownloadResult, Downloader};
pub use error::{Error, Result};
pub use ledger::FailureLedger;
