//! Platform API module.
//!
//! This module provides:
//! - HTTP client for the platform REST API
//! - The `PostSource` trait the collector is written against
//! - Rate-limit retry policy
//! - API response types

pub mod client;
pub mod retry;
pub mod source;
pub mod types;

pub use client::{build_http_client, PlatformApi, SiteApis, PAGE_SIZE};
pub use retry::RetryPolicy;
pub use source::PostSource;
pub use types::*;
