//! Configuration module for the kc-downloader.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Platform domains and site mapping
//! - Configuration validation and link parsing

pub mod loader;
pub mod modes;
pub mod validation;

pub use loader::{url_authority, Config, DomainsConfig, OptionsConfig};
pub use modes::{ListingEndpoint, PostFolderName, Site};
pub use validation::{
    parse_post_link, parse_profile_link, split_links, validate_config, PostLink, ProfileLink,
};
