//! Post collection.
//!
//! This module handles:
//! - Fetch-mode resolution into page offsets and id filters
//! - Normalizing post details into records with downloadable files
//! - The per-post detail cache
//! - Incremental snapshot files
//! - The page walk itself

pub mod cache;
pub mod collector;
pub mod normalize;
pub mod range;
pub mod snapshot;

pub use cache::DetailCache;
pub use collector::{CollectOptions, PostCollector};
pub use normalize::{normalize_post, push_unique, FileRef, PostRecord};
pub use range::{resolve, FetchPlan, FetchUnit, IdPredicate};
pub use snapshot::{snapshot_file_name, write_snapshot, ProfileSnapshot};
