//! Filesystem module.
//!
//! Provides:
//! - File and folder name sanitization
//! - Download layout and post folder resolution
//! - The per-site creator registry

pub mod naming;
pub mod paths;
pub mod profiles;

pub use naming::{adapt_file_name, file_extension, numbered_file_name, sanitize_title};
pub use paths::{
    artist_dir, count_existing_files, create_post_folder, ensure_dir, posts_dir_for_snapshot,
    resolve_post_folder, site_dir, PARTIAL_SUFFIX, POSTS_DIR,
};
pub use profiles::{ArtistInfo, ProfileRegistry};
