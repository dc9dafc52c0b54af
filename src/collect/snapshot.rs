//! Collected post snapshot (`posts-*.json`).
//!
//! Every write replaces the whole document through a temporary file and a
//! rename, so the file on disk is always complete.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::collect::normalize::PostRecord;
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub total_posts: usize,
    pub posts: Vec<PostRecord>,
}

impl ProfileSnapshot {
    pub fn new(posts: Vec<PostRecord>) -> Self {
        Self {
            total_posts: posts.len(),
            posts,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Overwrite `path` with this snapshot.
    pub fn write(&self, path: &Path) -> Result<()> {
        write_snapshot(path, &self.posts)
    }

    pub fn find(&self, post_id: &str) -> Option<&PostRecord> {
        self.posts.iter().find(|p| p.id == post_id)
    }
}

/// Write `posts` as a complete snapshot document.
pub fn write_snapshot(path: &Path, posts: &[PostRecord]) -> Result<()> {
    #[derive(Serialize)]
    struct Document<'a> {
        total_posts: usize,
        posts: &'a [PostRecord],
    }

    let content = serde_json::to_string_pretty(&Document {
        total_posts: posts.len(),
        posts,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Snapshot file name for the walked offsets.
pub fn snapshot_file_name(first: u64, last: u64, date: NaiveDate) -> String {
    let date = date.format("%Y-%m-%d");
    if first == last {
        format!("posts-{}-{}.json", first, date)
    } else {
        format!("posts-{}-{}-{}.json", first, last, date)
    }
}
