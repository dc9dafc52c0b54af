//! On-disk cache of post details, one JSON file per (user, post).

use std::path::{Path, PathBuf};

use crate::api::PostDetail;
use crate::error::Result;
use crate::fs::naming::sanitize_folder_name;

#[derive(Debug, Clone)]
pub struct DetailCache {
    root: PathBuf,
}

impl DetailCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, user_id: &str, post_id: &str) -> PathBuf {
        self.root
            .join(sanitize_folder_name(user_id))
            .join(format!("{}.json", sanitize_folder_name(post_id)))
    }

    /// Cached detail of a post. Unreadable entries count as misses.
    pub fn get(&self, user_id: &str, post_id: &str) -> Option<PostDetail> {
        let path = self.entry_path(user_id, post_id);
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(detail) => Some(detail),
            Err(e) => {
                tracing::warn!("Discarding corrupt cache entry {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn put(&self, user_id: &str, post_id: &str, detail: &PostDetail) -> Result<()> {
        let path = self.entry_path(user_id, post_id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string(detail)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PostDetail {
        serde_json::from_value(serde_json::json!({
            "post": {"id": "7", "user": "42", "service": "patreon", "title": "t"}
        }))
        .unwrap()
    }

    #[test]
    fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DetailCache::new(dir.path());

        assert!(cache.get("42", "7").is_none());
        cache.put("42", "7", &sample()).unwrap();

        assert!(dir.path().join("42").join("7.json").exists());
        let detail = cache.get("42", "7").unwrap();
        assert_eq!(detail.post.title.as_deref(), Some("t"));
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("42")).unwrap();
        std::fs::write(dir.path().join("42").join("7.json"), "{").unwrap();

        assert!(DetailCache::new(dir.path()).get("42", "7").is_none());
    }
}
