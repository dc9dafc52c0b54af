//! API response type definitions.

use serde::{Deserialize, Serialize};

/// Creator profile from `/{service}/user/{id}/profile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub service: String,
    #[serde(default)]
    pub post_count: u64,
    #[serde(default)]
    pub indexed: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub public_id: Option<String>,
    #[serde(default)]
    pub relation_id: Option<serde_json::Value>,
}

/// Post summary as returned by the page listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPost {
    pub id: String,
    pub user: String,
    pub service: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Legacy listing wrapper (`/posts-legacy`).
#[derive(Debug, Deserialize)]
pub struct LegacyListing {
    #[serde(default)]
    pub results: Vec<RawPost>,
}

/// Full post payload from `/{service}/user/{id}/post/{post_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetail {
    pub post: DetailPost,
    #[serde(default)]
    pub attachments: Vec<FileMeta>,
    #[serde(default)]
    pub previews: Vec<FileMeta>,
    #[serde(default)]
    pub videos: Vec<FileMeta>,
}

/// The post body inside a [`PostDetail`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailPost {
    pub id: String,
    pub user: String,
    pub service: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub file: Option<PathRef>,
    #[serde(default)]
    pub attachments: Vec<PathRef>,
}

/// A file reference inside the post body; the platform omits the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathRef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// File metadata carrying the serving host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileMeta {
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl FileMeta {
    /// Whether every field needed to build a download URL is present.
    pub fn is_complete(&self) -> bool {
        self.server.as_deref().is_some_and(|s| !s.is_empty())
            && self.path.as_deref().is_some_and(|p| !p.is_empty())
            && self.name.is_some()
    }

    /// Absolute download URL: `{server}/data{path}`.
    pub fn url(&self) -> Option<String> {
        match (self.server.as_deref(), self.path.as_deref()) {
            (Some(server), Some(path)) if !server.is_empty() && !path.is_empty() => Some(
                format!("{}/data{}", server.trim_end_matches('/'), path),
            ),
            _ => None,
        }
    }
}
