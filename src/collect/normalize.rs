//! Post detail normalization.

use serde::{Deserialize, Serialize};

use crate::api::{FileMeta, PathRef, PostDetail};
use crate::error::{Error, Result};

/// A downloadable file of a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    pub url: String,
}

/// Normalized post summary with its deduplicated files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub user: String,
    pub service: String,
    #[serde(default)]
    pub title: String,
    pub link: String,
    pub page: u64,
    pub offset: u64,
    #[serde(default)]
    pub files: Vec<FileRef>,
}

/// Append `file` unless its url is already present. First occurrence wins.
pub fn push_unique(files: &mut Vec<FileRef>, file: FileRef) {
    if !files.iter().any(|f| f.url == file.url) {
        files.push(file);
    }
}

/// Resolve a path reference against the metadata entries carrying servers.
///
/// `Ok(None)` means the reference has no path or no known server.
fn resolve_ref(
    post: &PostRecord,
    reference: &PathRef,
    metadata: &[&FileMeta],
) -> Result<Option<FileRef>> {
    let Some(path) = reference.path.as_deref().filter(|p| !p.is_empty()) else {
        return Ok(None);
    };
    let Some(meta) = metadata.iter().find(|m| m.path.as_deref() == Some(path)) else {
        tracing::debug!("post {}: no server known for {}", post.id, path);
        return Ok(None);
    };

    let (Some(server), true) = (meta.server.as_deref(), meta.is_complete()) else {
        return Err(Error::MalformedAttachment(format!(
            "{} - {}: {}",
            post.user, post.id, path
        )));
    };

    let url = format!("{}/data{}", server.trim_end_matches('/'), path);
    let name = reference
        .name
        .clone()
        .or_else(|| meta.name.clone())
        .unwrap_or_default();

    Ok(Some(FileRef { name, url }))
}

/// Build a [`PostRecord`] from a post detail.
///
/// The post's main file and attachments are matched by path against the
/// preview, attachment and video metadata to find their serving host. Videos
/// not referenced by the post body are appended last.
pub fn normalize_post(detail: &PostDetail, link: String, page: u64, offset: u64) -> PostRecord {
    let post = &detail.post;
    let mut record = PostRecord {
        id: post.id.clone(),
        user: post.user.clone(),
        service: post.service.clone(),
        title: post.title.clone().unwrap_or_default(),
        link,
        page,
        offset,
        files: Vec::new(),
    };

    let metadata: Vec<&FileMeta> = detail
        .previews
        .iter()
        .chain(detail.attachments.iter())
        .chain(detail.videos.iter())
        .collect();

    let references = post.file.iter().chain(post.attachments.iter());
    let mut files = Vec::new();
    for reference in references {
        match resolve_ref(&record, reference, &metadata) {
            Ok(Some(file)) => push_unique(&mut files, file),
            Ok(None) => {}
            Err(e) => tracing::warn!("{}", e),
        }
    }

    for video in &detail.videos {
        if !video.is_complete() {
            continue;
        }
        if let Some(url) = video.url() {
            let name = video.name.clone().unwrap_or_default();
            push_unique(&mut files, FileRef { name, url });
        }
    }

    record.files = files;
    record
}
