//! Path and directory management.
//!
//! Layout: `{download_dir}/{site}/{name}-{service}-{id}/posts/{post_folder}/`.

use std::path::{Path, PathBuf};

use crate::config::{Config, PostFolderName, Site};
use crate::error::{Error, Result};
use crate::fs::naming::{sanitize_folder_name, sanitize_title, truncate_utf8};

/// Name of the folder holding per-post folders.
pub const POSTS_DIR: &str = "posts";

/// Suffix of files still being transferred.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Longest title part of a post folder name, in UTF-8 bytes.
pub const MAX_TITLE_BYTES: usize = 100;

/// Top-level folder of a site.
pub fn site_dir(config: &Config, site: Site) -> PathBuf {
    config.download_directory().join(site.dir_name())
}

/// Folder name of a creator: `{name}-{service}-{id}`.
pub fn artist_dir_name(name: &str, service: &str, user_id: &str) -> String {
    format!(
        "{}-{}-{}",
        sanitize_folder_name(name),
        sanitize_folder_name(service),
        sanitize_folder_name(user_id)
    )
}

/// Folder of a creator.
pub fn artist_dir(config: &Config, site: Site, name: &str, service: &str, user_id: &str) -> PathBuf {
    site_dir(config, site).join(artist_dir_name(name, service, user_id))
}

/// Folder holding the post folders that belong next to a snapshot file.
pub fn posts_dir_for_snapshot(snapshot_path: &Path) -> PathBuf {
    snapshot_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(POSTS_DIR)
}

/// Folder name of a post under the configured naming scheme.
pub fn post_folder_name(post_id: &str, title: &str, naming: PostFolderName) -> String {
    let id = sanitize_folder_name(post_id);
    match naming {
        PostFolderName::Id => id,
        PostFolderName::Title => {
            let title = sanitize_title(title);
            let title = truncate_utf8(&title, MAX_TITLE_BYTES).trim_end();
            if title.is_empty() {
                id
            } else {
                format!("{}_{}", id, title)
            }
        }
    }
}

/// Resolve the folder of a post, migrating a legacy id-only folder.
///
/// When titles are used and only the `{id}` folder exists, it is renamed in
/// place so its files are not downloaded again. A failed rename keeps the
/// legacy folder.
pub fn resolve_post_folder(
    posts_dir: &Path,
    post_id: &str,
    title: &str,
    naming: PostFolderName,
) -> PathBuf {
    let target = posts_dir.join(post_folder_name(post_id, title, naming));
    let legacy = id_folder(posts_dir, post_id);

    if target == legacy || target.exists() || !legacy.is_dir() {
        return target;
    }

    match std::fs::rename(&legacy, &target) {
        Ok(()) => {
            tracing::info!(
                "Renamed post folder {} -> {}",
                legacy.display(),
                target.display()
            );
            target
        }
        Err(e) => {
            tracing::warn!(
                "Could not rename {} to {}: {}; keeping the old folder",
                legacy.display(),
                target.display(),
                e
            );
            legacy
        }
    }
}

fn id_folder(posts_dir: &Path, post_id: &str) -> PathBuf {
    posts_dir.join(sanitize_folder_name(post_id))
}

/// Create the resolved folder of a post.
///
/// If a title folder cannot be created, the id-only folder is used instead.
/// Returns the folder that now exists.
pub fn create_post_folder(posts_dir: &Path, post_id: &str, folder: &Path) -> Result<PathBuf> {
    let first = match ensure_dir(folder) {
        Ok(()) => return Ok(folder.to_path_buf()),
        Err(e) => e,
    };

    let fallback = id_folder(posts_dir, post_id);
    if fallback == folder {
        return Err(Error::Filesystem(format!(
            "cannot create {}: {}",
            folder.display(),
            first
        )));
    }

    tracing::warn!(
        "Cannot create {}: {}; using {}",
        folder.display(),
        first,
        fallback.display()
    );
    ensure_dir(&fallback).map_err(|e| {
        Error::Filesystem(format!("cannot create {}: {}", fallback.display(), e))
    })?;
    Ok(fallback)
}

/// Number of finished files directly inside `dir` (0 if it does not exist).
pub fn count_existing_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
                .filter(|entry| !entry.file_name().to_string_lossy().ends_with(PARTIAL_SUFFIX))
                .count()
        })
        .unwrap_or(0)
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artist_dir() {
        let mut config = Config::default();
        config.options.download_directory = Some(PathBuf::from("/downloads"));

        let path = artist_dir(&config, Site::Kemono, "AC/DC", "patreon", "42");
        assert_eq!(path, PathBuf::from("/downloads/kemono/AC_DC-patreon-42"));
    }

    #[test]
    fn test_post_folder_name() {
        assert_eq!(post_folder_name("7", "Hello: World", PostFolderName::Id), "7");
        assert_eq!(
            post_folder_name("7", "Hello: World", PostFolderName::Title),
            "7_Hello_ World"
        );
        assert_eq!(post_folder_name("7", "...", PostFolderName::Title), "7____");
        assert_eq!(post_folder_name("7", "  ", PostFolderName::Title), "7");
    }

    #[test]
    fn test_long_title_is_capped() {
        let name = post_folder_name("7", &"T".repeat(300), PostFolderName::Title);
        assert_eq!(name, format!("7_{}", "T".repeat(MAX_TITLE_BYTES)));

        let name = post_folder_name("7", &"題".repeat(300), PostFolderName::Title);
        let title = name.strip_prefix("7_").unwrap();
        assert!(title.len() <= MAX_TITLE_BYTES);
        assert!(title.chars().all(|c| c == '題'));
    }

    #[test]
    fn test_create_post_folder_falls_back_to_id() {
        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("7_Title");
        std::fs::write(&blocked, b"not a folder").unwrap();

        let created = create_post_folder(dir.path(), "7", &blocked).unwrap();
        assert_eq!(created, dir.path().join("7"));
        assert!(created.is_dir());
    }

    #[test]
    fn test_create_post_folder_reports_filesystem_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("7");
        std::fs::write(&blocked, b"not a folder").unwrap();

        let err = create_post_folder(dir.path(), "7", &blocked).unwrap_err();
        assert!(matches!(err, Error::Filesystem(_)));
    }

    #[test]
    fn test_resolve_post_folder_migrates_legacy() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = dir.path().join("7");
        std::fs::create_dir_all(&legacy).unwrap();
        std::fs::write(legacy.join("1-a.png"), b"x").unwrap();

        let resolved = resolve_post_folder(dir.path(), "7", "Title", PostFolderName::Title);
        assert_eq!(resolved, dir.path().join("7_Title"));
        assert!(resolved.join("1-a.png").exists());
        assert!(!legacy.exists());
    }

    #[test]
    fn test_resolve_post_folder_keeps_existing_target() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("7")).unwrap();
        std::fs::create_dir_all(dir.path().join("7_Title")).unwrap();

        let resolved = resolve_post_folder(dir.path(), "7", "Title", PostFolderName::Title);
        assert_eq!(resolved, dir.path().join("7_Title"));
        assert!(dir.path().join("7").exists());
    }

    #[test]
    fn test_resolve_post_folder_id_mode() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_post_folder(dir.path(), "7", "Title", PostFolderName::Id);
        assert_eq!(resolved, dir.path().join("7"));
    }

    #[test]
    fn test_count_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(count_existing_files(&dir.path().join("missing")), 0);
        std::fs::write(dir.path().join("a"), b"1").unwrap();
        std::fs::write(dir.path().join("b"), b"2").unwrap();
        std::fs::write(dir.path().join("c.png.part"), b"3").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        assert_eq!(count_existing_files(dir.path()), 2);
    }
}
