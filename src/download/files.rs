//! File enumeration for a post.

use crate::collect::{push_unique, FileRef};
use crate::fs::naming::numbered_file_name;

/// A file scheduled for download with its stable on-disk name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    /// 1-based position within the post.
    pub index: usize,
    pub original_name: String,
    pub url: String,
    pub file_name: String,
}

/// Deduplicate by url and assign `{index}-{name}{ext}` names.
pub fn plan_files(files: &[FileRef]) -> Vec<PlannedFile> {
    let mut unique = Vec::with_capacity(files.len());
    for file in files {
        push_unique(&mut unique, file.clone());
    }

    unique
        .into_iter()
        .enumerate()
        .map(|(i, file)| {
            let index = i + 1;
            PlannedFile {
                index,
                file_name: numbered_file_name(index, &file.name, &file.url),
                original_name: file.name,
                url: file.url,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, url: &str) -> FileRef {
        FileRef {
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_plan_files_dedups_and_numbers() {
        let planned = plan_files(&[
            file("cover.jpeg", "https://n1.kemono.su/data/a.jpg"),
            file("again.png", "https://n1.kemono.su/data/a.jpg"),
            file("", "https://n2.kemono.su/data/b.zip"),
        ]);

        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].file_name, "1-cover.jpg");
        assert_eq!(planned[0].original_name, "cover.jpeg");
        assert_eq!(planned[1].index, 2);
        assert_eq!(planned[1].file_name, "2-2.zip");
    }
}
