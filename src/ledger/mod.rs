//! Failure ledger: links with at least one file left undownloaded.
//!
//! Stored as a sorted, newline-delimited text file. A missing file is an
//! empty ledger. Every mutation reads the file, applies the change and
//! writes it back; only one process is expected to use a ledger at a time.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct FailureLedger {
    path: PathBuf,
}

impl FailureLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current entries, sorted.
    pub fn load(&self) -> Result<BTreeSet<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeSet::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entries: &BTreeSet<String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut content = String::new();
        for entry in entries {
            content.push_str(entry);
            content.push('\n');
        }
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Record a failing link. Returns whether it was newly added.
    pub fn add(&self, link: &str) -> Result<bool> {
        let mut entries = self.load()?;
        let added = entries.insert(link.trim().to_string());
        self.save(&entries)?;
        Ok(added)
    }

    /// Clear a link. Returns whether it was present.
    pub fn remove(&self, link: &str) -> Result<bool> {
        let mut entries = self.load()?;
        let removed = entries.remove(link.trim());
        if removed || self.path.exists() {
            self.save(&entries)?;
        }
        Ok(removed)
    }

    pub fn contains(&self, link: &str) -> Result<bool> {
        Ok(self.load()?.contains(link.trim()))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.load()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINK_A: &str = "https://kemono.su/patreon/user/1/post/10";
    const LINK_B: &str = "https://kemono.su/patreon/user/1/post/20";

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FailureLedger::new(dir.path().join("failed.txt"));
        assert!(ledger.load().unwrap().is_empty());
        assert!(!ledger.remove(LINK_A).unwrap());
        assert!(!ledger.path().exists());
    }

    #[test]
    fn test_add_then_remove_restores_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FailureLedger::new(dir.path().join("failed.txt"));
        ledger.add(LINK_B).unwrap();
        let before = std::fs::read_to_string(ledger.path()).unwrap();

        ledger.add(LINK_A).unwrap();
        ledger.remove(LINK_A).unwrap();

        assert_eq!(std::fs::read_to_string(ledger.path()).unwrap(), before);
    }

    #[test]
    fn test_add_is_idempotent_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FailureLedger::new(dir.path().join("failed.txt"));

        assert!(ledger.add(LINK_B).unwrap());
        assert!(ledger.add(LINK_A).unwrap());
        assert!(!ledger.add(LINK_A).unwrap());

        let content = std::fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(content, format!("{}\n{}\n", LINK_A, LINK_B));
        assert!(ledger.contains(LINK_B).unwrap());
        assert_eq!(ledger.len().unwrap(), 2);
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failed.txt");
        std::fs::write(&path, format!("\n  {}  \n\n", LINK_A)).unwrap();

        let ledger = FailureLedger::new(&path);
        assert_eq!(ledger.load().unwrap().len(), 1);
        assert!(ledger.contains(LINK_A).unwrap());
    }
}
