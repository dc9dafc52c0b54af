//! Per-post download results and run totals.

use serde::Serialize;

/// Progress of one post through the orchestrator. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStage {
    #[default]
    Pending,
    FolderResolved,
    FilesEnumerated,
    Downloading,
    Complete,
    Partial,
}

impl PostStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PostStage::Complete | PostStage::Partial)
    }
}

/// A file that could not be downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub name: String,
    pub url: String,
    pub error: String,
}

/// What a post's outcome means for the failure ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerAction {
    Add,
    Remove,
    Keep,
}

/// Aggregate outcome of downloading one post.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DownloadResult {
    pub post_id: String,
    pub link: String,
    pub total_files: usize,
    /// Files present on disk after this run, transferred or verified.
    pub successful: usize,
    /// Subset of `successful` that needed no transfer.
    pub skipped: usize,
    pub failed: Vec<FailedFile>,
    /// Urls ignored because they point outside the allowed domains.
    pub rejected: Vec<String>,
    /// Files never started because the run was cancelled.
    pub not_started: usize,
    /// The whole post was skipped because its folder was already complete.
    pub skipped_complete: bool,
    pub stage: PostStage,
}

impl DownloadResult {
    pub fn new(post_id: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            link: link.into(),
            ..Default::default()
        }
    }

    /// Move to `next`. Backward moves are ignored.
    pub fn advance(&mut self, next: PostStage) {
        if next > self.stage && !self.stage.is_terminal() {
            self.stage = next;
        }
    }

    pub fn record_success(&mut self, skipped: bool) {
        self.successful += 1;
        if skipped {
            self.skipped += 1;
        }
    }

    pub fn record_failure(&mut self, name: &str, url: &str, error: &str) {
        self.failed.push(FailedFile {
            name: name.to_string(),
            url: url.to_string(),
            error: error.to_string(),
        });
    }

    pub fn record_rejected(&mut self, url: &str) {
        self.rejected.push(url.to_string());
    }

    pub fn record_not_started(&mut self) {
        self.not_started += 1;
    }

    /// Settle the terminal stage once every file has an outcome.
    pub fn finish(&mut self) {
        let stage = if self.failed.is_empty() && self.not_started == 0 {
            PostStage::Complete
        } else {
            PostStage::Partial
        };
        self.advance(stage);
    }

    pub fn is_complete(&self) -> bool {
        self.stage == PostStage::Complete
    }

    /// Ledger update implied by the observed outcomes.
    ///
    /// Any failed file marks the link. The link is cleared only when every
    /// file was accounted for; a cancelled post without failures leaves the
    /// ledger untouched.
    pub fn ledger_action(&self) -> LedgerAction {
        if !self.failed.is_empty() {
            LedgerAction::Add
        } else if self.not_started == 0 {
            LedgerAction::Remove
        } else {
            LedgerAction::Keep
        }
    }
}

/// Totals over a whole run.
#[derive(Debug, Default, Clone)]
pub struct RunTotals {
    pub posts: u64,
    pub posts_complete: u64,
    pub posts_partial: u64,
    pub posts_skipped_complete: u64,
    pub posts_errored: u64,
    pub files_total: u64,
    pub files_downloaded: u64,
    pub files_skipped: u64,
    pub files_failed: u64,
    pub files_rejected: u64,
}

impl RunTotals {
    pub fn add(&mut self, result: &DownloadResult) {
        self.posts += 1;
        if result.is_complete() {
            self.posts_complete += 1;
        } else {
            self.posts_partial += 1;
        }
        if result.skipped_complete {
            self.posts_skipped_complete += 1;
        }
        self.files_total += result.total_files as u64;
        self.files_downloaded += (result.successful - result.skipped) as u64;
        self.files_skipped += result.skipped as u64;
        self.files_failed += result.failed.len() as u64;
        self.files_rejected += result.rejected.len() as u64;
    }

    /// A post that could not even be prepared (e.g. its detail fetch failed).
    pub fn mark_errored(&mut self) {
        self.posts += 1;
        self.posts_errored += 1;
    }

    pub fn has_failures(&self) -> bool {
        self.posts_partial > 0 || self.posts_errored > 0
    }
}
