//! Download orchestration.
//!
//! Posts are handled one after another; the files of a post are fetched by a
//! small pool of concurrent workers. The failure ledger is updated once per
//! post, after every file outcome is known.

use std::path::Path;

use futures::stream::{self, StreamExt};
use reqwest::Client;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::collect::{PostRecord, ProfileSnapshot};
use crate::config::Config;
use crate::download::files::{plan_files, PlannedFile};
use crate::download::state::{DownloadResult, LedgerAction, PostStage};
use crate::download::transfer::Transfer;
use crate::error::{Error, Result};
use crate::fs::paths::{count_existing_files, create_post_folder, resolve_post_folder};
use crate::ledger::FailureLedger;
use crate::output::{print_post_result, TransferProgress};

/// Outcome of a single file.
#[derive(Debug)]
enum FileOutcome {
    Downloaded(u64),
    AlreadyComplete,
    Rejected,
    NotStarted,
    Failed(Error),
}

/// Downloads posts into the local layout and keeps the ledger current.
pub struct Downloader<'a> {
    pub(crate) config: &'a Config,
    transfer: Transfer,
    ledger: FailureLedger,
    progress: TransferProgress,
    pub(crate) cancel: CancellationToken,
}

impl<'a> Downloader<'a> {
    pub fn new(config: &'a Config, client: Client, cancel: CancellationToken) -> Self {
        Self {
            config,
            transfer: Transfer::new(client, &config.options),
            ledger: FailureLedger::new(&config.options.ledger_file),
            progress: TransferProgress::new(config.options.show_progress),
            cancel,
        }
    }

    pub fn ledger(&self) -> &FailureLedger {
        &self.ledger
    }

    /// Download every post of a snapshot, or only `only_post`.
    pub async fn download_all(
        &self,
        snapshot: &ProfileSnapshot,
        posts_dir: &Path,
        only_post: Option<&str>,
    ) -> Result<Vec<DownloadResult>> {
        let mut posts: Vec<&PostRecord> = match only_post {
            Some(id) => vec![snapshot
                .find(id)
                .ok_or_else(|| Error::PostNotFound(id.to_string()))?],
            None => snapshot.posts.iter().collect(),
        };
        if self.config.options.process_from_oldest {
            posts.reverse();
        }

        let total = posts.len();
        let mut results = Vec::with_capacity(total);
        let mut needs_pause = false;

        for (i, post) in posts.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::warn!("Cancelled, {} post(s) not processed", total - i);
                break;
            }
            if needs_pause {
                self.pause_between_posts().await;
            }

            tracing::info!("Post {}/{}: {} {}", i + 1, total, post.id, post.title);
            let result = self.download_post(post, posts_dir).await;
            print_post_result(&result);

            needs_pause = !result.skipped_complete && result.total_files > 0;
            results.push(result);
        }

        Ok(results)
    }

    pub(crate) async fn pause_between_posts(&self) {
        let delay = self.config.options.post_delay();
        if delay.is_zero() {
            return;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = sleep(delay) => {}
        }
    }

    /// Download one post into `posts_dir` and update the ledger.
    pub async fn download_post(&self, post: &PostRecord, posts_dir: &Path) -> DownloadResult {
        let mut result = DownloadResult::new(&post.id, &post.link);

        let folder = resolve_post_folder(
            posts_dir,
            &post.id,
            &post.title,
            self.config.options.post_folder_name,
        );
        result.advance(PostStage::FolderResolved);

        let planned = plan_files(&post.files);
        result.total_files = planned.len();
        result.advance(PostStage::FilesEnumerated);

        if self.config.options.skip_complete_posts
            && !planned.is_empty()
            && count_existing_files(&folder) >= planned.len()
        {
            tracing::debug!("{} already holds {} files", folder.display(), planned.len());
            result.skipped_complete = true;
            result.successful = planned.len();
            result.skipped = planned.len();
            result.finish();
            self.update_ledger(&result);
            return result;
        }

        result.advance(PostStage::Downloading);

        let folder = match create_post_folder(posts_dir, &post.id, &folder) {
            Ok(folder) => folder,
            Err(e) => {
                tracing::error!("{}", e);
                for file in &planned {
                    result.record_failure(&file.file_name, &file.url, &e.to_string());
                }
                result.finish();
                self.update_ledger(&result);
                return result;
            }
        };

        let folder = folder.as_path();
        let mut outcomes: Vec<(&PlannedFile, FileOutcome)> = stream::iter(planned.iter())
            .map(|file| async move { (file, self.download_file(folder, file).await) })
            .buffer_unordered(self.config.options.workers.max(1))
            .collect()
            .await;
        outcomes.sort_by_key(|(file, _)| file.index);

        for (file, outcome) in outcomes {
            match outcome {
                FileOutcome::Downloaded(bytes) => {
                    tracing::debug!("Downloaded {} ({} bytes)", file.file_name, bytes);
                    result.record_success(false);
                }
                FileOutcome::AlreadyComplete => {
                    tracing::debug!("Skipped (complete): {}", file.file_name);
                    result.record_success(true);
                }
                FileOutcome::Rejected => result.record_rejected(&file.url),
                FileOutcome::NotStarted => result.record_not_started(),
                FileOutcome::Failed(e) => {
                    tracing::warn!("Download failed {}: {}", file.url, e);
                    result.record_failure(&file.file_name, &file.url, &e.to_string());
                }
            }
        }

        result.finish();
        self.update_ledger(&result);
        result
    }

    async fn download_file(&self, folder: &Path, file: &PlannedFile) -> FileOutcome {
        if self.cancel.is_cancelled() {
            return FileOutcome::NotStarted;
        }

        let url = match Url::parse(&file.url) {
            Ok(url) => url,
            Err(e) => return FileOutcome::Failed(e.into()),
        };
        if !self.config.domains.is_allowed(&url) {
            tracing::warn!(
                "Ignoring url outside the allowed domains ({}): {}",
                self.config.domains.all().join(", "),
                file.url
            );
            return FileOutcome::Rejected;
        }

        let dest = folder.join(&file.file_name);
        if self.config.options.skip_existed_files
            && self.transfer.is_complete_on_disk(&file.url, &dest).await
        {
            return FileOutcome::AlreadyComplete;
        }

        let bar = self.progress.file_bar(&file.file_name);
        let outcome = self.transfer.download(&file.url, &dest, bar.as_ref()).await;
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }

        match outcome {
            Ok(bytes) => FileOutcome::Downloaded(bytes),
            Err(e) => FileOutcome::Failed(e),
        }
    }

    fn update_ledger(&self, result: &DownloadResult) {
        let outcome = match result.ledger_action() {
            LedgerAction::Add => self.ledger.add(&result.link).map(|_| ()),
            LedgerAction::Remove => self.ledger.remove(&result.link).map(|_| ()),
            LedgerAction::Keep => Ok(()),
        };
        if let Err(e) = outcome {
            tracing::warn!("Could not update {}: {}", self.ledger.path().display(), e);
        }
    }
}
