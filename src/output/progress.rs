//! Progress bar utilities.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Create a spinner for long-running operations.
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}

/// Create a progress bar for one file transfer.
pub fn create_download_bar(total: u64, name: &str) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {msg:30!} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );
    bar.set_message(name.to_string());
    bar
}

/// Bars for the concurrent transfers of a post, stacked in one display.
#[derive(Debug, Clone)]
pub struct TransferProgress {
    multi: MultiProgress,
    enabled: bool,
}

impl TransferProgress {
    pub fn new(enabled: bool) -> Self {
        let multi = if enabled {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };
        Self { multi, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// A new bar for `name`, or `None` when progress is disabled.
    pub fn file_bar(&self, name: &str) -> Option<ProgressBar> {
        self.enabled
            .then(|| self.multi.add(create_download_bar(0, name)))
    }
}
