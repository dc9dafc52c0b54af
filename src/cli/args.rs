//! Command-line argument definitions using clap.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, PostFolderName};

/// Kemono / coomer post downloader CLI.
#[derive(Parser, Debug)]
#[command(
    name = "kc-downloader",
    version,
    about = "Collect and download posts from kemono and coomer creators",
    long_about = "A CLI tool to collect post metadata from kemono and coomer profiles and \
                  download the attached files.\n\n\
                  Supports whole profiles, page and post-id ranges, single post links, \
                  and retrying previously failed links."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file.
    #[arg(short, long, global = true, default_value = "config.toml", env = "KC_CONFIG")]
    pub config: PathBuf,

    /// Base directory for downloads.
    #[arg(short = 'd', long = "directory", global = true, env = "KC_DOWNLOAD_DIR")]
    pub download_directory: Option<PathBuf>,

    /// Concurrent file transfers per post.
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Download posts starting from the oldest.
    #[arg(long, global = true)]
    pub oldest_first: bool,

    /// Name post folders `{id}_{title}` instead of `{id}`.
    #[arg(long, global = true)]
    pub title_folders: bool,

    /// Always download files, even when a complete copy exists.
    #[arg(long, global = true)]
    pub no_skip_existing: bool,

    /// Keep posts without files when collecting.
    #[arg(long, global = true)]
    pub empty_posts: bool,

    /// Hide transfer progress bars.
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Enable debug logging.
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Collect the posts of a creator profile into a snapshot file.
    Profile(ProfileArgs),

    /// Download individual post links.
    Posts(PostsArgs),

    /// Download the posts listed in a snapshot file.
    Download(DownloadArgs),

    /// Retry every link recorded in the failure ledger.
    RetryFailed,
}

#[derive(ClapArgs, Debug)]
pub struct ProfileArgs {
    /// Profile link, e.g. https://kemono.su/patreon/user/12345
    pub url: String,

    /// Which posts to collect: `all`, a page offset (`50`), an offset range
    /// (`0-150`, `start-end`), a post id, or `id:<a>-<b>`.
    #[arg(short, long, default_value = "all")]
    pub fetch: String,

    /// Download the collected posts right away.
    #[arg(long)]
    pub download: bool,
}

#[derive(ClapArgs, Debug)]
pub struct PostsArgs {
    /// Post links, separated by spaces or commas.
    pub links: Vec<String>,

    /// Text file with more links (comma or whitespace separated).
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct DownloadArgs {
    /// Snapshot file written by the `profile` command.
    pub snapshot: PathBuf,

    /// Download only this post.
    #[arg(long)]
    pub post: Option<String>,
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(&self, config: &mut Config) {
        if let Some(dir) = &self.download_directory {
            config.options.download_directory = Some(dir.clone());
        }

        if let Some(workers) = self.workers {
            config.options.workers = workers;
        }

        // Boolean flags (only override if set to non-default)
        if self.oldest_first {
            config.options.process_from_oldest = true;
        }

        if self.title_folders {
            config.options.post_folder_name = PostFolderName::Title;
        }

        if self.no_skip_existing {
            config.options.skip_existed_files = false;
            config.options.skip_complete_posts = false;
        }

        if self.empty_posts {
            config.options.get_empty_posts = true;
        }

        if self.quiet {
            config.options.show_progress = false;
        }
    }

    /// Short name of the selected command.
    pub fn mode(&self) -> &'static str {
        match self.command {
            Command::Profile(_) => "profile",
            Command::Posts(_) => "posts",
            Command::Download(_) => "download",
            Command::RetryFailed => "retry-failed",
        }
    }
}
