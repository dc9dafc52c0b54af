//! Configuration structures and loading logic.

use crate::config::modes::{ListingEndpoint, PostFolderName, Site};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Main configuration structure.
///
/// Built once at startup and handed to every component by reference. Use
/// [`Config::reload`] to obtain a fresh value instead of mutating a shared one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub domains: DomainsConfig,

    #[serde(default)]
    pub options: OptionsConfig,
}

/// Hostnames of the two platforms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainsConfig {
    #[serde(default = "default_kemono_domain")]
    pub kemono: String,

    #[serde(default = "default_coomer_domain")]
    pub coomer: String,
}

/// Collection and download options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Base directory for downloads.
    #[serde(default)]
    pub download_directory: Option<PathBuf>,

    /// Keep posts that carry no files.
    #[serde(default)]
    pub get_empty_posts: bool,

    /// Download posts from the oldest one first.
    #[serde(default)]
    pub process_from_oldest: bool,

    /// Probe existing files and skip those whose size matches.
    #[serde(default = "default_true")]
    pub skip_existed_files: bool,

    /// Skip posts whose folder already holds every expected file.
    #[serde(default = "default_true")]
    pub skip_complete_posts: bool,

    /// Post folder naming scheme.
    #[serde(default)]
    pub post_folder_name: PostFolderName,

    /// Page listing endpoint.
    #[serde(default)]
    pub listing: ListingEndpoint,

    /// Concurrent file transfers per post.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Pause between posts during downloads.
    #[serde(default = "default_post_delay_ms")]
    pub post_delay_ms: u64,

    /// Pause before each post detail request.
    #[serde(default = "default_detail_delay_ms")]
    pub detail_delay_ms: u64,

    /// Retries after a rate-limited response.
    #[serde(default = "default_rate_limit_retries")]
    pub rate_limit_retries: u32,

    /// Backoff unit; retry `n` waits `unit * 5^n`.
    #[serde(default = "default_backoff_unit_ms")]
    pub backoff_unit_ms: u64,

    /// Timeout for size probes.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Connection timeout for every request.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Longest wait for a response to start arriving.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Longest stall tolerated between two chunks of a transfer.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Whether to show transfer progress bars.
    #[serde(default = "default_true")]
    pub show_progress: bool,

    /// Directory holding cached post details.
    #[serde(default = "default_cache_directory")]
    pub cache_directory: PathBuf,

    /// File listing links with outstanding failed downloads.
    #[serde(default = "default_ledger_file")]
    pub ledger_file: PathBuf,

    /// Browser user agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for DomainsConfig {
    fn default() -> Self {
        Self {
            kemono: default_kemono_domain(),
            coomer: default_coomer_domain(),
        }
    }
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            download_directory: None,
            get_empty_posts: false,
            process_from_oldest: false,
            skip_existed_files: true,
            skip_complete_posts: true,
            post_folder_name: PostFolderName::default(),
            listing: ListingEndpoint::default(),
            workers: default_workers(),
            post_delay_ms: default_post_delay_ms(),
            detail_delay_ms: default_detail_delay_ms(),
            rate_limit_retries: default_rate_limit_retries(),
            backoff_unit_ms: default_backoff_unit_ms(),
            probe_timeout_secs: default_probe_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            show_progress: true,
            cache_directory: default_cache_directory(),
            ledger_file: default_ledger_file(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_kemono_domain() -> String {
    "kemono.su".to_string()
}

fn default_coomer_domain() -> String {
    "coomer.su".to_string()
}

fn default_true() -> bool {
    true
}

fn default_workers() -> usize {
    3
}

fn default_post_delay_ms() -> u64 {
    2000
}

fn default_detail_delay_ms() -> u64 {
    1000
}

fn default_rate_limit_retries() -> u32 {
    3
}

fn default_backoff_unit_ms() -> u64 {
    1000
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    60
}

fn default_idle_timeout() -> u64 {
    60
}

fn default_cache_directory() -> PathBuf {
    PathBuf::from("temp_json")
}

fn default_ledger_file() -> PathBuf {
    PathBuf::from("failed_downloads.txt")
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:135.0) Gecko/20100101 Firefox/135.0".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Read the file again and return a new configuration value.
    pub fn reload(path: &Path) -> Result<Self> {
        Self::load(path)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the effective download directory.
    pub fn download_directory(&self) -> PathBuf {
        self.options
            .download_directory
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

impl DomainsConfig {
    /// Hostname configured for a site.
    pub fn domain(&self, site: Site) -> &str {
        match site {
            Site::Kemono => &self.kemono,
            Site::Coomer => &self.coomer,
        }
    }

    /// Map a host (optionally with `:port`) to its site.
    ///
    /// Subdomains of a configured domain belong to it, so file servers such
    /// as `n1.kemono.su` resolve to the same site as `kemono.su`.
    pub fn site_for_host(&self, host: &str) -> Option<Site> {
        let host = host.to_ascii_lowercase();
        Site::ALL.into_iter().find(|site| {
            let domain = self.domain(*site).to_ascii_lowercase();
            host == domain || host.ends_with(&format!(".{}", domain))
        })
    }

    /// Whether a URL points at one of the two configured platforms.
    pub fn is_allowed(&self, url: &Url) -> bool {
        url_authority(url)
            .map(|authority| self.site_for_host(&authority).is_some())
            .unwrap_or(false)
    }

    /// Every configured hostname.
    pub fn all(&self) -> Vec<&str> {
        Site::ALL.iter().map(|site| self.domain(*site)).collect()
    }
}

impl OptionsConfig {
    pub fn post_delay(&self) -> Duration {
        Duration::from_millis(self.post_delay_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Host of a URL, with the port appended when one is given explicitly.
pub fn url_authority(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
