//! Error types for the kc-downloader application.

use thiserror::Error;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // Input validation errors
    #[error("Invalid fetch mode: '{0}'")]
    InvalidFetchMode(String),

    #[error("Unsupported domain: {0}")]
    UnsupportedDomain(String),

    #[error("Invalid link: {0}")]
    InvalidLink(String),

    #[error("Malformed attachment metadata: {0}")]
    MalformedAttachment(String),

    #[error("Post {0} is not in the snapshot")]
    PostNotFound(String),

    // API / network errors
    #[error("Rate limited (HTTP {0})")]
    RateLimited(u16),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    // Collection errors
    #[error("{pending} post(s) could not be fetched (rate limited); collected data was kept, please retry")]
    CollectionIncomplete { pending: usize },

    // Download errors
    #[error("Integrity check failed: expected {expected} bytes, received {actual}")]
    Integrity { expected: u64, actual: u64 },

    #[error("Filesystem error: {0}")]
    Filesystem(String),

    #[error("Operation cancelled")]
    Cancelled,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure classes used for reporting and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Validation,
    Integrity,
    Filesystem,
    Collection,
    Cancelled,
    Other,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::RateLimited(_)
            | Error::HttpStatus { .. }
            | Error::Network(_)
            | Error::Api(_)
            | Error::Http(_) => ErrorKind::Network,
            Error::Config(_)
            | Error::ConfigValidation { .. }
            | Error::InvalidFetchMode(_)
            | Error::UnsupportedDomain(_)
            | Error::InvalidLink(_)
            | Error::MalformedAttachment(_)
            | Error::PostNotFound(_)
            | Error::UrlParse(_)
            | Error::TomlParse(_) => ErrorKind::Validation,
            Error::Integrity { .. } => ErrorKind::Integrity,
            Error::Filesystem(_) | Error::Io(_) => ErrorKind::Filesystem,
            Error::CollectionIncomplete { .. } => ErrorKind::Collection,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Json(_) => ErrorKind::Other,
        }
    }

    /// Whether this error is a rate-limit response worth backing off for.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Error::RateLimited(_))
    }
}

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const API_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const DOWNLOAD_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
    pub const SOME_POSTS_FAILED: i32 = 6;
    pub const COLLECTION_INCOMPLETE: i32 = 7;
    pub const CANCELLED: i32 = 130;
}
