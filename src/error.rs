//! Error types for library organization, downloads and discovery.

use std::fmt;

use thiserror::Error;

use crate::cleanup::CleanupError;

/// Main error type for all mvorg operations.
#[derive(Debug, Error)]
pub enum OrganizerError {
    /// Video was not found in the catalog or at its source URL.
    #[error("Video not found: {0}")]
    VideoNotFound(String),

    /// Artist was not found in the catalog.
    #[error("Artist not found: {0}")]
    ArtistNotFound(String),

    /// Invalid or missing IMVDb application key.
    #[error("Bad credentials: {0}")]
    BadCredentials(String),

    /// Too many requests - rate limited.
    #[error("Quota exceeded: too many requests")]
    QuotaExceeded,

    /// The source refused the video because of an age gate.
    #[error("Age restricted: {0}")]
    AgeRestricted(String),

    /// No download URL is known for the video.
    #[error("Missing URL: {0}")]
    MissingUrl(String),

    /// The artist/title could not be derived from a name.
    #[error("Malformed title: {0}")]
    MalformedTitle(#[from] CleanupError),

    /// No data returned from API.
    #[error("No data from API: {0}")]
    NoDataApi(String),

    /// Generic API error with message.
    #[error("API error: {0}")]
    ApiError(String),

    /// Migration version is not registered or not applied.
    #[error("Unknown migration: {0}")]
    UnknownMigration(String),

    /// A migration statement failed.
    #[error("Migration {version} failed: {message}")]
    Migration { version: String, message: String },

    /// Invalid configuration value.
    #[error("Config error: {0}")]
    Config(String),

    /// HTTP request failed.
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Config file parsing failed.
    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Directory traversal failed.
    #[error("Scan error: {0}")]
    WalkError(#[from] walkdir::Error),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for mvorg operations.
pub type Result<T> = std::result::Result<T, OrganizerError>;

/// Buckets used when reporting failed downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    AgeRestricted,
    MalformedTitle,
    MissingUrl,
    NotFound,
    Network,
    Filesystem,
    Other,
}

impl FailureCategory {
    /// Short label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            FailureCategory::AgeRestricted => "age-restricted",
            FailureCategory::MalformedTitle => "malformed-title",
            FailureCategory::MissingUrl => "missing-url",
            FailureCategory::NotFound => "not-found",
            FailureCategory::Network => "network",
            FailureCategory::Filesystem => "filesystem",
            FailureCategory::Other => "other",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl OrganizerError {
    /// Classify this error into a reporting bucket.
    pub fn category(&self) -> FailureCategory {
        match self {
            OrganizerError::AgeRestricted(_) => FailureCategory::AgeRestricted,
            OrganizerError::MalformedTitle(_) => FailureCategory::MalformedTitle,
            OrganizerError::MissingUrl(_) => FailureCategory::MissingUrl,
            OrganizerError::VideoNotFound(_) | OrganizerError::ArtistNotFound(_) => {
                FailureCategory::NotFound
            }
            OrganizerError::RequestError(_) | OrganizerError::QuotaExceeded => {
                FailureCategory::Network
            }
            OrganizerError::IoError(_) | OrganizerError::WalkError(_) => {
                FailureCategory::Filesystem
            }
            _ => FailureCategory::Other,
        }
    }
}
