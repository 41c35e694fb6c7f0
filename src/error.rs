//! IPCRAE error types

use std::path::PathBuf;
use thiserror::Error;

/// IPCRAE error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Knowledge domain is empty after normalization
    #[error("Invalid knowledge domain: expected a non-empty domain (letters/numbers/_/-).")]
    InvalidDomain,

    /// Knowledge tag set is empty after normalization
    #[error(
        "Invalid knowledge tags: provide at least one tag (letters/numbers/_/- after normalization)."
    )]
    InvalidTags,

    /// Strict knowledge write without any source path
    #[error("Invalid knowledge sources: at least one source path is required in strict mode.")]
    MissingSources,

    /// Note text is empty after trimming
    #[error("Empty text: {0}")]
    EmptyText(String),

    /// A required path argument was empty
    #[error("Missing path: {0}")]
    MissingPath(String),

    /// Promoted local note has no body left after stripping
    #[error("Local note is empty: {}", .0.display())]
    EmptyNote(PathBuf),

    /// Multi-file commit stopped part-way
    #[error(
        "Partial commit: failed writing {} after {} file(s) written: {message}",
        failed.display(),
        written.len()
    )]
    PartialCommit {
        /// Files already replaced before the failure
        written: Vec<PathBuf>,
        /// File whose write failed
        failed: PathBuf,
        /// Underlying failure message
        message: String,
    },

    /// Stable write denied by the write policy
    #[error("{0}")]
    WriteBlocked(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether this error comes from input validation rather than I/O
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidDomain
                | Error::InvalidTags
                | Error::MissingSources
                | Error::EmptyText(_)
                | Error::MissingPath(_)
                | Error::EmptyNote(_)
        )
    }
}

/// Result type alias for IPCRAE operations
pub type Result<T> = std::result::Result<T, Error>;
