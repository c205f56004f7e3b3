//! Error types for the scout library

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScoutError>;

#[derive(Debug, Error)]
pub enum ScoutError {
    /// The feed could not be turned into a listing set
    #[error("malformed dataset: {reason}")]
    MalformedDataset { reason: String },

    #[error("failed to fetch listing feed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("feed request to {url} returned HTTP {status}")]
    HttpStatus { status: u16, url: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A newer refresh aborted this one before it completed
    #[error("refresh superseded by a newer request")]
    Superseded,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ScoutError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        ScoutError::MalformedDataset {
            reason: reason.into(),
        }
    }

    /// Returns true when the error only means a newer refresh won
    pub fn is_superseded(&self) -> bool {
        matches!(self, ScoutError::Superseded)
    }
}
