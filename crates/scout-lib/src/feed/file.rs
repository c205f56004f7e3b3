//! Local snapshot source

use super::{parse_feed, ListingSource};
use crate::error::{Result, ScoutError};
use crate::models::Listing;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Reads a previously saved feed document from disk
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ListingSource for FileSource {
    async fn fetch(&self) -> Result<Vec<Listing>> {
        let document = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ScoutError::Io {
                path: self.path.clone(),
                source,
            })?;

        parse_feed(&document)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
