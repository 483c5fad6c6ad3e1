//! Resource directory snapshots read from `<directory_dir>/<subscription>.json`.
//!
//! The file holds a JSON array of resources:
//!
//! ```json
//! [{"id": "/subscriptions/s/resourceGroups/rg/providers/x/vm1", "resourceGroup": "rg", "location": "westeurope", "tags": {"env": "prod"}}]
//! ```

use crate::{file_in, open_error};
use actlog_core::source::DirectoryFactory;
use actlog_core::{ResourceMetadata, SourceError};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FileDirectoryFactory {
    dir: PathBuf,
}

impl FileDirectoryFactory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn read(&self, subscription_id: &str) -> Result<Vec<ResourceMetadata>, SourceError> {
        let path = file_in(&self.dir, subscription_id, "json")?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| open_error(&path, e))?;
        let entries: Vec<DirectoryEntry> = serde_json::from_slice(&bytes)
            .map_err(|e| SourceError::Parse(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), resources = entries.len(), "resource directory loaded");
        Ok(entries.into_iter().map(ResourceMetadata::from).collect())
    }
}

impl DirectoryFactory for FileDirectoryFactory {
    fn fetch<'a>(
        &'a self,
        subscription_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ResourceMetadata>, SourceError>> {
        self.read(subscription_id).boxed()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectoryEntry {
    #[serde(alias = "resourceId")]
    id: String,
    #[serde(default)]
    resource_group: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    tags: Option<BTreeMap<String, String>>,
}

impl From<DirectoryEntry> for ResourceMetadata {
    fn from(entry: DirectoryEntry) -> Self {
        ResourceMetadata {
            resource_id: entry.id,
            resource_group: entry.resource_group,
            location: entry.location,
            tags: entry.tags.unwrap_or_default(),
        }
    }
}
