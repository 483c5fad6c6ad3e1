//! Subscription listers.

use actlog_core::source::SubscriptionLister;
use actlog_core::SourceError;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::PathBuf;

/// A fixed list, usually from `[sources] subscriptions` or `--subscription`.
#[derive(Debug, Clone, Default)]
pub struct StaticSubscriptionLister(Vec<String>);

impl StaticSubscriptionLister {
    pub fn new(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(ids.into_iter().map(Into::into).collect())
    }
}

impl SubscriptionLister for StaticSubscriptionLister {
    fn list(&self) -> BoxFuture<'_, Result<Vec<String>, SourceError>> {
        futures::future::ready(Ok(self.0.clone())).boxed()
    }
}

/// Every `<id>.jsonl` in the events directory, sorted by id.
#[derive(Debug, Clone)]
pub struct DiscoveringSubscriptionLister {
    events_dir: PathBuf,
}

impl DiscoveringSubscriptionLister {
    pub fn new(events_dir: impl Into<PathBuf>) -> Self {
        Self {
            events_dir: events_dir.into(),
        }
    }

    async fn discover(&self) -> Result<Vec<String>, SourceError> {
        let mut entries = tokio::fs::read_dir(&self.events_dir)
            .await
            .map_err(|e| crate::open_error(&self.events_dir, e))?;
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

impl SubscriptionLister for DiscoveringSubscriptionLister {
    fn list(&self) -> BoxFuture<'_, Result<Vec<String>, SourceError>> {
        self.discover().boxed()
    }
}
