//! Writes report artifacts to a local directory.

use crate::check_name;
use actlog_core::source::ArtifactPublisher;
use actlog_core::SourceError;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct FsArtifactPublisher {
    dir: PathBuf,
}

impl FsArtifactPublisher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn write(&self, name: &str, contents: Vec<u8>) -> Result<String, SourceError> {
        check_name(name)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(name);
        tokio::fs::write(&path, &contents).await?;
        info!(path = %path.display(), bytes = contents.len(), "artifact published");
        Ok(path.display().to_string())
    }
}

impl ArtifactPublisher for FsArtifactPublisher {
    fn publish<'a>(
        &'a self,
        name: &'a str,
        contents: Vec<u8>,
    ) -> BoxFuture<'a, Result<String, SourceError>> {
        self.write(name, contents).boxed()
    }
}
