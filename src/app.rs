//! Wiring: configuration → file-backed collaborators → pipeline → publish.

use crate::export::{artifact_name, render_json, ExportOptions};
use actlog_core::config::Config;
use actlog_core::pipeline::{Pipeline, PipelineSettings, RunReport};
use actlog_core::source::{ArtifactPublisher, SubscriptionLister};
use actlog_core::StartPosition;
use actlog_sources::{
    DiscoveringSubscriptionLister, FileDirectoryFactory, FileStreamFactory, FsArtifactPublisher,
    StaticSubscriptionLister,
};
use anyhow::Context;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Command-line values layered over the loaded [`Config`].
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub events_dir: Option<PathBuf>,
    pub directory_dir: Option<PathBuf>,
    pub subscriptions: Vec<String>,
    pub max_duration: Option<Duration>,
    pub max_events: Option<usize>,
    pub start_position: Option<StartPosition>,
    pub follow: bool,
    pub output_dir: Option<PathBuf>,
}

impl Overrides {
    pub fn apply(self, cfg: &mut Config) {
        if let Some(dir) = self.events_dir {
            cfg.sources.events_dir = dir;
        }
        if let Some(dir) = self.directory_dir {
            cfg.sources.directory_dir = dir;
        }
        if !self.subscriptions.is_empty() {
            cfg.sources.subscriptions = self.subscriptions;
        }
        if let Some(d) = self.max_duration {
            cfg.collection.max_duration_ms = d.as_millis().try_into().unwrap_or(u64::MAX);
        }
        if let Some(n) = self.max_events {
            cfg.collection.max_events = n;
        }
        if let Some(pos) = self.start_position {
            cfg.collection.start_position = pos;
        }
        if self.follow {
            cfg.sources.follow = true;
        }
        if let Some(dir) = self.output_dir {
            cfg.report.output_dir = dir;
        }
    }
}

#[derive(Debug)]
pub struct RunOutput {
    pub report: RunReport,
    /// Where the JSON report was published, when publishing was requested.
    pub artifact: Option<String>,
}

/// Run every configured subscription through the pipeline and, if `publish`
/// is set, write the JSON report to `report.output_dir`.
pub async fn run(cfg: &Config, cancel: CancellationToken, publish: bool) -> anyhow::Result<RunOutput> {
    cfg.validate()?;

    let streams = FileStreamFactory::new(&cfg.sources.events_dir).follow(cfg.sources.follow);
    let directories = FileDirectoryFactory::new(&cfg.sources.directory_dir);
    let lister: Box<dyn SubscriptionLister> = if cfg.sources.subscriptions.is_empty() {
        Box::new(DiscoveringSubscriptionLister::new(&cfg.sources.events_dir))
    } else {
        Box::new(StaticSubscriptionLister::new(cfg.sources.subscriptions.iter().cloned()))
    };

    let pipeline = Pipeline::new(streams, directories, PipelineSettings::from(cfg))
        .with_cancel_token(cancel);
    let report = pipeline
        .run_listed(lister.as_ref())
        .await
        .context("listing subscriptions")?;

    let artifact = if publish {
        let opts = ExportOptions::from(&cfg.report);
        let body = render_json(&report, &opts).context("rendering report")?;
        let name = artifact_name(&cfg.report.name_prefix, report.finished_at);
        let location = FsArtifactPublisher::new(&cfg.report.output_dir)
            .publish(&name, body.into_bytes())
            .await
            .with_context(|| format!("publishing {name}"))?;
        info!(location = %location, "report published");
        Some(location)
    } else {
        None
    };

    Ok(RunOutput { report, artifact })
}
