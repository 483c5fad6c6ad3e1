//! Pipeline orchestrator: Collector → Enricher → Aggregator per subscription.
//!
//! One subscription's failure never aborts the run: it is recorded as a
//! [`SubscriptionOutcome::Failed`] in that subscription's slot and the
//! remaining subscriptions are processed as usual.

use crate::aggregator::{summarize, totals, SubscriptionTotals, SummaryTable};
use crate::collector::{CollectBudget, CollectionStats, Collector, StopReason};
use crate::config::Config;
use crate::enricher::{enrich, ResourceDirectory};
use crate::error::{SourceError, SubscriptionError};
use crate::source::{DirectoryFactory, StreamFactory, SubscriptionLister};
use crate::types::{EnrichedEvent, StartPosition};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};

/// Everything computed for one subscription.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionBundle {
    pub subscription_id: String,
    pub enriched_events: Vec<EnrichedEvent>,
    pub operation_summary: SummaryTable,
    pub severity_summary: SummaryTable,
    pub resource_summary: SummaryTable,
    pub totals: SubscriptionTotals,
    pub collection: CollectionStats,
}

/// Pipeline stage at which a subscription failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    OpenStream,
    FetchDirectory,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureStage::OpenStream => write!(f, "open_stream"),
            FailureStage::FetchDirectory => write!(f, "fetch_directory"),
        }
    }
}

/// Failure marker stored in place of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionFailure {
    pub stage: FailureStage,
    pub reason: String,
}

impl From<&SubscriptionError> for SubscriptionFailure {
    fn from(err: &SubscriptionError) -> Self {
        let stage = match err {
            SubscriptionError::StreamUnavailable { .. } => FailureStage::OpenStream,
            SubscriptionError::DirectoryFetchFailure { .. } => FailureStage::FetchDirectory,
        };
        Self {
            stage,
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubscriptionOutcome {
    Complete(Box<SubscriptionBundle>),
    Failed(SubscriptionFailure),
}

impl SubscriptionOutcome {
    pub fn bundle(&self) -> Option<&SubscriptionBundle> {
        match self {
            SubscriptionOutcome::Complete(bundle) => Some(&**bundle),
            SubscriptionOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&SubscriptionFailure> {
        match self {
            SubscriptionOutcome::Complete(_) => None,
            SubscriptionOutcome::Failed(failure) => Some(failure),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SubscriptionOutcome::Failed(_))
    }
}

/// Result of one pipeline run, keyed by subscription id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cancelled: bool,
    pub outcomes: BTreeMap<String, SubscriptionOutcome>,
}

impl RunReport {
    pub fn failed_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_failed()).count()
    }
}

/// Knobs the orchestrator needs, usually taken from [`Config`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub budget: CollectBudget,
    pub start_position: StartPosition,
    pub channel_capacity: usize,
    pub ignore_resource_id_case: bool,
    pub max_concurrent_subscriptions: usize,
}

impl From<&Config> for PipelineSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            budget: cfg.collection.budget(),
            start_position: cfg.collection.start_position,
            channel_capacity: cfg.collection.channel_capacity,
            ignore_resource_id_case: cfg.enrichment.ignore_resource_id_case,
            max_concurrent_subscriptions: cfg.pipeline.max_concurrent_subscriptions,
        }
    }
}

/// Drives the per-subscription stages. Collaborators are injected so tests
/// can substitute fakes.
pub struct Pipeline<S, D> {
    streams: S,
    directories: D,
    settings: PipelineSettings,
    cancel: CancellationToken,
}

impl<S, D> Pipeline<S, D>
where
    S: StreamFactory,
    D: DirectoryFactory,
{
    pub fn new(streams: S, directories: D, settings: PipelineSettings) -> Self {
        Self {
            streams,
            directories,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Drive cancellation from an existing token (e.g. one wired to Ctrl-C).
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops every in-flight and future collection of this
    /// pipeline. Collections return what they have accumulated.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// List subscriptions, then [`run`](Self::run) them. Listing is the only
    /// failure that aborts the whole run.
    pub async fn run_listed(
        &self,
        lister: &dyn SubscriptionLister,
    ) -> Result<RunReport, SourceError> {
        let ids = lister.list().await?;
        info!(count = ids.len(), "subscriptions listed");
        Ok(self.run(&ids).await)
    }

    /// Process every subscription and return one outcome per id. Repeated ids
    /// are processed once.
    pub async fn run(&self, subscription_ids: &[String]) -> RunReport {
        let started_at = Utc::now();
        let concurrency = self.settings.max_concurrent_subscriptions.max(1);

        let mut seen = BTreeSet::new();
        let unique: Vec<&String> = subscription_ids
            .iter()
            .filter(|id| seen.insert(*id))
            .collect();
        if unique.len() < subscription_ids.len() {
            warn!(
                skipped = subscription_ids.len() - unique.len(),
                "duplicate subscription ids ignored"
            );
        }

        let results: Vec<(String, SubscriptionOutcome)> = futures::stream::iter(unique)
            .map(|id| async move {
                let outcome = self
                    .run_subscription(id)
                    .instrument(info_span!("subscription", id = %id))
                    .await;
                (id.clone(), outcome)
            })
            .buffered(concurrency)
            .collect()
            .await;

        let outcomes: BTreeMap<_, _> = results.into_iter().collect();
        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            cancelled: self.cancel.is_cancelled(),
            outcomes,
        };
        info!(
            subscriptions = report.outcomes.len(),
            failed = report.failed_count(),
            cancelled = report.cancelled,
            "run finished"
        );
        report
    }

    async fn run_subscription(&self, subscription_id: &str) -> SubscriptionOutcome {
        match self.process(subscription_id).await {
            Ok(bundle) => SubscriptionOutcome::Complete(Box::new(bundle)),
            Err(e) => {
                error!(subscription = subscription_id, error = %e, "subscription failed");
                SubscriptionOutcome::Failed(SubscriptionFailure::from(&e))
            }
        }
    }

    async fn process(&self, subscription_id: &str) -> Result<SubscriptionBundle, SubscriptionError> {
        let position = self.settings.start_position;
        let stream = self
            .streams
            .open(subscription_id, position)
            .await
            .map_err(|source| SubscriptionError::StreamUnavailable {
                subscription: subscription_id.to_string(),
                source,
            })?;

        let collector = Collector::new(self.settings.budget, self.cancel.child_token())
            .with_channel_capacity(self.settings.channel_capacity);
        let collection = collector.collect(subscription_id, stream, position).await;

        let entries = self
            .directories
            .fetch(subscription_id)
            .await
            .map_err(|source| SubscriptionError::DirectoryFetchFailure {
                subscription: subscription_id.to_string(),
                source,
            })?;
        let directory = if self.settings.ignore_resource_id_case {
            ResourceDirectory::from_entries_ignore_case(entries)
        } else {
            ResourceDirectory::from_entries(entries)
        };

        let enriched_events = enrich(&collection.events, &directory);
        let summaries = summarize(&enriched_events);
        let totals = totals(&enriched_events);

        if collection.stats.stop_reason == StopReason::Cancelled {
            info!(subscription = subscription_id, "collection cut short by cancellation");
        }
        info!(
            subscription = subscription_id,
            events = enriched_events.len(),
            resources_known = directory.len(),
            "subscription summarized"
        );

        Ok(SubscriptionBundle {
            subscription_id: subscription_id.to_string(),
            enriched_events,
            operation_summary: summaries.operations,
            severity_summary: summaries.severities,
            resource_summary: summaries.resources,
            totals,
            collection: collection.stats,
        })
    }
}
