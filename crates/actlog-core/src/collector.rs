//! Collector: drains one subscription's event stream into an in-memory table.
//!
//! The stream is a live feed with no end-of-data signal, so every collection
//! runs under a [`CollectBudget`] and an external [`CancellationToken`].
//!
//! ```text
//!  RecordStream ──► forwarder task ──► mpsc (bounded) ──► Collector ──► Vec<LogEvent>
//!                                                          │
//!                                   cancel / deadline / limit ──┘
//! ```
//!
//! The forwarder task owns the stream; the collector is the only writer of
//! the event table. A record is appended only after it has been fully
//! normalised. When collection stops for any reason the forwarder is aborted,
//! which drops the stream handle.

use crate::error::SourceError;
use crate::normalizer::normalize;
use crate::source::RecordStream;
use crate::types::{LogEvent, RawRecord, StartPosition};
use futures::StreamExt;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Limits for a single collection. Whichever is hit first ends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectBudget {
    pub max_duration: Duration,
    /// Maximum number of stream items to receive. `0` disables the item limit.
    pub max_events: usize,
}

impl CollectBudget {
    pub fn new(max_duration: Duration, max_events: usize) -> Self {
        Self {
            max_duration,
            max_events,
        }
    }
}

/// Why a collection ended. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Deadline,
    EventLimit,
    Cancelled,
    StreamClosed,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Deadline => write!(f, "deadline"),
            StopReason::EventLimit => write!(f, "event_limit"),
            StopReason::Cancelled => write!(f, "cancelled"),
            StopReason::StreamClosed => write!(f, "stream_closed"),
        }
    }
}

/// Counters describing how a collection went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub start_position: StartPosition,
    /// Stream items received, including failures.
    pub received: usize,
    pub normalized: usize,
    /// Records that failed normalisation.
    pub skipped: usize,
    /// Items the stream itself reported as errors.
    pub stream_errors: usize,
    pub stop_reason: StopReason,
    pub last_sequence_number: Option<u64>,
    pub elapsed_ms: u64,
}

/// The events gathered from one stream, in arrival order.
#[derive(Debug, Clone)]
pub struct Collection {
    pub events: Vec<LogEvent>,
    pub stats: CollectionStats,
}

/// Consumes one stream under a budget.
pub struct Collector {
    budget: CollectBudget,
    channel_capacity: usize,
    cancel: CancellationToken,
}

impl Collector {
    pub fn new(budget: CollectBudget, cancel: CancellationToken) -> Self {
        Self {
            budget,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            cancel,
        }
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Drain `stream` until the budget is spent, the token is cancelled or the
    /// stream ends. Always returns what was accumulated so far.
    pub async fn collect(
        &self,
        subscription_id: &str,
        stream: RecordStream,
        position: StartPosition,
    ) -> Collection {
        let started = Instant::now();
        let (tx, mut rx) = mpsc::channel(self.channel_capacity);
        let forwarder = AbortOnDrop(tokio::spawn(forward(stream, tx)));

        let mut table = EventTable::default();
        let deadline = tokio::time::sleep_until(started + self.budget.max_duration);
        tokio::pin!(deadline);

        let stop_reason = loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break StopReason::Cancelled,
                _ = &mut deadline => break StopReason::Deadline,
                item = rx.recv() => {
                    let Some(item) = item else {
                        break StopReason::StreamClosed;
                    };
                    table.accept(subscription_id, item);
                    if self.budget.max_events > 0 && table.received >= self.budget.max_events {
                        break StopReason::EventLimit;
                    }
                }
            }
        };
        drop(forwarder);

        if table.skipped > 0 || table.stream_errors > 0 {
            warn!(
                subscription = subscription_id,
                skipped = table.skipped,
                stream_errors = table.stream_errors,
                "some records were not collected"
            );
        }
        info!(
            subscription = subscription_id,
            received = table.received,
            normalized = table.events.len(),
            stop_reason = %stop_reason,
            "collection finished"
        );

        let stats = CollectionStats {
            start_position: position,
            received: table.received,
            normalized: table.events.len(),
            skipped: table.skipped,
            stream_errors: table.stream_errors,
            stop_reason,
            last_sequence_number: table.last_sequence_number,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        Collection {
            events: table.events,
            stats,
        }
    }
}

#[derive(Default)]
struct EventTable {
    events: Vec<LogEvent>,
    received: usize,
    skipped: usize,
    stream_errors: usize,
    last_sequence_number: Option<u64>,
}

impl EventTable {
    fn accept(&mut self, subscription_id: &str, item: Result<RawRecord, SourceError>) {
        self.received += 1;
        match item {
            Ok(record) => {
                if record.sequence_number.is_some() {
                    self.last_sequence_number = record.sequence_number;
                }
                match normalize(&record) {
                    Ok(event) => self.events.push(event),
                    Err(e) => {
                        self.skipped += 1;
                        debug!(
                            subscription = subscription_id,
                            sequence_number = ?record.sequence_number,
                            error = %e,
                            "skipping record"
                        );
                    }
                }
            }
            Err(e) => {
                self.stream_errors += 1;
                warn!(subscription = subscription_id, error = %e, "stream delivered an error");
            }
        }
    }
}

async fn forward(mut stream: RecordStream, tx: mpsc::Sender<Result<RawRecord, SourceError>>) {
    while let Some(item) = stream.next().await {
        if tx.send(item).await.is_err() {
            break;
        }
    }
}

struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}
