//! In-memory collaborators: record streams, stream factories and resource
//! directories that never touch the filesystem.

use actlog_core::source::{DirectoryFactory, RecordStream, StreamFactory};
use actlog_core::{RawRecord, ResourceMetadata, SourceError, StartPosition};
use futures::future::BoxFuture;
use futures::{FutureExt, Stream, StreamExt};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Channel-backed stream
// ---------------------------------------------------------------------------

/// A handle for pushing items into a [`FakeRecordStream`].
pub struct FakeStreamWriter {
    tx: mpsc::UnboundedSender<Result<RawRecord, SourceError>>,
}

impl FakeStreamWriter {
    pub fn send(&self, record: RawRecord) {
        let _ = self.tx.send(Ok(record));
    }

    pub fn send_error(&self, reason: &str) {
        let _ = self.tx.send(Err(SourceError::Parse(reason.to_string())));
    }

    /// Close the stream, causing the consumer to see the end.
    pub fn close(self) {}
}

/// A live stream fed by a [`FakeStreamWriter`]. Stays pending while the
/// writer is alive and has nothing queued.
pub struct FakeRecordStream {
    rx: mpsc::UnboundedReceiver<Result<RawRecord, SourceError>>,
}

impl Stream for FakeRecordStream {
    type Item = Result<RawRecord, SourceError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Create a linked writer/stream pair.
///
/// ```rust
/// let (writer, stream) = fake_stream();
/// writer.send(RecordBuilder::new("vm1", "a/b").build());
/// writer.close();
/// ```
pub fn fake_stream() -> (FakeStreamWriter, RecordStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (FakeStreamWriter { tx }, FakeRecordStream { rx }.boxed())
}

/// A stream that yields `records` and then ends.
pub fn finite_stream(records: Vec<RawRecord>) -> RecordStream {
    futures::stream::iter(records.into_iter().map(Ok)).boxed()
}

/// A stream that yields `records` and then never ends.
pub fn silent_stream(records: Vec<RawRecord>) -> RecordStream {
    futures::stream::iter(records.into_iter().map(Ok))
        .chain(futures::stream::pending())
        .boxed()
}

// ---------------------------------------------------------------------------
// FakeStreamFactory
// ---------------------------------------------------------------------------

enum Feed {
    Finite(Vec<RawRecord>),
    Silent(Vec<RawRecord>),
    Unavailable(String),
}

/// Hands out pre-canned streams per subscription and records every open.
#[derive(Default)]
pub struct FakeStreamFactory {
    feeds: HashMap<String, Feed>,
    opened: Mutex<Vec<(String, StartPosition)>>,
}

impl FakeStreamFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finite(mut self, subscription: &str, records: Vec<RawRecord>) -> Self {
        self.feeds.insert(subscription.to_string(), Feed::Finite(records));
        self
    }

    /// Deliver `records`, then stay open without ever ending.
    pub fn silent(mut self, subscription: &str, records: Vec<RawRecord>) -> Self {
        self.feeds.insert(subscription.to_string(), Feed::Silent(records));
        self
    }

    pub fn unavailable(mut self, subscription: &str, reason: &str) -> Self {
        self.feeds
            .insert(subscription.to_string(), Feed::Unavailable(reason.to_string()));
        self
    }

    /// Every `(subscription, position)` passed to `open`, in call order.
    pub fn opened(&self) -> Vec<(String, StartPosition)> {
        self.opened.lock().unwrap().clone()
    }
}

impl StreamFactory for FakeStreamFactory {
    fn open<'a>(
        &'a self,
        subscription_id: &'a str,
        position: StartPosition,
    ) -> BoxFuture<'a, Result<RecordStream, SourceError>> {
        self.opened
            .lock()
            .unwrap()
            .push((subscription_id.to_string(), position));
        let result = match self.feeds.get(subscription_id) {
            None => Err(SourceError::NotFound(subscription_id.to_string())),
            Some(Feed::Unavailable(reason)) => Err(SourceError::Unavailable(reason.clone())),
            Some(Feed::Finite(records)) => Ok(finite_stream(records.clone())),
            Some(Feed::Silent(records)) => Ok(silent_stream(records.clone())),
        };
        futures::future::ready(result).boxed()
    }
}

// ---------------------------------------------------------------------------
// FakeDirectoryFactory
// ---------------------------------------------------------------------------

/// Resource directory snapshots per subscription. Unknown subscriptions get an
/// empty directory.
#[derive(Default)]
pub struct FakeDirectoryFactory {
    entries: HashMap<String, Result<Vec<ResourceMetadata>, String>>,
}

impl FakeDirectoryFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(mut self, subscription: &str, entries: Vec<ResourceMetadata>) -> Self {
        self.entries.insert(subscription.to_string(), Ok(entries));
        self
    }

    pub fn failing(mut self, subscription: &str, reason: &str) -> Self {
        self.entries
            .insert(subscription.to_string(), Err(reason.to_string()));
        self
    }
}

impl DirectoryFactory for FakeDirectoryFactory {
    fn fetch<'a>(
        &'a self,
        subscription_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ResourceMetadata>, SourceError>> {
        let result = match self.entries.get(subscription_id) {
            None => Ok(Vec::new()),
            Some(Ok(entries)) => Ok(entries.clone()),
            Some(Err(reason)) => Err(SourceError::Unavailable(reason.clone())),
        };
        futures::future::ready(result).boxed()
    }
}
