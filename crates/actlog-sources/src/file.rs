//! File-backed event streams.
//!
//! Each subscription's events live in `<events_dir>/<subscription>.jsonl`, one
//! JSON object per line:
//!
//! ```json
//! {"annotations": {"resourceId": "…", "operationName": "…"}, "body": "…", "sequenceNumber": 12}
//! ```
//!
//! The zero-based line index doubles as the sequence number when a line does
//! not carry one. In follow mode the stream does not end at end-of-file: it
//! waits for file-change notifications (with a polling fallback) and keeps
//! delivering appended lines, like a live feed.

use crate::{file_in, open_error};
use actlog_core::source::{RecordStream, StreamFactory};
use actlog_core::{RawRecord, SourceError, StartPosition};
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Opens `<events_dir>/<subscription>.jsonl` as a [`RecordStream`].
#[derive(Debug, Clone)]
pub struct FileStreamFactory {
    events_dir: PathBuf,
    follow: bool,
    poll_interval: Duration,
}

impl FileStreamFactory {
    pub fn new(events_dir: impl Into<PathBuf>) -> Self {
        Self {
            events_dir: events_dir.into(),
            follow: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Keep streams open at end-of-file and wait for appended lines.
    pub fn follow(mut self, follow: bool) -> Self {
        self.follow = follow;
        self
    }

    /// Upper bound on how long a following stream sleeps between checks when
    /// no change notification arrives.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn open_file(
        &self,
        subscription_id: &str,
        position: StartPosition,
    ) -> Result<RecordStream, SourceError> {
        let path = file_in(&self.events_dir, subscription_id, "jsonl")?;
        let file = File::open(&path).await.map_err(|e| open_error(&path, e))?;

        let follow = if self.follow {
            Some(Follow::start(&path, self.poll_interval))
        } else {
            None
        };
        let mut tail = Tail {
            reader: BufReader::new(file),
            pending: Vec::new(),
            line_no: 0,
            skip: 0,
            follow,
            done: false,
        };

        match position {
            StartPosition::Earliest => {}
            StartPosition::Offset(n) => tail.skip = n,
            StartPosition::Latest => tail.skip_to_end().await?,
        }
        debug!(path = %path.display(), %position, follow = self.follow, "event file opened");

        Ok(futures::stream::unfold(tail, |mut tail| async move {
            let item = tail.next_item().await?;
            Some((item, tail))
        })
        .boxed())
    }
}

impl StreamFactory for FileStreamFactory {
    fn open<'a>(
        &'a self,
        subscription_id: &'a str,
        position: StartPosition,
    ) -> BoxFuture<'a, Result<RecordStream, SourceError>> {
        self.open_file(subscription_id, position).boxed()
    }
}

/// One line of an event file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordLine {
    #[serde(default)]
    annotations: Map<String, Value>,
    #[serde(default)]
    properties: Map<String, Value>,
    #[serde(default)]
    body: Value,
    #[serde(default)]
    sequence_number: Option<u64>,
}

impl RecordLine {
    fn into_record(self, line_no: u64) -> RawRecord {
        let body = match self.body {
            Value::Null => Vec::new(),
            Value::String(s) => s.into_bytes(),
            other => other.to_string().into_bytes(),
        };
        RawRecord {
            annotations: self.annotations,
            properties: self.properties,
            body: body.into(),
            sequence_number: Some(self.sequence_number.unwrap_or(line_no)),
        }
    }
}

fn parse_line(text: &str, line_no: u64) -> Result<RawRecord, SourceError> {
    serde_json::from_str::<RecordLine>(text)
        .map(|line| line.into_record(line_no))
        .map_err(|e| SourceError::Parse(format!("line {}: {e}", line_no + 1)))
}

struct Tail {
    reader: BufReader<File>,
    /// Bytes of a line that has not seen its terminating newline yet.
    pending: Vec<u8>,
    line_no: u64,
    skip: u64,
    follow: Option<Follow>,
    done: bool,
}

impl Tail {
    async fn next_item(&mut self) -> Option<Result<RawRecord, SourceError>> {
        loop {
            if self.done {
                return None;
            }
            let line = match self.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => {
                    self.done = true;
                    return Some(Err(SourceError::Io(e)));
                }
            };

            let line_no = self.line_no;
            self.line_no += 1;
            if line_no < self.skip {
                continue;
            }
            let text = String::from_utf8_lossy(&line);
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            return Some(parse_line(text, line_no));
        }
    }

    /// Next complete line. In follow mode a partial trailing line is held
    /// back until its newline arrives; otherwise it is returned at EOF.
    async fn next_line(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        loop {
            self.reader.read_until(b'\n', &mut self.pending).await?;
            if self.pending.last() == Some(&b'\n') {
                return Ok(Some(std::mem::take(&mut self.pending)));
            }
            match self.follow.as_mut() {
                Some(follow) => follow.wait().await,
                None if self.pending.is_empty() => return Ok(None),
                None => return Ok(Some(std::mem::take(&mut self.pending))),
            }
        }
    }

    /// Skip every line currently in the file. An unterminated last line is
    /// dropped, unless following: then it is kept so appended bytes can
    /// complete it.
    async fn skip_to_end(&mut self) -> Result<(), SourceError> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = self.reader.read_until(b'\n', &mut buf).await?;
            if n == 0 {
                return Ok(());
            }
            if buf.last() == Some(&b'\n') {
                self.line_no += 1;
            } else if self.follow.is_some() {
                self.pending = std::mem::take(&mut buf);
                return Ok(());
            } else {
                self.line_no += 1;
                return Ok(());
            }
        }
    }
}

/// Change notifications for a followed file.
struct Follow {
    _watcher: Option<RecommendedWatcher>,
    changes: mpsc::Receiver<()>,
    poll_interval: Duration,
}

impl Follow {
    fn start(path: &Path, poll_interval: Duration) -> Self {
        let (tx, changes) = mpsc::channel(16);
        let watcher = match watch(path, tx) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "file watcher unavailable, polling instead");
                None
            }
        };
        Self {
            _watcher: watcher,
            changes,
            poll_interval,
        }
    }

    async fn wait(&mut self) {
        let poll = tokio::time::sleep(self.poll_interval);
        tokio::select! {
            Some(()) = self.changes.recv() => {}
            _ = poll => {}
        }
    }
}

fn watch(path: &Path, tx: mpsc::Sender<()>) -> notify::Result<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if res.is_ok() {
            let _ = tx.try_send(());
        }
    })?;
    watcher.watch(path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}
