//! Core types for actlog-core.
//!
//! This module defines the data shapes shared by every pipeline stage: the
//! loosely typed [`RawRecord`] a stream delivers, the normalised [`LogEvent`],
//! the [`ResourceMetadata`] a directory provides, and the [`EnrichedEvent`]
//! produced by joining the two.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A record as delivered by an event stream, before normalisation.
///
/// Annotations and properties are free-form key/value maps; the body is an
/// opaque payload that is expected to be UTF-8 text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub annotations: Map<String, Value>,
    pub properties: Map<String, Value>,
    pub body: Bytes,
    /// Position of the record in its stream, when the source knows it.
    pub sequence_number: Option<u64>,
}

impl RawRecord {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_sequence_number(mut self, sequence_number: u64) -> Self {
        self.sequence_number = Some(sequence_number);
        self
    }
}

/// A normalised activity-log event. Immutable once produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub resource_id: String,
    pub operation_name: String,
    /// Severity as reported by the source (`Error`, `Informational`, …).
    pub level: Option<String>,
    pub message: String,
}

/// Metadata describing one cloud resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetadata {
    pub resource_id: String,
    pub resource_group: Option<String>,
    pub location: Option<String>,
    pub tags: BTreeMap<String, String>,
}

/// A [`LogEvent`] left-joined with the metadata of the resource it references.
///
/// Metadata fields are `None` when the directory had no entry for the event's
/// resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedEvent {
    #[serde(flatten)]
    pub event: LogEvent,
    pub resource_group: Option<String>,
    pub location: Option<String>,
    pub tags: Option<BTreeMap<String, String>>,
    /// First `/`-separated segment of the operation name.
    pub category: String,
}

/// Where a stream starts delivering records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StartPosition {
    /// The oldest record the source still retains.
    #[default]
    Earliest,
    /// Only records that arrive after the stream is opened.
    Latest,
    /// Skip the first `n` retained records.
    Offset(u64),
}

impl std::fmt::Display for StartPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartPosition::Earliest => write!(f, "earliest"),
            StartPosition::Latest => write!(f, "latest"),
            StartPosition::Offset(n) => write!(f, "{n}"),
        }
    }
}

impl std::str::FromStr for StartPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "earliest" | "-1" => Ok(StartPosition::Earliest),
            "latest" | "@latest" => Ok(StartPosition::Latest),
            other => other
                .parse::<u64>()
                .map(StartPosition::Offset)
                .map_err(|_| format!("invalid start position {other:?}: expected earliest, latest or an offset")),
        }
    }
}

impl TryFrom<String> for StartPosition {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StartPosition> for String {
    fn from(value: StartPosition) -> Self {
        value.to_string()
    }
}
