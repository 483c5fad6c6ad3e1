//! Test builders: ergonomic constructors for records, events and resources.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use actlog_core::{LogEvent, RawRecord, ResourceMetadata};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

/// 2024-01-15T10:00:00Z, the base timestamp for fixture data.
pub fn base_ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// RecordBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`RawRecord`] fixtures. Starts with every field a
/// normalizable record needs.
///
/// # Example
///
/// ```rust
/// let record = RecordBuilder::new("vm1", "Microsoft.Compute/virtualMachines/start/action")
///     .level("Error")
///     .sequence(7)
///     .build();
/// ```
pub struct RecordBuilder {
    record: RawRecord,
}

impl RecordBuilder {
    pub fn new(resource_id: &str, operation_name: &str) -> Self {
        Self::bare()
            .annotation("time", base_ts().to_rfc3339())
            .annotation("resourceId", resource_id)
            .annotation("operationName", operation_name)
            .body(format!("{operation_name} on {resource_id}"))
    }

    /// A record with no annotations and an empty body.
    pub fn bare() -> Self {
        Self {
            record: RawRecord::default(),
        }
    }

    pub fn annotation(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.record = self.record.with_annotation(key, value);
        self
    }

    pub fn property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.record = self.record.with_property(key, value);
        self
    }

    pub fn without(mut self, key: &str) -> Self {
        self.record.annotations.remove(key);
        self.record.properties.remove(key);
        self
    }

    pub fn level(self, level: &str) -> Self {
        self.annotation("level", level)
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.record.body = body.into().into_bytes().into();
        self
    }

    pub fn sequence(mut self, n: u64) -> Self {
        self.record.sequence_number = Some(n);
        self
    }

    pub fn build(self) -> RawRecord {
        self.record
    }
}

// ---------------------------------------------------------------------------
// Events and resources
// ---------------------------------------------------------------------------

/// A normalised event, bypassing the normalizer.
pub fn log_event(resource_id: &str, operation_name: &str, level: Option<&str>) -> LogEvent {
    LogEvent {
        timestamp: base_ts(),
        resource_id: resource_id.to_string(),
        operation_name: operation_name.to_string(),
        level: level.map(str::to_string),
        message: String::new(),
    }
}

/// Fluent builder for [`ResourceMetadata`].
pub struct ResourceBuilder {
    meta: ResourceMetadata,
}

impl ResourceBuilder {
    pub fn new(resource_id: &str) -> Self {
        Self {
            meta: ResourceMetadata {
                resource_id: resource_id.to_string(),
                resource_group: None,
                location: None,
                tags: BTreeMap::new(),
            },
        }
    }

    pub fn group(mut self, group: &str) -> Self {
        self.meta.resource_group = Some(group.to_string());
        self
    }

    pub fn location(mut self, location: &str) -> Self {
        self.meta.location = Some(location.to_string());
        self
    }

    pub fn tag(mut self, key: &str, value: &str) -> Self {
        self.meta.tags.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> ResourceMetadata {
        self.meta
    }
}
