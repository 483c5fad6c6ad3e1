//! Enricher: left-joins collected events with a subscription's resource
//! directory.

use crate::types::{EnrichedEvent, LogEvent, ResourceMetadata};
use std::collections::HashMap;

/// Keyed lookup of resource metadata for one subscription.
///
/// Built from a list of entries; when a resource id appears more than once the
/// last entry wins.
#[derive(Debug, Clone, Default)]
pub struct ResourceDirectory {
    entries: HashMap<String, ResourceMetadata>,
    ignore_case: bool,
}

impl ResourceDirectory {
    pub fn from_entries(entries: impl IntoIterator<Item = ResourceMetadata>) -> Self {
        Self::build(entries, false)
    }

    /// Like [`from_entries`](Self::from_entries), but resource ids match
    /// regardless of ASCII case.
    pub fn from_entries_ignore_case(entries: impl IntoIterator<Item = ResourceMetadata>) -> Self {
        Self::build(entries, true)
    }

    fn build(entries: impl IntoIterator<Item = ResourceMetadata>, ignore_case: bool) -> Self {
        let mut map = HashMap::new();
        for entry in entries {
            map.insert(key_for(&entry.resource_id, ignore_case), entry);
        }
        Self {
            entries: map,
            ignore_case,
        }
    }

    pub fn get(&self, resource_id: &str) -> Option<&ResourceMetadata> {
        self.entries.get(&key_for(resource_id, self.ignore_case))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn key_for(resource_id: &str, ignore_case: bool) -> String {
    if ignore_case {
        resource_id.to_ascii_lowercase()
    } else {
        resource_id.to_string()
    }
}

/// Join every event with its resource metadata. Output order and length match
/// the input; events referencing unknown resources keep `None` metadata.
pub fn enrich(events: &[LogEvent], directory: &ResourceDirectory) -> Vec<EnrichedEvent> {
    events
        .iter()
        .map(|event| {
            let meta = directory.get(&event.resource_id);
            EnrichedEvent {
                event: event.clone(),
                resource_group: meta.and_then(|m| m.resource_group.clone()),
                location: meta.and_then(|m| m.location.clone()),
                tags: meta.map(|m| m.tags.clone()),
                category: category_of(&event.operation_name).to_string(),
            }
        })
        .collect()
}

/// The part of an operation name before its first `/`.
pub fn category_of(operation_name: &str) -> &str {
    operation_name
        .split_once('/')
        .map_or(operation_name, |(head, _)| head)
}
