//! Aggregator: categorical counts over an enriched event table.
//!
//! Every [`SummaryTable`] is sorted by descending count, then ascending key,
//! so identical event sets always produce identical reports regardless of
//! arrival order.

use crate::types::EnrichedEvent;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Severity key used for events that carried no level.
pub const UNKNOWN_LEVEL: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub key: String,
    pub count: usize,
}

/// Ordered `(key, count)` rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SummaryTable {
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Count occurrences of each key.
    pub fn count<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for key in keys {
            *counts.entry(key).or_default() += 1;
        }
        let mut rows: Vec<SummaryRow> = counts
            .into_iter()
            .map(|(key, count)| SummaryRow {
                key: key.to_string(),
                count,
            })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
        Self { rows }
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    /// The first `n` rows (the `n` most frequent keys).
    pub fn top(&self, n: usize) -> &[SummaryRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    pub fn get(&self, key: &str) -> Option<usize> {
        self.rows.iter().find(|r| r.key == key).map(|r| r.count)
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.rows.iter().map(|r| r.count).sum()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as `(key, count)` pairs, mostly for assertions.
    pub fn pairs(&self) -> Vec<(&str, usize)> {
        self.rows.iter().map(|r| (r.key.as_str(), r.count)).collect()
    }
}

/// The three summaries computed for one subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summaries {
    pub operations: SummaryTable,
    pub severities: SummaryTable,
    pub resources: SummaryTable,
}

/// Headline numbers for a subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionTotals {
    pub total_events: usize,
    pub error_events: usize,
    pub distinct_resources: usize,
}

pub fn summarize(events: &[EnrichedEvent]) -> Summaries {
    Summaries {
        operations: SummaryTable::count(events.iter().map(|e| e.event.operation_name.as_str())),
        severities: SummaryTable::count(
            events
                .iter()
                .map(|e| e.event.level.as_deref().unwrap_or(UNKNOWN_LEVEL)),
        ),
        resources: SummaryTable::count(events.iter().map(|e| e.event.resource_id.as_str())),
    }
}

pub fn totals(events: &[EnrichedEvent]) -> SubscriptionTotals {
    let error_events = events
        .iter()
        .filter(|e| {
            e.event
                .level
                .as_deref()
                .is_some_and(|level| level.eq_ignore_ascii_case("error"))
        })
        .count();
    let distinct_resources = events
        .iter()
        .map(|e| e.event.resource_id.as_str())
        .collect::<HashSet<_>>()
        .len();
    SubscriptionTotals {
        total_events: events.len(),
        error_events,
        distinct_resources,
    }
}
