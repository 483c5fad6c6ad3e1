//! Report export.
//!
//! [`render_json`] produces the machine-readable run report handed to the
//! artifact publisher; [`render_text`] produces the console summary.

use actlog_core::aggregator::{SubscriptionTotals, SummaryRow};
use actlog_core::collector::CollectionStats;
use actlog_core::config::ReportConfig;
use actlog_core::pipeline::{FailureStage, RunReport, SubscriptionOutcome};
use actlog_core::EnrichedEvent;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Number of operation rows kept in the report.
    pub top_operations: usize,
    /// Embed every enriched event in the JSON report.
    pub include_events: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            top_operations: 5,
            include_events: true,
        }
    }
}

impl From<&ReportConfig> for ExportOptions {
    fn from(cfg: &ReportConfig) -> Self {
        Self {
            top_operations: cfg.top_operations,
            include_events: cfg.include_events,
        }
    }
}

/// `<prefix>_<YYYY-MM-DD_HH-MM-SS>.json`
pub fn artifact_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{prefix}_{}.json", at.format("%Y-%m-%d_%H-%M-%S"))
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportDoc<'a> {
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    cancelled: bool,
    failed: usize,
    subscriptions: BTreeMap<&'a str, SubscriptionDoc<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum SubscriptionDoc<'a> {
    #[serde(rename_all = "camelCase")]
    Complete {
        totals: SubscriptionTotals,
        collection: &'a CollectionStats,
        top_operations: &'a [SummaryRow],
        severity_summary: &'a [SummaryRow],
        resource_summary: &'a [SummaryRow],
        #[serde(skip_serializing_if = "Option::is_none")]
        events: Option<&'a [EnrichedEvent]>,
    },
    Failed {
        stage: FailureStage,
        reason: &'a str,
    },
}

impl<'a> SubscriptionDoc<'a> {
    fn new(outcome: &'a SubscriptionOutcome, opts: &ExportOptions) -> Self {
        match outcome {
            SubscriptionOutcome::Complete(bundle) => SubscriptionDoc::Complete {
                totals: bundle.totals,
                collection: &bundle.collection,
                top_operations: bundle.operation_summary.top(opts.top_operations),
                severity_summary: bundle.severity_summary.rows(),
                resource_summary: bundle.resource_summary.rows(),
                events: opts
                    .include_events
                    .then_some(bundle.enriched_events.as_slice()),
            },
            SubscriptionOutcome::Failed(failure) => SubscriptionDoc::Failed {
                stage: failure.stage,
                reason: &failure.reason,
            },
        }
    }
}

/// Pretty-printed JSON report. A failed subscription is marked
/// `"status": "failed"` with its reason; an empty one is `"complete"` with
/// zero totals.
pub fn render_json(report: &RunReport, opts: &ExportOptions) -> serde_json::Result<String> {
    let doc = ReportDoc {
        started_at: report.started_at,
        finished_at: report.finished_at,
        cancelled: report.cancelled,
        failed: report.failed_count(),
        subscriptions: report
            .outcomes
            .iter()
            .map(|(id, outcome)| (id.as_str(), SubscriptionDoc::new(outcome, opts)))
            .collect(),
    };
    serde_json::to_string_pretty(&doc)
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

const HEADERS: [&str; 5] = ["SUBSCRIPTION", "EVENTS", "ERRORS", "RESOURCES", "STATUS"];

/// Console summary: one row per subscription, failure reasons below.
pub fn render_text(report: &RunReport) -> String {
    let rows: Vec<[String; 5]> = report
        .outcomes
        .iter()
        .map(|(id, outcome)| match outcome {
            SubscriptionOutcome::Complete(bundle) => [
                id.clone(),
                bundle.totals.total_events.to_string(),
                bundle.totals.error_events.to_string(),
                bundle.totals.distinct_resources.to_string(),
                format!("ok ({})", bundle.collection.stop_reason),
            ],
            SubscriptionOutcome::Failed(failure) => [
                id.clone(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                format!("failed ({})", failure.stage),
            ],
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS.map(String::from), &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }

    let failures: Vec<_> = report
        .outcomes
        .iter()
        .filter_map(|(id, o)| o.failure().map(|f| (id, f)))
        .collect();
    if !failures.is_empty() {
        out.push('\n');
        for (id, failure) in failures {
            let _ = writeln!(out, "{id}: {}", failure.reason);
        }
    }
    if report.cancelled {
        out.push_str("\nrun cancelled; results are partial\n");
    }
    out
}

fn push_row(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let line = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, &w))| {
            if i == 0 || i == 4 {
                format!("{cell:<w$}")
            } else {
                format!("{cell:>w$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}
