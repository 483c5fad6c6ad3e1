//! Domain-specific assertion macros for actlog harnesses.
//!
//! These wrap `pretty_assertions` and add failure messages that say which
//! subscription and which summary were wrong.

// ---------------------------------------------------------------------------
// Summary assertions
// ---------------------------------------------------------------------------

/// Assert the exact ordered `(key, count)` rows of a summary table.
///
/// ```rust
/// assert_summary!(bundle.severity_summary, [("Error", 2), ("Info", 1)]);
/// ```
#[macro_export]
macro_rules! assert_summary {
    ($table:expr, [$(($key:expr, $count:expr)),* $(,)?]) => {{
        let table: &actlog_core::aggregator::SummaryTable = &$table;
        let expected: Vec<(&str, usize)> = vec![$(($key, $count)),*];
        pretty_assertions::assert_eq!(table.pairs(), expected, "summary rows differ");
    }};
}

/// Assert that every summary of a bundle sums to its event count.
#[macro_export]
macro_rules! assert_summaries_consistent {
    ($bundle:expr) => {{
        let bundle: &actlog_core::pipeline::SubscriptionBundle = &$bundle;
        let n = bundle.enriched_events.len();
        for (name, table) in [
            ("operation", &bundle.operation_summary),
            ("severity", &bundle.severity_summary),
            ("resource", &bundle.resource_summary),
        ] {
            assert_eq!(
                table.total(),
                n,
                "{} summary of {} sums to {} but the table has {} events",
                name,
                bundle.subscription_id,
                table.total(),
                n
            );
        }
    }};
}

// ---------------------------------------------------------------------------
// Outcome assertions
// ---------------------------------------------------------------------------

/// Unwrap the complete bundle for `id`, panicking with the outcome otherwise.
#[macro_export]
macro_rules! expect_bundle {
    ($report:expr, $id:expr) => {{
        let id: &str = $id;
        match $report.outcomes.get(id) {
            Some(actlog_core::pipeline::SubscriptionOutcome::Complete(bundle)) => &**bundle,
            other => panic!("expected a complete bundle for {:?}, got {:?}", id, other),
        }
    }};
}

/// Assert that `id` failed at `stage`.
#[macro_export]
macro_rules! assert_failed_at {
    ($report:expr, $id:expr, $stage:expr) => {{
        let id: &str = $id;
        match $report.outcomes.get(id) {
            Some(actlog_core::pipeline::SubscriptionOutcome::Failed(failure)) => {
                assert_eq!(failure.stage, $stage, "{} failed at the wrong stage", id);
                assert!(!failure.reason.is_empty(), "{} failed without a reason", id);
            }
            other => panic!("expected {:?} to have failed, got {:?}", id, other),
        }
    }};
}
