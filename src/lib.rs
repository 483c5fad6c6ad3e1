//! actlog: activity log ingestion and per-subscription reports.
//!
//! The binary is a thin shell over this library so integration tests can
//! drive the same wiring the CLI uses.
//!
//! # Architecture
//!
//! ```text
//! Config ──► app::run ──► Pipeline (actlog-core) ──► RunReport ──► export
//!               │                ▲                                  │
//!               └── file sources (actlog-sources) ─┘                ▼
//!                                                         ArtifactPublisher
//! ```

pub mod app;
pub mod export;

pub use actlog_core::config::Config;
pub use actlog_core::pipeline::{RunReport, SubscriptionOutcome};
pub use app::{Overrides, RunOutput};
pub use export::ExportOptions;
