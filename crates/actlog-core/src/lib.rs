//! actlog-core: activity log aggregation core.
//!
//! This crate exposes the pipeline stages as public modules, plus the shared
//! types and the collaborator traits the stages are driven through.
//!
//! # Architecture
//!
//! ```text
//! StreamFactory ──► Collector ──► Enricher ──► Aggregator ──► SubscriptionBundle
//!                   (normalizer)     ▲
//!                                    │
//!                 DirectoryFactory ──┘
//! ```
//!
//! The [`pipeline::Pipeline`] runs these stages once per subscription and
//! collects the results into a [`pipeline::RunReport`]. Ingestion for a
//! subscription always completes before its enrichment starts.

pub mod aggregator;
pub mod collector;
pub mod config;
pub mod enricher;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod source;
pub mod types;

pub use error::{NormalizationError, SourceError, SubscriptionError};
pub use types::{EnrichedEvent, LogEvent, RawRecord, ResourceMetadata, StartPosition};
