//! Error types shared across the pipeline.
//!
//! Record-level failures ([`NormalizationError`]) are counted and skipped.
//! Collaborator failures ([`SourceError`]) surface per subscription as a
//! [`SubscriptionError`], which the orchestrator records instead of aborting
//! the run.

/// A raw record could not be turned into a [`LogEvent`](crate::LogEvent).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("malformed field {field}: {reason}")]
    MalformedField { field: &'static str, reason: String },
}

/// Failure reported by an external collaborator (stream, directory, lister,
/// publisher).
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A failure that ends processing of one subscription.
#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    #[error("event stream unavailable for {subscription}: {source}")]
    StreamUnavailable {
        subscription: String,
        #[source]
        source: SourceError,
    },

    #[error("resource directory fetch failed for {subscription}: {source}")]
    DirectoryFetchFailure {
        subscription: String,
        #[source]
        source: SourceError,
    },
}
