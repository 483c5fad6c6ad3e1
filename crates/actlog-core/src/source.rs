//! Collaborator interfaces the pipeline calls through.
//!
//! Implementations live outside the core (see `actlog-sources`, or the fakes
//! in the integration harnesses). Futures are boxed so the traits stay
//! object-safe and can be held behind `Arc<dyn …>`.

use crate::error::SourceError;
use crate::types::{RawRecord, ResourceMetadata, StartPosition};
use futures::future::BoxFuture;
use futures::stream::BoxStream;

/// An open, possibly endless, stream of raw records for one subscription.
pub type RecordStream = BoxStream<'static, Result<RawRecord, SourceError>>;

/// Enumerates the subscriptions a run should cover.
pub trait SubscriptionLister: Send + Sync {
    fn list(&self) -> BoxFuture<'_, Result<Vec<String>, SourceError>>;
}

/// Opens an event stream per subscription.
pub trait StreamFactory: Send + Sync {
    fn open<'a>(
        &'a self,
        subscription_id: &'a str,
        position: StartPosition,
    ) -> BoxFuture<'a, Result<RecordStream, SourceError>>;
}

/// Fetches the resource directory of one subscription.
pub trait DirectoryFactory: Send + Sync {
    fn fetch<'a>(
        &'a self,
        subscription_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ResourceMetadata>, SourceError>>;
}

/// Stores a named blob and returns where it ended up.
pub trait ArtifactPublisher: Send + Sync {
    fn publish<'a>(
        &'a self,
        name: &'a str,
        contents: Vec<u8>,
    ) -> BoxFuture<'a, Result<String, SourceError>>;
}

impl<T: StreamFactory + ?Sized> StreamFactory for std::sync::Arc<T> {
    fn open<'a>(
        &'a self,
        subscription_id: &'a str,
        position: StartPosition,
    ) -> BoxFuture<'a, Result<RecordStream, SourceError>> {
        (**self).open(subscription_id, position)
    }
}

impl<T: DirectoryFactory + ?Sized> DirectoryFactory for std::sync::Arc<T> {
    fn fetch<'a>(
        &'a self,
        subscription_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ResourceMetadata>, SourceError>> {
        (**self).fetch(subscription_id)
    }
}
