//! Object store access for the catalog.

mod bucket;

pub use bucket::BucketSource;

use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("Object '{0}' not found")]
    NotFound(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Store(String),
}

/// Read access to the objects holding spreadsheets.
///
/// Calls block until the store answers or the implementation's timeout expires.
pub trait ObjectSource: Send + Sync {
    /// Keys of all objects under `prefix`, which is a path prefix without surrounding `/`.
    /// An empty prefix lists the whole store.
    fn list(&self, prefix: &str) -> Result<Vec<String>, SourceError>;

    /// Full content of the object at `key`.
    fn get(&self, key: &str) -> Result<Bytes, SourceError>;
}

impl<S: ObjectSource + ?Sized> ObjectSource for std::sync::Arc<S> {
    fn list(&self, prefix: &str) -> Result<Vec<String>, SourceError> {
        (**self).list(prefix)
    }

    fn get(&self, key: &str) -> Result<Bytes, SourceError> {
        (**self).get(key)
    }
}
