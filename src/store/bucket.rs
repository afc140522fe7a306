use crate::config::SourceConfig;
use crate::config::SourceScheme;
use crate::store::ObjectSource;
use crate::store::SourceError;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::DynObjectStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::debug;

/// [`ObjectSource`] over any `object_store` backend.
///
/// Drives the async client on a private current-thread runtime, so it must not be
/// called from inside another tokio runtime.
pub struct BucketSource {
    store: Arc<DynObjectStore>,
    runtime: Runtime,
    timeout: Duration,
}

impl std::fmt::Debug for BucketSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketSource")
            .field("store", &self.store)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl BucketSource {
    pub fn new(store: Arc<DynObjectStore>, timeout: Duration) -> Result<Self, SourceError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| SourceError::Store(error.to_string()))?;
        Ok(BucketSource {
            store,
            runtime,
            timeout,
        })
    }

    /// Opens the store the configuration points at. S3 credentials and region come from
    /// the standard `AWS_*` environment variables.
    pub fn from_config(config: &SourceConfig) -> Result<Self, SourceError> {
        let missing = |what: &str| SourceError::Store(format!("Missing {what} for {:?} source", config.scheme));
        let store: Arc<DynObjectStore> = match config.scheme {
            SourceScheme::S3 => {
                let bucket = config.bucket.as_deref().ok_or_else(|| missing("bucket"))?;
                Arc::new(AmazonS3Builder::from_env().with_bucket_name(bucket).build()?)
            }
            SourceScheme::File => {
                let root = config.root.as_deref().ok_or_else(|| missing("root directory"))?;
                Arc::new(LocalFileSystem::new_with_prefix(root)?)
            }
            SourceScheme::Memory => Arc::new(InMemory::new()),
        };
        debug!(scheme = ?config.scheme, store = %store, "Opened object store");
        Self::new(store, config.timeout)
    }

    /// Runs a store request to completion, bounded by the timeout.
    fn block_on<T>(&self, request: impl Future<Output = object_store::Result<T>>) -> Result<T, SourceError> {
        self.runtime
            .block_on(async { tokio::time::timeout(self.timeout, request).await })
            .map_err(|_| SourceError::Timeout(self.timeout))?
            .map_err(SourceError::from)
    }

    #[cfg(test)]
    pub(crate) fn put(&self, key: &str, bytes: Bytes) -> Result<(), SourceError> {
        let path = Path::from(key);
        self.block_on(async { self.store.put(&path, bytes.into()).await })?;
        Ok(())
    }
}

impl ObjectSource for BucketSource {
    fn list(&self, prefix: &str) -> Result<Vec<String>, SourceError> {
        let location = (!prefix.is_empty()).then(|| Path::from(prefix));
        let keys = self.block_on(async {
            self.store
                .list(location.as_ref())
                .map_ok(|meta| meta.location.to_string())
                .try_collect::<Vec<String>>()
                .await
        })?;
        debug!(prefix, count = keys.len(), "Listed objects");
        Ok(keys)
    }

    fn get(&self, key: &str) -> Result<Bytes, SourceError> {
        let path = Path::from(key);
        let bytes = self.block_on(async { self.store.get(&path).await?.bytes().await })?;
        debug!(key, size = bytes.len(), "Fetched object");
        Ok(bytes)
    }
}

impl From<object_store::Error> for SourceError {
    fn from(error: object_store::Error) -> Self {
        match error {
            object_store::Error::NotFound { path, .. } => SourceError::NotFound(path),
            error => SourceError::Store(error.to_string()),
        }
    }
}
