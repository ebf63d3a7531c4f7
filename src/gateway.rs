//! Object gateway abstraction over the backing store.

use std::fmt;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use object_store::path::Path;
use object_store::{GetOptions, GetRange, ObjectStore};
use thiserror::Error;

use crate::range::ByteRange;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Byte chunks of an object as they arrive from the store.
pub type ByteStream = BoxStream<'static, GatewayResult<Bytes>>;

/// Metadata returned by [`ObjectGateway::head_object`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectHead {
    pub size_bytes: u64,
}

/// Access to media objects by key.
///
/// Implementations must be reentrant: every request resolves metadata and
/// fetches its bytes independently.
#[async_trait]
pub trait ObjectGateway: Send + Sync {
    /// Looks up the size of an object, [`GatewayError::NotFound`] if absent.
    async fn head_object(&self, key: &str) -> GatewayResult<ObjectHead>;

    /// Fetches the whole object, or only the inclusive `range` when given.
    async fn get_object(&self, key: &str, range: Option<ByteRange>) -> GatewayResult<ByteStream>;

    /// Lists every key in the store.
    async fn list_objects(&self) -> GatewayResult<Vec<String>>;
}

/// [`ObjectGateway`] backed by any [`ObjectStore`] (S3, local filesystem, memory).
#[derive(Clone)]
pub struct StoreGateway {
    store: Arc<dyn ObjectStore>,
    name: String,
}

impl StoreGateway {
    /// `name` identifies the store in log lines, e.g. the bucket name.
    pub fn new(store: Arc<dyn ObjectStore>, name: impl Into<String>) -> Self {
        StoreGateway { store, name: name.into() }
    }
}

impl fmt::Debug for StoreGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreGateway")
            .field("store", &self.name)
            .finish()
    }
}

fn map_store_error(key: &str, err: object_store::Error) -> GatewayError {
    match err {
        object_store::Error::NotFound { .. } => GatewayError::NotFound(key.to_string()),
        other => GatewayError::Backend(other.to_string()),
    }
}

#[async_trait]
impl ObjectGateway for StoreGateway {
    async fn head_object(&self, key: &str) -> GatewayResult<ObjectHead> {
        let location = Path::from(key);
        let options = GetOptions { head: true, ..Default::default() };

        let result = self
            .store
            .get_opts(&location, options)
            .await
            .map_err(|e| map_store_error(key, e))?;

        tracing::debug!(store = %self.name, key = %key, size_bytes = result.meta.size, "head object");

        Ok(ObjectHead { size_bytes: result.meta.size })
    }

    async fn get_object(&self, key: &str, range: Option<ByteRange>) -> GatewayResult<ByteStream> {
        let location = Path::from(key);
        let options = GetOptions {
            range: range.map(|r| GetRange::Bounded(r.to_exclusive())),
            ..Default::default()
        };

        let result = self.store.get_opts(&location, options).await.map_err(|e| {
            tracing::error!(error = %e, store = %self.name, key = %key, "get object failed");
            map_store_error(key, e)
        })?;

        let key = key.to_string();
        let stream = result
            .into_stream()
            .map_err(move |e| map_store_error(&key, e))
            .boxed();

        Ok(stream)
    }

    async fn list_objects(&self) -> GatewayResult<Vec<String>> {
        let keys = self
            .store
            .list(None)
            .map_ok(|meta| meta.location.to_string())
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, store = %self.name, "list objects failed");
                GatewayError::Backend(e.to_string())
            })?;

        Ok(keys)
    }
}
