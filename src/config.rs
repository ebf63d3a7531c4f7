//! Command line and environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::ObjectStore;
use thiserror::Error;

use crate::gateway::StoreGateway;
use crate::responder::MIN_SANE_OBJECT_SIZE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("an S3 bucket is required (--bucket or S3_BUCKET)")]
    MissingBucket,

    #[error("could not create object store: {0}")]
    Store(#[from] object_store::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Amazon S3 or an S3 compatible service
    S3,
    /// A directory on the local filesystem
    Local,
    /// An empty in-memory store
    Memory,
}

/// Streams media objects from an object store with HTTP range support.
#[derive(Debug, Clone, Parser)]
#[command(name = "media-range-stream", version, about)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8888")]
    pub bind: SocketAddr,

    /// Where media objects are stored
    #[arg(long, env = "STORE_BACKEND", value_enum, default_value_t = Backend::S3)]
    pub backend: Backend,

    /// S3 bucket holding the media objects
    #[arg(long, env = "S3_BUCKET")]
    pub bucket: Option<String>,

    /// S3 region, credentials are read from the usual AWS_* variables
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Custom endpoint for S3 compatible providers, e.g. http://localhost:9000
    #[arg(long, env = "S3_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Root directory for the local backend
    #[arg(long, env = "STORE_ROOT", default_value = "./media")]
    pub root: PathBuf,

    /// Directory served for every path outside the API
    #[arg(long, env = "STATIC_DIR", default_value = "./static")]
    pub static_dir: PathBuf,

    /// Objects smaller than this are refused as invalid files
    #[arg(long, env = "MIN_OBJECT_SIZE", default_value_t = MIN_SANE_OBJECT_SIZE)]
    pub min_object_size: u64,
}

impl Config {
    /// Creates the gateway for the configured backend.
    pub fn build_gateway(&self) -> Result<StoreGateway, ConfigError> {
        let (store, name): (Arc<dyn ObjectStore>, String) = match self.backend {
            Backend::S3 => {
                let bucket = self.bucket.clone().ok_or(ConfigError::MissingBucket)?;
                let mut builder = AmazonS3Builder::from_env().with_bucket_name(&bucket);
                if let Some(region) = &self.region {
                    builder = builder.with_region(region);
                }
                if let Some(endpoint) = &self.endpoint {
                    builder = builder
                        .with_endpoint(endpoint)
                        .with_allow_http(endpoint.starts_with("http://"));
                }
                (Arc::new(builder.build()?), format!("s3://{bucket}"))
            }
            Backend::Local => {
                let store = LocalFileSystem::new_with_prefix(&self.root)?;
                (Arc::new(store), self.root.display().to_string())
            }
            Backend::Memory => (Arc::new(InMemory::new()), "memory".to_string()),
        };

        tracing::info!(backend = ?self.backend, store = %name, "object store ready");
        Ok(StoreGateway::new(store, name))
    }
}
