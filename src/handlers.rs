use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header::RANGE;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::StreamError;
use crate::gateway::ObjectGateway;
use crate::range::{parse_range, RangeError};
use crate::responder::{self, ObjectDescriptor, StreamingResponse, MIN_SANE_OBJECT_SIZE};

const PLAYABLE_EXTENSIONS: [&str; 2] = [".mp4", ".webm"];

/// Shared by every request. Holds no mutable state.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn ObjectGateway>,
    pub min_object_size: u64,
}

impl AppState {
    pub fn new(gateway: Arc<dyn ObjectGateway>) -> Self {
        AppState { gateway, min_object_size: MIN_SANE_OBJECT_SIZE }
    }

    pub fn with_min_object_size(mut self, min_object_size: u64) -> Self {
        self.min_object_size = min_object_size;
        self
    }
}

/// `GET /video/{*key}`, also reached by `HEAD`, which gets the same headers
/// and never fetches from the store.
pub async fn stream_video(
    State(state): State<AppState>,
    method: Method,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<StreamingResponse, StreamError> {
    if key.is_empty() {
        return Err(missing_key_error());
    }

    let head = state.gateway.head_object(&key).await.map_err(|e| {
        tracing::warn!(key = %key, error = %e, "metadata lookup failed");
        StreamError::from_lookup(&key, e)
    })?;

    let descriptor = ObjectDescriptor::new(key, head.size_bytes);
    tracing::info!(
        key = %descriptor.key,
        content_type = %descriptor.content_type,
        size_bytes = descriptor.size_bytes,
        "serving object"
    );

    responder::check_object_size(&descriptor, state.min_object_size)?;

    let size_bytes = descriptor.size_bytes;
    let raw = match headers.get(RANGE) {
        None => None,
        Some(value) => Some(value.to_str().map_err(|_| StreamError::RangeNotSatisfiable {
            source: RangeError::Malformed,
            size_bytes,
        })?),
    };

    let range = parse_range(raw, size_bytes).map_err(|source| {
        tracing::debug!(key = %descriptor.key, range = ?raw, error = %source, "rejected range");
        StreamError::RangeNotSatisfiable { source, size_bytes }
    })?;

    if method == Method::HEAD {
        return responder::compose_headers(descriptor, range);
    }
    responder::compose(descriptor, range, state.gateway.as_ref()).await
}

/// `GET /video` and `GET /video/`
pub async fn missing_key() -> StreamError {
    missing_key_error()
}

fn missing_key_error() -> StreamError {
    StreamError::BadRequest("Video key is missing".to_string())
}

/// One playable object in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub url: String,
}

impl CatalogEntry {
    fn from_key(key: String) -> Self {
        let url = format!("/video/{key}");
        CatalogEntry { name: key, url }
    }
}

fn is_playable(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    PLAYABLE_EXTENSIONS.iter().any(|ext| key.ends_with(ext))
}

/// `GET /videos`
pub async fn list_videos(
    State(state): State<AppState>,
) -> Result<Json<Vec<CatalogEntry>>, (StatusCode, String)> {
    let keys = state.gateway.list_objects().await.map_err(|e| {
        tracing::error!(error = %e, "listing videos failed");
        (StatusCode::INTERNAL_SERVER_ERROR, format!("Could not list videos: {e}"))
    })?;

    let entries = keys
        .into_iter()
        .filter(|key| is_playable(key))
        .map(CatalogEntry::from_key)
        .collect::<Vec<_>>();

    tracing::debug!(count = entries.len(), "listed videos");
    Ok(Json(entries))
}
