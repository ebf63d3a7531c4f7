//! Turns an object and an optional byte range into a streaming response.

use axum::body::Body;
use axum::http::header::CONTENT_DISPOSITION;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum_extra::headers::{AcceptRanges, ContentLength, ContentRange, ContentType};
use axum_extra::TypedHeader;
use mime_guess::Mime;

use crate::error::StreamError;
use crate::gateway::ObjectGateway;
use crate::range::{ByteRange, RangeError};
use crate::stream::RangedStream;

/// Objects below this size are assumed to be placeholders or error documents
/// left in the bucket and are refused instead of streamed.
pub const MIN_SANE_OBJECT_SIZE: u64 = 512;

/// What a metadata lookup resolved for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescriptor {
    pub key: String,
    pub size_bytes: u64,
    pub content_type: Mime,
}

impl ObjectDescriptor {
    /// Content type is guessed from the key's extension.
    pub fn new(key: impl Into<String>, size_bytes: u64) -> Self {
        let key = key.into();
        let content_type = mime_guess::from_path(&key).first_or_octet_stream();
        ObjectDescriptor { key, size_bytes, content_type }
    }
}

/// Rejects objects smaller than `min_size` bytes.
pub fn check_object_size(descriptor: &ObjectDescriptor, min_size: u64) -> Result<(), StreamError> {
    if descriptor.size_bytes < min_size {
        tracing::warn!(
            key = %descriptor.key,
            size_bytes = descriptor.size_bytes,
            min_size,
            "refusing to stream undersized object"
        );
        return Err(StreamError::InvalidPayload {
            key: descriptor.key.clone(),
            size_bytes: descriptor.size_bytes,
        });
    }
    Ok(())
}

/// Headers and body of a successful streaming response. Implements [`IntoResponse`].
///
/// `stream` is `None` when only the headers were asked for.
pub enum StreamingResponse {
    /// No range requested, whole object.
    Full {
        content_type: Mime,
        content_length: ContentLength,
        stream: Option<RangedStream>,
    },
    /// A single satisfiable range.
    Partial {
        content_type: Mime,
        content_range: ContentRange,
        content_length: ContentLength,
        stream: Option<RangedStream>,
    },
}

impl StreamingResponse {
    pub fn status(&self) -> StatusCode {
        match self {
            StreamingResponse::Full { .. } => StatusCode::OK,
            StreamingResponse::Partial { .. } => StatusCode::PARTIAL_CONTENT,
        }
    }

    pub fn content_length(&self) -> u64 {
        match self {
            StreamingResponse::Full { content_length, .. }
            | StreamingResponse::Partial { content_length, .. } => content_length.0,
        }
    }

    pub fn has_body(&self) -> bool {
        match self {
            StreamingResponse::Full { stream, .. } | StreamingResponse::Partial { stream, .. } => {
                stream.is_some()
            }
        }
    }
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status())
            .field("content_length", &self.content_length())
            .field("has_body", &self.has_body())
            .finish()
    }
}

/// Fetches the bytes for `range` (or the whole object) and builds the
/// response around them.
///
/// `range` must already be validated against `descriptor.size_bytes`.
pub async fn compose(
    descriptor: ObjectDescriptor,
    range: Option<ByteRange>,
    gateway: &dyn ObjectGateway,
) -> Result<StreamingResponse, StreamError> {
    let body = gateway.get_object(&descriptor.key, range).await.map_err(|e| {
        tracing::error!(key = %descriptor.key, range = ?range, error = %e, "fetch from store failed");
        StreamError::from_fetch(&descriptor.key, e)
    })?;

    let length = range.map_or(descriptor.size_bytes, |r| r.len());
    let stream = RangedStream::new(descriptor.key.clone(), body, length);
    build(descriptor, range, Some(stream))
}

/// Same status and headers as [`compose`], without fetching any bytes.
pub fn compose_headers(
    descriptor: ObjectDescriptor,
    range: Option<ByteRange>,
) -> Result<StreamingResponse, StreamError> {
    build(descriptor, range, None)
}

fn build(
    descriptor: ObjectDescriptor,
    range: Option<ByteRange>,
    stream: Option<RangedStream>,
) -> Result<StreamingResponse, StreamError> {
    let ObjectDescriptor { key, size_bytes, content_type } = descriptor;
    let with_body = stream.is_some();

    match range {
        None => {
            tracing::debug!(key = %key, %content_type, size_bytes, with_body, "serving whole object");
            Ok(StreamingResponse::Full {
                content_type,
                content_length: ContentLength(size_bytes),
                stream,
            })
        }
        Some(range) => {
            // ContentRange::bytes only rejects start >= end or end > size,
            // which a validated range cannot produce
            let content_range = ContentRange::bytes(range.to_exclusive(), size_bytes)
                .map_err(|_| StreamError::RangeNotSatisfiable {
                    source: RangeError::Unsatisfiable,
                    size_bytes,
                })?;
            tracing::debug!(key = %key, %content_type, %range, size_bytes, with_body, "serving partial object");
            Ok(StreamingResponse::Partial {
                content_type,
                content_range,
                content_length: ContentLength(range.len()),
                stream,
            })
        }
    }
}

fn inline() -> (axum::http::HeaderName, HeaderValue) {
    (CONTENT_DISPOSITION, HeaderValue::from_static("inline"))
}

fn body_of(stream: Option<RangedStream>) -> Body {
    stream.map_or_else(Body::empty, Body::new)
}

impl IntoResponse for StreamingResponse {
    fn into_response(self) -> Response {
        match self {
            StreamingResponse::Full { content_type, content_length, stream } => (
                StatusCode::OK,
                TypedHeader(ContentType::from(content_type)),
                TypedHeader(content_length),
                TypedHeader(AcceptRanges::bytes()),
                [inline()],
                body_of(stream),
            )
                .into_response(),
            StreamingResponse::Partial { content_type, content_range, content_length, stream } => (
                StatusCode::PARTIAL_CONTENT,
                TypedHeader(ContentType::from(content_type)),
                TypedHeader(content_range),
                TypedHeader(content_length),
                TypedHeader(AcceptRanges::bytes()),
                [inline()],
                body_of(stream),
            )
                .into_response(),
        }
    }
}
