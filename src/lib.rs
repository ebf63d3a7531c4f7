//! # media-range-stream
//!
//! Streams media objects out of an object store over HTTP with byte-range
//! support, the way browsers and players expect when seeking.
//!
//! Objects are reached through the [`ObjectGateway`] trait. [`StoreGateway`]
//! implements it for any [`object_store::ObjectStore`], so the same service
//! runs against Amazon S3, a local directory, or an in-memory store.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use object_store::memory::InMemory;
//! use media_range_stream::{router, AppState, StoreGateway};
//!
//! #[tokio::main]
//! async fn main() {
//!     let gateway = StoreGateway::new(Arc::new(InMemory::new()), "memory");
//!     let app = router(AppState::new(Arc::new(gateway)), "./static");
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8888").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```
//!
//! Only single ranges are served. `Range: bytes=A-B` with `B` past the end of
//! the object is answered with `416`, it is not clamped. `bytes=-N` is read as
//! `bytes=0-N` and checked the same way. `HEAD` requests get the headers of the
//! matching `GET` without reading the object.

pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod range;
pub mod responder;
mod stream;

use std::path::Path;

use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use error::StreamError;
pub use gateway::{ByteStream, GatewayError, ObjectGateway, ObjectHead, StoreGateway};
pub use handlers::{AppState, CatalogEntry};
pub use range::{parse_range, ByteRange, RangeError};
pub use responder::{compose, compose_headers, ObjectDescriptor, StreamingResponse, MIN_SANE_OBJECT_SIZE};
pub use stream::RangedStream;

/// Builds the HTTP service: `/video/{*key}` streaming, the `/videos`
/// catalog, and static files from `static_dir` for every other path.
pub fn router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/videos", get(handlers::list_videos))
        .route("/video", get(handlers::missing_key))
        .route("/video/", get(handlers::missing_key))
        .route("/video/{*key}", get(handlers::stream_video))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
