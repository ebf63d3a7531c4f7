use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use http_body::{Body, Frame, SizeHint};
use pin_project::{pin_project, pinned_drop};

use crate::error::StreamError;
use crate::gateway::ByteStream;

/// Response body forwarding an object stream to the client.
///
/// Emits exactly `length` bytes: surplus bytes from the store are cut off and
/// a short store stream ends the body with an error, so hyper never sends a
/// body that disagrees with `Content-Length`. Implements [`Stream`] and
/// [`Body`].
#[pin_project(PinnedDrop)]
pub struct RangedStream {
    key: String,
    remaining: u64,
    length: u64,
    state: StreamState,
    #[pin]
    body: ByteStream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    Reading,
    Done,
    Failed,
}

impl RangedStream {
    pub(crate) fn new(key: impl Into<String>, body: ByteStream, length: u64) -> Self {
        let state = if length == 0 { StreamState::Done } else { StreamState::Reading };
        RangedStream {
            key: key.into(),
            remaining: length,
            length,
            state,
            body,
        }
    }

    /// Bytes not yet handed to the client.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl Body for RangedStream {
    type Data = Bytes;
    type Error = io::Error;

    fn is_end_stream(&self) -> bool {
        self.state != StreamState::Reading
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.remaining)
    }

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>)
        -> Poll<Option<io::Result<Frame<Bytes>>>>
    {
        self.poll_next(cx).map(|item| item.map(|result| result.map(Frame::data)))
    }
}

impl Stream for RangedStream {
    type Item = io::Result<Bytes>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>
    ) -> Poll<Option<io::Result<Bytes>>> {
        let mut this = self.project();

        if *this.state != StreamState::Reading {
            return Poll::Ready(None);
        }

        loop {
            match this.body.as_mut().poll_next(cx) {
                Poll::Pending => { return Poll::Pending; }
                Poll::Ready(Some(Ok(chunk))) if chunk.is_empty() => { continue; }
                Poll::Ready(Some(Ok(mut chunk))) => {
                    if (chunk.len() as u64) >= *this.remaining {
                        chunk.truncate(*this.remaining as usize);
                        *this.remaining = 0;
                        *this.state = StreamState::Done;
                    } else {
                        *this.remaining -= chunk.len() as u64;
                    }
                    return Poll::Ready(Some(Ok(chunk)));
                }
                Poll::Ready(Some(Err(e))) => {
                    *this.state = StreamState::Failed;
                    let err = StreamError::StreamInterrupted(e.to_string());
                    tracing::warn!(
                        key = %this.key,
                        sent = *this.length - *this.remaining,
                        remaining = *this.remaining,
                        error = %err,
                        "store read failed mid-stream"
                    );
                    return Poll::Ready(Some(Err(io::Error::other(err))));
                }
                Poll::Ready(None) => {
                    *this.state = StreamState::Failed;
                    let err = StreamError::StreamInterrupted(format!(
                        "store stream ended with {} bytes outstanding",
                        this.remaining
                    ));
                    tracing::warn!(key = %this.key, remaining = *this.remaining, error = %err, "short read from store");
                    return Poll::Ready(Some(Err(io::Error::new(io::ErrorKind::UnexpectedEof, err))));
                }
            }
        }
    }
}

#[pinned_drop]
impl PinnedDrop for RangedStream {
    fn drop(self: Pin<&mut Self>) {
        // dropping `body` here releases the store connection
        if self.state == StreamState::Reading {
            tracing::debug!(
                key = %self.key,
                sent = self.length - self.remaining,
                remaining = self.remaining,
                "client went away before the body finished"
            );
        }
    }
}
