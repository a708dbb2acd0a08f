//! Response body observer.
//!
//! `ObservedBody` wraps the response body produced by the inner service and
//! forwards every frame untouched. Data bytes are teed into a bounded buffer
//! and counted; once the body has been fully emitted the completion callback
//! runs exactly once with what was seen.
//!
//! Completion is signalled either by the inner body yielding its last frame
//! or, when the server stops polling because `is_end_stream` turned true, by
//! the wrapper being dropped afterwards. Bodies that are never sent can be
//! marked with `complete_on_drop`. A body dropped early (client went
//! away) or ending in an error never completes.

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;

/// What the observer saw of a fully emitted body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodySummary {
    /// Emitted bytes, empty when `overflowed`.
    pub captured: Vec<u8>,
    /// Total data bytes emitted.
    pub total_bytes: usize,
    /// The body was larger than the capture limit.
    pub overflowed: bool,
}

/// Callback run once the body has been emitted.
pub type OnComplete = Box<dyn FnOnce(BodySummary) + Send + 'static>;

pin_project! {
    /// Wrap-and-delegate body that records what it emits.
    pub struct ObservedBody<B> {
        #[pin]
        inner: B,
        tap: Tap,
    }
}

impl<B: Body> ObservedBody<B> {
    pub fn new(inner: B, capture_limit: usize, on_complete: OnComplete) -> Self {
        let complete = inner.is_end_stream();
        Self {
            inner,
            tap: Tap {
                buffer: Vec::new(),
                limit: capture_limit,
                total: 0,
                overflowed: false,
                complete,
                on_complete: Some(on_complete),
            },
        }
    }

    /// Treat the body as emitted even if it is dropped unpolled.
    ///
    /// Used for responses whose body is never sent, such as replies to `HEAD`.
    pub fn complete_on_drop(mut self) -> Self {
        self.tap.complete = true;
        self
    }
}

impl<B> Body for ObservedBody<B>
where
    B: Body<Data = Bytes>,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let mut this = self.project();
        match ready!(this.inner.as_mut().poll_frame(cx)) {
            Some(Ok(frame)) => {
                if let Some(data) = frame.data_ref() {
                    this.tap.observe(data);
                }
                if this.inner.is_end_stream() {
                    this.tap.complete = true;
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Some(Err(e)) => {
                this.tap.abandon("Response body failed while streaming");
                Poll::Ready(Some(Err(e)))
            }
            None => {
                this.tap.complete = true;
                this.tap.finish();
                Poll::Ready(None)
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

struct Tap {
    buffer: Vec<u8>,
    limit: usize,
    total: usize,
    overflowed: bool,
    complete: bool,
    on_complete: Option<OnComplete>,
}

impl Tap {
    fn observe(&mut self, data: &[u8]) {
        self.total += data.len();
        if self.overflowed {
            return;
        }
        if self.buffer.len() + data.len() > self.limit {
            self.overflowed = true;
            self.buffer = Vec::new();
        } else {
            self.buffer.extend_from_slice(data);
        }
    }

    fn finish(&mut self) {
        if let Some(on_complete) = self.on_complete.take() {
            on_complete(BodySummary {
                captured: std::mem::take(&mut self.buffer),
                total_bytes: self.total,
                overflowed: self.overflowed,
            });
        }
    }

    fn abandon(&mut self, reason: &'static str) {
        if self.on_complete.take().is_some() {
            tracing::debug!(bytes_sent = self.total, "{reason}; telemetry skipped");
        }
    }
}

impl Drop for Tap {
    fn drop(&mut self) {
        if self.complete {
            self.finish();
        } else {
            self.abandon("Response body dropped before completion");
        }
    }
}
