//! Imperative response sinks.
//!
//! A sink is written to incrementally: exactly one head, any number of body
//! writes, then exactly one end. [`ChannelSink`] turns those calls into an axum
//! [`Response`] whose body is fed through a bounded channel, so a slow client
//! slows down the writer instead of growing a buffer.

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Response, StatusCode};
use futures_util::stream;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Errors raised by a response sink.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SinkError {
    #[error("response head already written")]
    HeadAlreadyWritten,
    #[error("response head not written yet")]
    HeadNotWritten,
    #[error("response already ended")]
    Ended,
    #[error("client connection closed")]
    Closed,
    #[error("response body aborted")]
    Aborted,
}

/// Write-then-end response target.
#[async_trait]
pub trait ResponseSink: Send {
    /// Send status and headers. Must be called exactly once, before any write.
    async fn write_head(&mut self, status: StatusCode, headers: HeaderMap) -> Result<(), SinkError>;

    /// Send one body chunk.
    async fn write(&mut self, chunk: Bytes) -> Result<(), SinkError>;

    /// Finish the response. No writes are accepted afterwards.
    async fn end(&mut self) -> Result<(), SinkError>;

    /// Finish a response whose body failed part way through.
    ///
    /// Sinks that can signal truncation to the client override this. The
    /// default is a plain [`ResponseSink::end`].
    async fn abort(&mut self) -> Result<(), SinkError> {
        self.end().await
    }
}

/// State of the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    /// Head not sent yet.
    Initial,
    /// Head sent, body chunks may follow.
    Streaming,
    /// End called.
    Ended,
}

/// Sink that hands its output to an axum response through channels.
pub struct ChannelSink {
    state: SinkState,
    head: Option<oneshot::Sender<(StatusCode, HeaderMap)>>,
    body: Option<mpsc::Sender<Result<Bytes, SinkError>>>,
}

/// The receiving half of a [`ChannelSink`].
pub struct PendingResponse {
    head: oneshot::Receiver<(StatusCode, HeaderMap)>,
    body: mpsc::Receiver<Result<Bytes, SinkError>>,
}

/// Create a sink and the response it feeds.
///
/// `capacity` is the number of chunks that may be queued before `write` waits.
pub fn channel_sink(capacity: usize) -> (ChannelSink, PendingResponse) {
    let (head_tx, head_rx) = oneshot::channel();
    let (body_tx, body_rx) = mpsc::channel(capacity.max(1));

    (
        ChannelSink {
            state: SinkState::Initial,
            head: Some(head_tx),
            body: Some(body_tx),
        },
        PendingResponse {
            head: head_rx,
            body: body_rx,
        },
    )
}

#[async_trait]
impl ResponseSink for ChannelSink {
    async fn write_head(&mut self, status: StatusCode, headers: HeaderMap) -> Result<(), SinkError> {
        if self.state != SinkState::Initial {
            return Err(SinkError::HeadAlreadyWritten);
        }
        let head = self.head.take().ok_or(SinkError::HeadAlreadyWritten)?;
        head.send((status, headers)).map_err(|_| SinkError::Closed)?;
        self.state = SinkState::Streaming;
        Ok(())
    }

    async fn write(&mut self, chunk: Bytes) -> Result<(), SinkError> {
        match self.state {
            SinkState::Initial => return Err(SinkError::HeadNotWritten),
            SinkState::Ended => return Err(SinkError::Ended),
            SinkState::Streaming => {}
        }
        let body = self.body.as_ref().ok_or(SinkError::Ended)?;
        body.send(Ok(chunk)).await.map_err(|_| SinkError::Closed)
    }

    async fn end(&mut self) -> Result<(), SinkError> {
        match self.state {
            SinkState::Initial => return Err(SinkError::HeadNotWritten),
            SinkState::Ended => return Err(SinkError::Ended),
            SinkState::Streaming => {}
        }
        // Dropping the sender terminates the body stream.
        self.body = None;
        self.state = SinkState::Ended;
        Ok(())
    }

    /// Ends the body stream with an error, so the transfer is cut off instead
    /// of looking complete.
    async fn abort(&mut self) -> Result<(), SinkError> {
        match self.state {
            SinkState::Initial => return Err(SinkError::HeadNotWritten),
            SinkState::Ended => return Err(SinkError::Ended),
            SinkState::Streaming => {}
        }
        if let Some(body) = self.body.take() {
            // A client that already left has nothing to be told.
            let _ = body.send(Err(SinkError::Aborted)).await;
        }
        self.state = SinkState::Ended;
        Ok(())
    }
}

impl PendingResponse {
    /// Wait for the head and build a response streaming the remaining writes.
    ///
    /// Fails with [`SinkError::Closed`] if the sink is dropped before its head
    /// was written.
    pub async fn into_response(self) -> Result<Response<Body>, SinkError> {
        let (status, headers) = self.head.await.map_err(|_| SinkError::Closed)?;

        let chunks = stream::unfold(self.body, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });

        let mut response = Response::new(Body::from_stream(chunks));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
