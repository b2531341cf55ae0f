//! Response bridge.
//!
//! # Data Flow
//! ```text
//! SsrResponse (status, header multimap, lazy body)
//!     → cookie extraction (engine capability, optional)
//!     → sink.write_head(status, headers)      exactly once
//!     → sink.write(chunk) per body chunk       in body order, awaiting the sink
//!     → sink.end()                             exactly once
//!       (sink.abort() instead when the body faults)
//! ```
//!
//! # Design Decisions
//! - Never buffers the body: one chunk is pulled only after the previous write resolved
//! - `Set-Cookie` values stay separate header entries, never comma-joined
//! - A body fault still finishes the sink through [`ResponseSink::abort`], then
//!   surfaces as [`BridgeError::Body`]
//! - A sink fault propagates immediately; the sink is not touched again

pub mod sink;

use axum::body::Bytes;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use futures_util::StreamExt;
use thiserror::Error;

use crate::render::{BoxError, SsrEngine, SsrResponse};

pub use sink::{channel_sink, ChannelSink, PendingResponse, ResponseSink, SinkError};

/// Failures while delivering a response.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("response sink failed: {0}")]
    Sink(#[from] SinkError),

    #[error("response body failed after {chunks} chunk(s): {source}")]
    Body {
        chunks: usize,
        #[source]
        source: BoxError,
    },
}

/// Summary of a completed delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub chunks: usize,
    pub bytes: usize,
}

/// Write `response` into `sink`.
///
/// Cookies reported by `engine` are appended as distinct `Set-Cookie` entries
/// (values already present in the response headers are not repeated).
pub async fn deliver<S>(
    sink: &mut S,
    engine: &dyn SsrEngine,
    response: SsrResponse,
) -> Result<Delivery, BridgeError>
where
    S: ResponseSink + ?Sized,
{
    let cookies = engine.set_cookie_headers(&response).unwrap_or_default();
    let SsrResponse {
        status,
        mut headers,
        body,
        ..
    } = response;

    append_cookies(&mut headers, cookies);
    sink.write_head(status, headers).await?;

    let mut delivery = Delivery::default();
    if let Some(mut body) = body {
        while let Some(next) = body.next().await {
            match next {
                Ok(chunk) => {
                    delivery.bytes += chunk.len();
                    sink.write(chunk).await?;
                    delivery.chunks += 1;
                }
                Err(source) => {
                    sink.abort().await?;
                    return Err(BridgeError::Body {
                        chunks: delivery.chunks,
                        source,
                    });
                }
            }
        }
    }

    sink.end().await?;
    Ok(delivery)
}

fn append_cookies(headers: &mut HeaderMap, cookies: Vec<HeaderValue>) {
    let existing: Vec<HeaderValue> = headers.get_all(SET_COOKIE).iter().cloned().collect();
    for cookie in cookies {
        if !existing.contains(&cookie) {
            headers.append(SET_COOKIE, cookie);
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use axum::http::StatusCode;

    /// One recorded sink call.
    #[derive(Debug, Clone, PartialEq)]
    pub enum SinkCall {
        Head(StatusCode, HeaderMap),
        Write(Bytes),
        End,
    }

    /// Sink that records every call, optionally failing the n-th write.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub calls: Vec<SinkCall>,
        pub fail_on_write: Option<usize>,
    }

    impl RecordingSink {
        pub fn heads(&self) -> usize {
            self.calls.iter().filter(|c| matches!(c, SinkCall::Head(..))).count()
        }

        pub fn writes(&self) -> Vec<Bytes> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    SinkCall::Write(b) => Some(b.clone()),
                    _ => None,
                })
                .collect()
        }

        pub fn ends(&self) -> usize {
            self.calls.iter().filter(|c| matches!(c, SinkCall::End)).count()
        }

        pub fn head_headers(&self) -> Option<&HeaderMap> {
            self.calls.iter().find_map(|c| match c {
                SinkCall::Head(_, h) => Some(h),
                _ => None,
            })
        }
    }

    #[async_trait]
    impl ResponseSink for RecordingSink {
        async fn write_head(&mut self, status: StatusCode, headers: HeaderMap) -> Result<(), SinkError> {
            self.calls.push(SinkCall::Head(status, headers));
            Ok(())
        }

        async fn write(&mut self, chunk: Bytes) -> Result<(), SinkError> {
            if self.fail_on_write == Some(self.writes().len()) {
                return Err(SinkError::Closed);
            }
            self.calls.push(SinkCall::Write(chunk));
            Ok(())
        }

        async fn end(&mut self) -> Result<(), SinkError> {
            self.calls.push(SinkCall::End);
            Ok(())
        }
    }
}
