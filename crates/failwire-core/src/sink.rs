//! Where replies are written.
//!
//! The host adapts its HTTP response object to [`ResponseSink`]. The
//! pipeline sets the status, then headers, then writes the body once and
//! ends the request. A sink that already holds body bytes is never written
//! to again.

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;

use crate::error::PipelineError;
use crate::Result;

/// A response being written for the current request.
pub trait ResponseSink {
    /// Set the status code.
    fn set_status(&mut self, status: StatusCode);

    /// Set a header, replacing earlier values for `name`.
    fn set_header(&mut self, name: HeaderName, value: HeaderValue);

    /// Add a header value, keeping earlier values for `name`.
    fn append_header(&mut self, name: HeaderName, value: HeaderValue);

    /// Append body bytes.
    fn write_body(&mut self, bytes: &[u8]) -> Result<()>;

    /// Mark the response complete. Later writes fail.
    fn end_request(&mut self);

    /// Whether the response is complete.
    fn is_ended(&self) -> bool;

    /// Whether body bytes have been written.
    fn is_committed(&self) -> bool;
}

/// An in-memory [`ResponseSink`].
#[derive(Debug, Clone, Default)]
pub struct BufferedSink {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
    ended: bool,
}

impl BufferedSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The status written so far.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// The headers written so far.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The body bytes written so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body as UTF-8, lossily.
    pub fn body_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

impl ResponseSink for BufferedSink {
    fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    fn append_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.append(name, value);
    }

    fn write_body(&mut self, bytes: &[u8]) -> Result<()> {
        if self.ended {
            return Err(PipelineError::Sink("response already ended".to_string()));
        }
        self.body.extend_from_slice(bytes);
        Ok(())
    }

    fn end_request(&mut self) {
        self.ended = true;
    }

    fn is_ended(&self) -> bool {
        self.ended
    }

    fn is_committed(&self) -> bool {
        !self.body.is_empty()
    }
}
