//! The final response value produced for a failure.

use failwire_model::{ErrorBody, HttpError, HttpErrorBody, ResponseStatus};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;

/// What the client receives.
///
/// Every failure handled by the pipeline ends in exactly one `ErrorReply`:
/// - `Structured`: a container that still has to be encoded by a codec
/// - `Raw`: bytes written as-is with their own content type
/// - `Page`: a rendered fallback page
/// - `Empty`: status and headers only
#[derive(Debug, Clone)]
pub enum ReplyBody {
    /// A container to be encoded.
    Structured(ErrorBody),

    /// Pre-encoded bytes.
    Raw {
        /// Content type of `bytes`.
        content_type: String,
        /// Body bytes.
        bytes: Vec<u8>,
    },

    /// A rendered HTML page.
    Page(String),

    /// No body.
    Empty,
}

/// Status, headers and body for one failed request.
#[derive(Debug, Clone)]
pub struct ErrorReply {
    status: StatusCode,
    headers: HeaderMap,
    body: ReplyBody,
    pre_resolved: bool,
}

impl ErrorReply {
    /// Create a reply with an arbitrary body.
    pub fn new(status: StatusCode, body: ReplyBody) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body,
            pre_resolved: false,
        }
    }

    /// Create a reply carrying a container.
    pub fn structured(status: StatusCode, body: ErrorBody) -> Self {
        Self::new(status, ReplyBody::Structured(body))
    }

    /// Create a reply wrapping `response_status` in the generic container.
    pub fn generic(status: StatusCode, response_status: ResponseStatus) -> Self {
        Self::structured(status, ErrorBody::generic(response_status))
    }

    /// Create a reply with pre-encoded bytes.
    pub fn raw(status: StatusCode, content_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(
            status,
            ReplyBody::Raw {
                content_type: content_type.into(),
                bytes: bytes.into(),
            },
        )
    }

    /// Create a reply with a rendered page.
    pub fn page(status: StatusCode, html: impl Into<String>) -> Self {
        Self::new(status, ReplyBody::Page(html.into()))
    }

    /// Create a reply without a body.
    pub fn empty(status: StatusCode) -> Self {
        Self::new(status, ReplyBody::Empty)
    }

    /// Convert a pre-resolved [`HttpError`] without touching its contents.
    ///
    /// The reply is written as built: no fallback page replaces its body.
    pub fn from_http_error(error: HttpError) -> Self {
        let (status, headers, body) = error.into_parts();
        let body = match body {
            HttpErrorBody::Status(response_status) => {
                ReplyBody::Structured(ErrorBody::generic(response_status))
            }
            HttpErrorBody::Container(body) => ReplyBody::Structured(body),
            HttpErrorBody::Raw {
                content_type,
                bytes,
            } => ReplyBody::Raw {
                content_type,
                bytes,
            },
            HttpErrorBody::Empty => ReplyBody::Empty,
        };
        Self {
            status,
            headers,
            body,
            pre_resolved: true,
        }
    }

    /// Add a header. Existing values for `name` are kept.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// The status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The body.
    pub fn body(&self) -> &ReplyBody {
        &self.body
    }

    /// The structured status in the body, if any.
    pub fn response_status(&self) -> Option<&ResponseStatus> {
        match &self.body {
            ReplyBody::Structured(body) => body.response_status(),
            _ => None,
        }
    }

    /// Returns true if the reply came from an [`HttpError`].
    pub fn is_pre_resolved(&self) -> bool {
        self.pre_resolved
    }

    /// Returns true if the body still needs a codec.
    pub fn is_structured(&self) -> bool {
        matches!(self.body, ReplyBody::Structured(_))
    }

    /// Replace the body, keeping status and headers.
    pub(crate) fn replace_body(&mut self, body: ReplyBody) {
        self.body = body;
    }

    /// Split into parts.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, ReplyBody) {
        (self.status, self.headers, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{CONTENT_TYPE, RETRY_AFTER};

    #[test]
    fn test_from_http_error_wraps_status() {
        let error = HttpError::not_found("Order 42 does not exist");
        let reply = ErrorReply::from_http_error(error);

        assert_eq!(reply.status(), StatusCode::NOT_FOUND);
        assert!(reply.is_structured());
        let status = reply.response_status().unwrap();
        assert_eq!(status.error_code, "NotFound");
        assert_eq!(status.message, "Order 42 does not exist");
        assert!(reply.is_pre_resolved());
    }

    #[test]
    fn test_built_replies_are_not_pre_resolved() {
        let status = ResponseStatus::new("Conflict", "stale");
        assert!(!ErrorReply::generic(StatusCode::CONFLICT, status).is_pre_resolved());
        assert!(!ErrorReply::empty(StatusCode::GONE).is_pre_resolved());
    }

    #[test]
    fn test_from_http_error_keeps_headers() {
        let error = HttpError::new(StatusCode::SERVICE_UNAVAILABLE, "down")
            .with_header(RETRY_AFTER, HeaderValue::from_static("30"));
        let reply = ErrorReply::from_http_error(error);
        assert_eq!(reply.headers().get(RETRY_AFTER).unwrap(), "30");
    }

    #[test]
    fn test_from_http_error_raw() {
        let error = HttpError::raw(StatusCode::BAD_GATEWAY, "text/plain", "upstream gone");
        let reply = ErrorReply::from_http_error(error);
        match reply.body() {
            ReplyBody::Raw { content_type, bytes } => {
                assert_eq!(content_type, "text/plain");
                assert_eq!(bytes, b"upstream gone");
            }
            other => panic!("Expected raw body, got {:?}", other),
        }
        assert!(reply.response_status().is_none());
    }

    #[test]
    fn test_from_http_error_empty() {
        let reply = ErrorReply::from_http_error(HttpError::empty(StatusCode::GONE));
        assert!(matches!(reply.body(), ReplyBody::Empty));
    }

    #[test]
    fn test_with_header_appends() {
        let reply = ErrorReply::empty(StatusCode::CONFLICT)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert_eq!(reply.headers().len(), 1);
        assert!(!reply.is_structured());
    }
}
