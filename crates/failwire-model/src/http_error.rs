//! Explicit terminal responses.
//!
//! An [`HttpError`] is already resolved: status, headers and body are exactly
//! what the caller built. Raising one as a failure skips classification.

use std::error::Error;
use std::fmt;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;

use crate::body::ErrorBody;
use crate::error::{ModelError, Result};
use crate::failure::Failure;
use crate::kind::kinds;
use crate::status::ResponseStatus;

/// Body of an [`HttpError`].
#[derive(Debug, Clone)]
pub enum HttpErrorBody {
    /// A status wrapped into the generic container on the way out.
    Status(ResponseStatus),
    /// A fully built container.
    Container(ErrorBody),
    /// Bytes written as-is.
    Raw {
        /// Content type of `bytes`.
        content_type: String,
        /// Body bytes.
        bytes: Vec<u8>,
    },
    /// No body.
    Empty,
}

/// A pre-resolved error response.
///
/// ```rust
/// use failwire_model::HttpError;
/// use http::StatusCode;
///
/// let err = HttpError::not_found("Order 42 does not exist");
/// assert_eq!(err.status(), StatusCode::NOT_FOUND);
/// assert_eq!(err.response_status().unwrap().error_code, "NotFound");
/// ```
#[derive(Debug, Clone)]
pub struct HttpError {
    status: StatusCode,
    headers: HeaderMap,
    body: HttpErrorBody,
}

impl HttpError {
    /// Message body with an error code derived from the status reason.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self::with_error_code(status, default_error_code(status), message)
    }

    /// Message body with an explicit error code.
    pub fn with_error_code(
        status: StatusCode,
        error_code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::from_status(status, ResponseStatus::new(error_code, message))
    }

    /// Full structured status.
    pub fn from_status(status: StatusCode, response_status: ResponseStatus) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: HttpErrorBody::Status(response_status),
        }
    }

    /// Prebuilt container.
    pub fn from_body(status: StatusCode, body: ErrorBody) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: HttpErrorBody::Container(body),
        }
    }

    /// Raw content.
    pub fn raw(status: StatusCode, content_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: HttpErrorBody::Raw {
                content_type: content_type.into(),
                bytes: bytes.into(),
            },
        }
    }

    /// Status only.
    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: HttpErrorBody::Empty,
        }
    }

    /// Builds from a numeric status.
    ///
    /// # Errors
    ///
    /// Returns an error if `code` is not a valid status code.
    pub fn from_code(code: u16, message: impl Into<String>) -> Result<Self> {
        let status = StatusCode::from_u16(code).map_err(|_| ModelError::InvalidStatusCode(code))?;
        Ok(Self::new(status, message))
    }

    /// 400.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 401.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// 403.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// 404.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// 409.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Adds a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Adds a header from strings.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or value is not valid HTTP.
    pub fn try_with_header(self, name: &str, value: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| ModelError::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| ModelError::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok(self.with_header(header_name, header_value))
    }

    /// Status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Body.
    pub fn body(&self) -> &HttpErrorBody {
        &self.body
    }

    /// The structured status, if the body has one.
    pub fn response_status(&self) -> Option<&ResponseStatus> {
        match &self.body {
            HttpErrorBody::Status(status) => Some(status),
            HttpErrorBody::Container(body) => body.response_status(),
            HttpErrorBody::Raw { .. } | HttpErrorBody::Empty => None,
        }
    }

    /// Splits into parts.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, HttpErrorBody) {
        (self.status, self.headers, self.body)
    }
}

/// Reason phrase with everything but letters and digits removed,
/// e.g. `NotFound`.
pub fn default_error_code(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => reason.chars().filter(|c| c.is_ascii_alphanumeric()).collect(),
        None => status.as_u16().to_string(),
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.response_status() {
            Some(status) => write!(f, "{}: {}", self.status, status.message),
            None => write!(f, "{}", self.status),
        }
    }
}

impl Error for HttpError {}

impl Failure for HttpError {
    fn kind(&self) -> &str {
        kinds::HTTP_ERROR
    }

    fn message(&self) -> String {
        self.response_status()
            .map(|s| s.message.clone())
            .unwrap_or_else(|| self.status.to_string())
    }

    fn status_code(&self) -> Option<StatusCode> {
        Some(self.status)
    }

    fn error_code(&self) -> Option<&str> {
        self.response_status().map(|s| s.error_code.as_str())
    }

    fn to_response_status(&self) -> Option<ResponseStatus> {
        self.response_status().cloned()
    }

    fn as_http_error(&self) -> Option<&HttpError> {
        Some(self)
    }
}
