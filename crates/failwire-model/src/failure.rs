//! The [`Failure`] trait and ready-made failure values.
//!
//! A failure is any error raised while a request is being processed. Beyond
//! its kind and message, a failure may opt into capabilities that let its
//! author override parts of the resolution policy. Every capability
//! defaults to "absent".
//!
//! | Capability | Effect |
//! |------------|--------|
//! | [`Failure::status_code`] | used verbatim as the response status |
//! | [`Failure::to_response_status`] | used verbatim as the response body status |
//! | [`Failure::error_code`] | replaces the kind name as error code |
//! | [`Failure::param_name`] | produces one field error for that parameter |
//! | [`Failure::trace`] | origination trace, shown in debug mode only |
//! | [`Failure::as_http_error`] | already-resolved terminal response |

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;

use crate::http_error::HttpError;
use crate::kind::kinds;
use crate::status::{ResponseError, ResponseStatus};

/// An error raised while handling a request.
pub trait Failure: Error + Send + Sync + 'static {
    /// Kind name used for hierarchy matching.
    fn kind(&self) -> &str;

    /// Human-readable message.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Self-reported status code.
    fn status_code(&self) -> Option<StatusCode> {
        None
    }

    /// Self-reported error code, replacing the kind name.
    fn error_code(&self) -> Option<&str> {
        None
    }

    /// Self-built response status.
    fn to_response_status(&self) -> Option<ResponseStatus> {
        None
    }

    /// Offending field or parameter.
    fn param_name(&self) -> Option<&str> {
        None
    }

    /// Origination trace text.
    fn trace(&self) -> Option<&str> {
        None
    }

    /// The pre-resolved terminal response this failure carries.
    fn as_http_error(&self) -> Option<&HttpError> {
        None
    }
}

impl<F: Failure> From<F> for Box<dyn Failure> {
    fn from(failure: F) -> Self {
        Box::new(failure)
    }
}

/// General-purpose failure value.
///
/// ```rust
/// use failwire_model::{Failure, ServiceFailure};
///
/// let failure = ServiceFailure::argument_null("Name", "Name is required");
/// assert_eq!(failure.kind(), "ArgumentNull");
/// assert_eq!(failure.param_name(), Some("Name"));
/// ```
#[derive(Debug, Clone)]
pub struct ServiceFailure {
    kind: Cow<'static, str>,
    message: String,
    param_name: Option<String>,
    error_code: Option<String>,
    status: Option<StatusCode>,
    trace: Option<String>,
    cause: Option<Arc<dyn Error + Send + Sync>>,
}

impl ServiceFailure {
    /// Creates a failure of `kind`.
    pub fn new(kind: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            param_name: None,
            error_code: None,
            status: None,
            trace: None,
            cause: None,
        }
    }

    /// Uncategorised fault.
    pub fn fault(message: impl Into<String>) -> Self {
        Self::new(kinds::FAILURE, message)
    }

    /// Malformed argument.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(kinds::INVALID_ARGUMENT, message)
    }

    /// Required parameter missing.
    pub fn argument_null(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(kinds::ARGUMENT_NULL, message).with_param(param)
    }

    /// Parameter outside its accepted range.
    pub fn argument_out_of_range(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(kinds::ARGUMENT_OUT_OF_RANGE, message).with_param(param)
    }

    /// Operation not implemented.
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(kinds::NOT_IMPLEMENTED, message)
    }

    /// Operation not supported.
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::new(kinds::NOT_SUPPORTED, message)
    }

    /// Caller must authenticate.
    pub fn authentication_required(message: impl Into<String>) -> Self {
        Self::new(kinds::AUTHENTICATION_REQUIRED, message)
    }

    /// Caller lacks permission.
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::new(kinds::ACCESS_DENIED, message)
    }

    /// Optimistic concurrency check failed.
    pub fn concurrency_conflict(message: impl Into<String>) -> Self {
        Self::new(kinds::CONCURRENCY_CONFLICT, message)
    }

    /// Names the offending parameter.
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param_name = Some(param.into());
        self
    }

    /// Reports an explicit error code.
    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    /// Reports an explicit status code.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches trace text.
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    /// Captures the current backtrace as trace text.
    pub fn capture_trace(self) -> Self {
        let trace = Backtrace::force_capture().to_string();
        self.with_trace(trace)
    }

    /// Attaches the underlying cause.
    pub fn with_cause(mut self, cause: impl Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }
}

impl fmt::Display for ServiceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for ServiceFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_deref().map(|e| e as &(dyn Error + 'static))
    }
}

impl Failure for ServiceFailure {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn status_code(&self) -> Option<StatusCode> {
        self.status
    }

    fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    fn param_name(&self) -> Option<&str> {
        self.param_name.as_deref()
    }

    fn trace(&self) -> Option<&str> {
        self.trace.as_deref()
    }
}

/// Failure carrying several field errors, as produced by request validators.
///
/// Builds its own [`ResponseStatus`]: the error code and message come from
/// the first field error unless a summary is given, and every field error is
/// listed in the order it was added.
#[derive(Debug, Clone, Default)]
pub struct ValidationFailure {
    summary: Option<String>,
    errors: Vec<ResponseError>,
}

impl ValidationFailure {
    /// Creates an empty validation failure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the top-level message.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Adds a field error.
    pub fn field(
        mut self,
        field_name: impl Into<String>,
        error_code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.errors
            .push(ResponseError::for_field(error_code, field_name, message));
        self
    }

    /// Field errors in insertion order.
    pub fn errors(&self) -> &[ResponseError] {
        &self.errors
    }

    fn headline(&self) -> (String, String) {
        let first = self.errors.first();
        let code = first
            .map(|e| e.error_code.clone())
            .unwrap_or_else(|| kinds::VALIDATION.to_string());
        let message = self
            .summary
            .clone()
            .or_else(|| first.map(|e| e.message.clone()))
            .unwrap_or_else(|| "Validation failed".to_string());
        (code, message)
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (_, message) = self.headline();
        f.write_str(&message)
    }
}

impl Error for ValidationFailure {}

impl Failure for ValidationFailure {
    fn kind(&self) -> &str {
        kinds::VALIDATION
    }

    fn to_response_status(&self) -> Option<ResponseStatus> {
        let (code, message) = self.headline();
        let mut status = ResponseStatus::new(code, message);
        status.errors = self.errors.clone();
        Some(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_failure_capabilities() {
        let failure = ServiceFailure::argument_out_of_range("Age", "Age must be positive")
            .with_error_code("AgeRange")
            .with_status(StatusCode::UNPROCESSABLE_ENTITY);

        assert_eq!(failure.kind(), kinds::ARGUMENT_OUT_OF_RANGE);
        assert_eq!(failure.message(), "Age must be positive");
        assert_eq!(failure.param_name(), Some("Age"));
        assert_eq!(failure.error_code(), Some("AgeRange"));
        assert_eq!(failure.status_code(), Some(StatusCode::UNPROCESSABLE_ENTITY));
        assert!(failure.trace().is_none());
        assert!(failure.as_http_error().is_none());
    }

    #[test]
    fn test_cause_is_exposed_as_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let failure = ServiceFailure::fault("could not save").with_cause(io);
        assert_eq!(failure.source().unwrap().to_string(), "disk on fire");
    }

    #[test]
    fn test_capture_trace() {
        let failure = ServiceFailure::fault("boom").capture_trace();
        assert!(failure.trace().is_some());
    }

    #[test]
    fn test_validation_failure_status() {
        let failure = ValidationFailure::new()
            .field("Email", "NotEmpty", "Email is required")
            .field("Age", "GreaterThan", "Age must be over 18");

        let status = failure.to_response_status().unwrap();
        assert_eq!(status.error_code, "NotEmpty");
        assert_eq!(status.message, "Email is required");
        assert_eq!(status.errors.len(), 2);
        assert_eq!(status.errors[1].field_name.as_deref(), Some("Age"));
    }

    #[test]
    fn test_validation_failure_summary() {
        let failure = ValidationFailure::new().with_summary("Request is invalid");
        let status = failure.to_response_status().unwrap();
        assert_eq!(status.error_code, kinds::VALIDATION);
        assert_eq!(status.message, "Request is invalid");
        assert_eq!(failure.to_string(), "Request is invalid");
    }

    #[test]
    fn test_boxing() {
        let failure: Box<dyn Failure> = ServiceFailure::not_supported("nope").into();
        assert_eq!(failure.kind(), kinds::NOT_SUPPORTED);
    }
}
