//! Wire-level error payloads.
//!
//! These are the only types with a stable wire contract. Field names are
//! camelCase in every schema-less format:
//!
//! ```json
//! {
//!   "responseStatus": {
//!     "errorCode": "ArgumentNull",
//!     "message": "Name is required",
//!     "errors": [
//!       { "errorCode": "ArgumentNull", "fieldName": "Name", "message": "Name is required" }
//!     ],
//!     "stackTrace": "..."
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

/// One field-level error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseError {
    /// Machine-readable error code.
    pub error_code: String,

    /// Offending field or parameter, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,

    /// Human-readable message.
    pub message: String,
}

impl ResponseError {
    /// Creates an error not tied to a field.
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            field_name: None,
            message: message.into(),
        }
    }

    /// Creates an error for a named field.
    pub fn for_field(
        error_code: impl Into<String>,
        field_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            field_name: Some(field_name.into()),
            message: message.into(),
        }
    }
}

/// Canonical structured error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseStatus {
    /// Error code, normally the failure's kind name.
    pub error_code: String,

    /// Human-readable message.
    pub message: String,

    /// Field errors in the order they were added.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ResponseError>,

    /// Origination trace. Only ever set in debug mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

impl ResponseStatus {
    /// Creates a status with no field errors.
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            errors: Vec::new(),
            stack_trace: None,
        }
    }

    /// Appends a field error.
    pub fn with_error(mut self, error: ResponseError) -> Self {
        self.errors.push(error);
        self
    }

    /// Appends a field error in place.
    pub fn push_error(&mut self, error: ResponseError) {
        self.errors.push(error);
    }

    /// Whether an error with the same field and code is already present.
    pub fn has_error(&self, field_name: Option<&str>, error_code: &str) -> bool {
        self.errors
            .iter()
            .any(|e| e.field_name.as_deref() == field_name && e.error_code == error_code)
    }

    /// Looks up the first error reported against `field_name`.
    pub fn field_error(&self, field_name: &str) -> Option<&ResponseError> {
        self.errors
            .iter()
            .find(|e| e.field_name.as_deref() == Some(field_name))
    }
}

/// Generic response container used when no typed response is registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// The one status this response carries.
    pub response_status: ResponseStatus,
}

impl ErrorResponse {
    /// Wraps a status.
    pub fn new(response_status: ResponseStatus) -> Self {
        Self { response_status }
    }
}

impl From<ResponseStatus> for ErrorResponse {
    fn from(response_status: ResponseStatus) -> Self {
        Self::new(response_status)
    }
}
