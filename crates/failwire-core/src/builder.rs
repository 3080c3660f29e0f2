//! Building the [`ResponseStatus`] for a failure.

use failwire_model::{Failure, ResponseError, ResponseStatus};

/// Marker used when none is configured.
pub const DEFAULT_PARAM_MARKER: &str = "Parameter name:";

/// Turns failures into response statuses.
///
/// Pure: the same failure and debug flag always give the same status.
#[derive(Debug, Clone)]
pub struct ResponseStatusBuilder {
    param_marker: String,
}

impl Default for ResponseStatusBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PARAM_MARKER)
    }
}

impl ResponseStatusBuilder {
    /// Creates a builder splitting parameter annotations at `param_marker`.
    pub fn new(param_marker: impl Into<String>) -> Self {
        Self {
            param_marker: param_marker.into(),
        }
    }

    /// The configured marker.
    pub fn param_marker(&self) -> &str {
        &self.param_marker
    }

    /// Builds the status for `failure`.
    ///
    /// A failure that builds its own status gets it back untouched. Otherwise
    /// the status carries the failure's error code and message, one field
    /// error if the failure names a parameter, and the trace when
    /// `debug_mode` is on.
    pub fn build(&self, failure: &dyn Failure, debug_mode: bool) -> ResponseStatus {
        if let Some(status) = failure.to_response_status() {
            return status;
        }

        let error_code = failure.error_code().unwrap_or(failure.kind()).to_string();
        let message = failure.message();
        let mut status = ResponseStatus::new(error_code.clone(), message.clone());

        if let Some(param) = failure.param_name() {
            let field_message = strip_param_annotation(&message, &self.param_marker);
            status.push_error(ResponseError::for_field(error_code, param, field_message));
        }

        if debug_mode {
            status.stack_trace = failure.trace().map(str::to_string);
        }

        status
    }

    /// `message` up to the configured marker.
    pub fn strip<'a>(&self, message: &'a str) -> &'a str {
        strip_param_annotation(message, &self.param_marker)
    }
}

/// Cuts `message` at the first `marker` and trims what is left.
pub fn strip_param_annotation<'a>(message: &'a str, marker: &str) -> &'a str {
    match message.split_once(marker) {
        Some((prefix, _)) => prefix.trim(),
        None => message.trim(),
    }
}
