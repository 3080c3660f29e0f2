//! Error types for the failure model.

use thiserror::Error;

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised while assembling the failure model at startup.
///
/// None of these occur while a request is being handled; they surface
/// when kinds or headers are registered with bad input.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A kind was registered under a parent that does not exist yet.
    #[error("kind '{kind}' names unknown parent '{parent}'")]
    UnknownParentKind {
        /// Kind being registered.
        kind: String,
        /// Parent that could not be found.
        parent: String,
    },

    /// A kind was registered twice.
    #[error("kind '{0}' is already registered")]
    DuplicateKind(String),

    /// A numeric status code outside 100..=999.
    #[error("invalid status code: {0}")]
    InvalidStatusCode(u16),

    /// A header name or value that is not valid HTTP.
    #[error("invalid header '{name}': {reason}")]
    InvalidHeader {
        /// Header name as supplied.
        name: String,
        /// Why it was rejected.
        reason: String,
    },
}
