//! # Failwire Model
//!
//! The failure side and the wire side of the error-to-response pipeline.
//!
//! - [`Failure`]: what a request handler raises, with optional capabilities
//!   that let its author override classification.
//! - [`KindHierarchy`]: failure kinds with precomputed ancestor lists.
//! - [`ResponseStatus`], [`ResponseError`], [`ErrorResponse`]: the payload
//!   clients receive.
//! - [`ErrorBody`], [`ResponseDto`]: the container a payload travels in.
//! - [`HttpError`]: a response built by hand that skips classification.
//!
//! ## Usage
//!
//! ```rust
//! use failwire_model::{Failure, KindHierarchy, ServiceFailure};
//!
//! let kinds = KindHierarchy::builtin();
//! let failure = ServiceFailure::argument_null("Name", "Name is required");
//!
//! assert!(kinds.is_kind_of(failure.kind(), "InvalidArgument"));
//! ```

mod body;
mod error;
mod failure;
mod http_error;
mod kind;
mod status;

pub use body::{ErrorBody, HasResponseStatus, ResponseDto};
pub use error::{ModelError, Result};
pub use failure::{Failure, ServiceFailure, ValidationFailure};
pub use http_error::{default_error_code, HttpError, HttpErrorBody};
pub use kind::{kinds, FailureCategory, KindHierarchy};
pub use status::{ErrorResponse, ResponseError, ResponseStatus};
