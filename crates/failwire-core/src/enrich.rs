//! Field-error enrichment.
//!
//! Enrichers run after the base status is built and before the response
//! shape is resolved. They can only add field errors; anything that repeats
//! an existing (field, code) pair is dropped.

use std::error::Error;

use failwire_model::{Failure, ResponseError, ResponseStatus, ServiceFailure, ValidationFailure};
use tracing::debug;

use crate::builder::strip_param_annotation;

/// Contributes extra field errors for a failure.
pub trait FieldErrorEnricher: Send + Sync {
    /// Field errors to append to `status`.
    fn enrich(&self, failure: &dyn Failure, status: &ResponseStatus) -> Vec<ResponseError>;
}

pub(crate) struct FnEnricher<F>(pub(crate) F);

impl<F> FieldErrorEnricher for FnEnricher<F>
where
    F: Fn(&dyn Failure, &ResponseStatus) -> Vec<ResponseError> + Send + Sync,
{
    fn enrich(&self, failure: &dyn Failure, status: &ResponseStatus) -> Vec<ResponseError> {
        (self.0)(failure, status)
    }
}

/// Appends field errors reported by nested causes.
///
/// Walks the failure's `source()` chain. A [`ServiceFailure`] naming a
/// parameter contributes one field error; a [`ValidationFailure`]
/// contributes all of its field errors.
#[derive(Debug, Clone)]
pub struct CauseParamEnricher {
    param_marker: String,
}

impl CauseParamEnricher {
    /// Creates an enricher that strips messages at `param_marker`.
    pub fn new(param_marker: impl Into<String>) -> Self {
        Self {
            param_marker: param_marker.into(),
        }
    }
}

impl FieldErrorEnricher for CauseParamEnricher {
    fn enrich(&self, failure: &dyn Failure, _status: &ResponseStatus) -> Vec<ResponseError> {
        let mut found = Vec::new();
        let mut cause: Option<&(dyn Error + 'static)> = failure.source();

        while let Some(current) = cause {
            if let Some(nested) = current.downcast_ref::<ServiceFailure>() {
                if let Some(param) = nested.param_name() {
                    let code = nested.error_code().unwrap_or(nested.kind());
                    let message = nested.message();
                    found.push(ResponseError::for_field(
                        code,
                        param,
                        strip_param_annotation(&message, &self.param_marker),
                    ));
                }
            } else if let Some(nested) = current.downcast_ref::<ValidationFailure>() {
                found.extend(nested.errors().iter().cloned());
            }
            cause = current.source();
        }

        found
    }
}

/// Runs every enricher in order, appending only new errors.
pub(crate) fn apply(
    enrichers: &[Box<dyn FieldErrorEnricher>],
    failure: &dyn Failure,
    status: &mut ResponseStatus,
) {
    for enricher in enrichers {
        for error in enricher.enrich(failure, status) {
            if status.has_error(error.field_name.as_deref(), &error.error_code) {
                debug!(
                    "Skipping duplicate field error {:?}/{}",
                    error.field_name, error.error_code
                );
                continue;
            }
            status.push_error(error);
        }
    }
}
