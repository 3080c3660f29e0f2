//! Error types for Failwire Core.
//!
//! These are the pipeline's own errors (bad configuration, codec or sink
//! failures). They are distinct from the request failures the pipeline
//! translates, which never surface as a `PipelineError`.

use std::path::PathBuf;

use thiserror::Error;

/// Core error type for pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`crate::PipelineConfig`].
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The configuration parsed but is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Kind or header registration failed.
    #[error("Model error: {0}")]
    Model(#[from] failwire_model::ModelError),

    /// A codec could not encode a body.
    #[error("Codec error ({content_type}): {reason}")]
    Codec {
        /// Content type of the failing codec.
        content_type: String,
        /// What went wrong.
        reason: String,
    },

    /// The response sink refused a write.
    #[error("Sink error: {0}")]
    Sink(String),
}
