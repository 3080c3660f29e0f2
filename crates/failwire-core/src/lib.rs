//! # Failwire Core
//!
//! Turns failures raised while handling a request into well-formed error
//! responses with an HTTP status code.
//!
//! ## Resolution
//!
//! | Step | Component | Decides |
//! |------|-----------|---------|
//! | 1 | `HttpError` check | Pre-resolved replies, passed through verbatim |
//! | 2 | Runner hook | Per-request-type override |
//! | 3 | Service-exception chain | Host-registered handlers, in order |
//! | 4 | Classifier + builder + resolver | Status code, body and container |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        FAILWIRE CORE                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │                    ┌─────────────────┐                          │
//! │                    │  ErrorPipeline  │  ← Facade                │
//! │                    └────────┬────────┘                          │
//! │                             │                                   │
//! │         ┌───────────────────┼───────────────────┐               │
//! │         ▼                   ▼                   ▼               │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐          │
//! │  │   Handler   │    │   Status    │    │  Response   │          │
//! │  │   Chains    │    │ Classifier  │    │  Status +   │          │
//! │  │             │    │             │    │  Shape      │          │
//! │  └─────────────┘    └─────────────┘    └─────────────┘          │
//! │                             │                                   │
//! │                             ▼                                   │
//! │             ┌───────────────────────────────┐                   │
//! │             │ Codec / Fallback page → Sink  │                   │
//! │             └───────────────────────────────┘                   │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use failwire_core::{ErrorPipeline, PipelineConfig, RequestContext};
//!
//! let config = PipelineConfig::load("failwire.toml")?;
//! let pipeline = ErrorPipeline::builder()
//!     .apply_config(&config)?
//!     .response_type::<CreateUserResponse>("CreateUserResponse")
//!     .on_service_exception(|ctx, request, failure| None)
//!     .build();
//!
//! // In the host's request loop:
//! let ctx = RequestContext::new("CreateUser").with_accept(accept_header);
//! pipeline.respond(&ctx, &request, &mut sink, &failure)?;
//! ```
//!
//! ## Notes
//!
//! - A failure is classified at most once per request
//! - A chain entry that answers fully supersedes classification
//! - Traces reach the body only in debug mode

mod builder;
mod chain;
mod classifier;
mod codec;
mod config;
mod enrich;
mod error;
mod pages;
mod pipeline;
mod reply;
mod shape;
mod sink;

pub use builder::{strip_param_annotation, ResponseStatusBuilder, DEFAULT_PARAM_MARKER};
pub use chain::{
    Disposition, HandlerChains, RequestContext, ServiceExceptionHandler, ServiceRunner,
    UncaughtExceptionHandler,
};
pub use classifier::{Classification, StatusClassifier, StatusOverrideTable, StatusSource};
pub use codec::{Codec, Codecs, JsonCodec, JSON_CONTENT_TYPE};
pub use config::{
    FallbackConfig, FieldErrorConfig, KindConfig, PipelineConfig, ResponseConfig, StatusOverride,
};
pub use enrich::{CauseParamEnricher, FieldErrorEnricher};
pub use error::PipelineError;
pub use pages::{FallbackPages, PageRenderer, StaticPage};
pub use pipeline::{ErrorPipeline, ErrorPipelineBuilder};
pub use reply::{ErrorReply, ReplyBody};
pub use shape::{ResolvedShape, ResponseTypes, ShapeResolver, DEFAULT_TYPE_SUFFIX};
pub use sink::{BufferedSink, ResponseSink};

/// Core result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests;
