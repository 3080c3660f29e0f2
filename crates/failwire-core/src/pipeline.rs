//! The error pipeline facade.
//!
//! [`ErrorPipeline`] ties the classifier, the status builder, enrichment,
//! shape resolution and the handler chains together, and writes the
//! resulting [`ErrorReply`] to a [`ResponseSink`].

use std::any::Any;

use failwire_model::{Failure, FailureCategory, KindHierarchy, ModelError, ResponseDto, ResponseStatus};
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use tracing::{debug, info, warn};

use crate::{
    builder::{ResponseStatusBuilder, DEFAULT_PARAM_MARKER},
    chain::{
        Disposition, FnRunner, FnServiceHandler, FnUncaughtHandler, HandlerChains, RequestContext,
        ServiceExceptionHandler, ServiceRunner, UncaughtExceptionHandler,
    },
    classifier::{Classification, StatusClassifier, StatusOverrideTable},
    codec::{Codec, Codecs},
    config::PipelineConfig,
    enrich::{self, CauseParamEnricher, FieldErrorEnricher, FnEnricher},
    error::PipelineError,
    pages::{FallbackPages, PageRenderer},
    reply::{ErrorReply, ReplyBody},
    shape::{ResolvedShape, ResponseTypes, ShapeResolver, DEFAULT_TYPE_SUFFIX},
    sink::ResponseSink,
    Result,
};

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Translates failures into error replies.
///
/// For a failure raised inside a request handler the resolution order is:
/// 1. a pre-resolved [`HttpError`](failwire_model::HttpError), returned verbatim
/// 2. the runner hook for the request type
/// 3. the service-exception chain
/// 4. classification, status building, enrichment and shape resolution
///
/// The first step that produces a reply ends resolution. Failures raised
/// outside a handler go to the uncaught-exception chain and then to a
/// last-resort reply.
///
/// Built once through [`ErrorPipelineBuilder`]; every method takes `&self`,
/// so one pipeline can be shared across threads behind an `Arc`.
///
/// # Example
///
/// ```rust
/// use failwire_core::{BufferedSink, ErrorPipeline, RequestContext};
/// use failwire_model::ServiceFailure;
///
/// let pipeline = ErrorPipeline::builder().build();
/// let ctx = RequestContext::new("CreateUser");
/// let failure = ServiceFailure::argument_null("Name", "Name is required");
///
/// let mut sink = BufferedSink::new();
/// pipeline.respond(&ctx, &(), &mut sink, &failure).unwrap();
///
/// assert_eq!(sink.status().unwrap().as_u16(), 400);
/// ```
pub struct ErrorPipeline {
    debug_mode: bool,
    classifier: StatusClassifier,
    status_builder: ResponseStatusBuilder,
    enrichers: Vec<Box<dyn FieldErrorEnricher>>,
    shapes: ShapeResolver,
    chains: HandlerChains,
    codecs: Codecs,
    pages: FallbackPages,
}

impl std::fmt::Debug for ErrorPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorPipeline")
            .field("debug_mode", &self.debug_mode)
            .field("classifier", &self.classifier)
            .field("status_builder", &self.status_builder)
            .field("enrichers", &self.enrichers.len())
            .field("shapes", &self.shapes)
            .field("chains", &self.chains)
            .field("codecs", &self.codecs)
            .field("pages", &self.pages)
            .finish()
    }
}

impl ErrorPipeline {
    /// Start building a pipeline.
    pub fn builder() -> ErrorPipelineBuilder {
        ErrorPipelineBuilder::new()
    }

    /// Build a pipeline from configuration alone.
    ///
    /// # Errors
    ///
    /// Returns an error if a kind names an unknown parent or an override
    /// has an invalid status code.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Ok(Self::builder().apply_config(config)?.build())
    }

    /// Whether traces are included in bodies.
    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    /// The status classifier.
    pub fn classifier(&self) -> &StatusClassifier {
        &self.classifier
    }

    /// The handler chains.
    pub fn chains(&self) -> &HandlerChains {
        &self.chains
    }

    /// Status code for `failure`.
    pub fn classify(&self, failure: &dyn Failure) -> StatusCode {
        self.classifier.classify(failure)
    }

    /// Status code for `failure` and the rule that chose it.
    pub fn explain(&self, failure: &dyn Failure) -> Classification {
        self.classifier.explain(failure)
    }

    /// The enriched response status for `failure`.
    pub fn build_status(&self, failure: &dyn Failure) -> ResponseStatus {
        let mut status = self.status_builder.build(failure, self.debug_mode);
        enrich::apply(&self.enrichers, failure, &mut status);
        status
    }

    /// The container for a request of type `request_type`.
    pub fn resolve_shape(
        &self,
        request_type: &str,
        status: ResponseStatus,
        partial: Option<Box<dyn ResponseDto>>,
    ) -> ResolvedShape {
        self.shapes.resolve(request_type, status, partial)
    }

    /// Reply for a failure raised inside a request handler.
    ///
    /// Always produces a reply.
    pub fn handle_service_exception(
        &self,
        ctx: &RequestContext,
        request: &dyn Any,
        failure: &dyn Failure,
    ) -> ErrorReply {
        if let Some(http_error) = failure.as_http_error() {
            debug!("Pre-resolved {} for '{}'", http_error.status(), ctx.operation());
            return ErrorReply::from_http_error(http_error.clone());
        }

        if let Some(reply) = self.chains.run_runner(ctx, request, failure) {
            return reply;
        }

        if let Some(reply) = self.chains.run_service(ctx, request, failure) {
            return reply;
        }

        self.default_reply(ctx, failure)
    }

    /// Reply from classification and status building alone, skipping every
    /// chain.
    pub fn default_reply(&self, ctx: &RequestContext, failure: &dyn Failure) -> ErrorReply {
        let classification = self.classifier.explain(failure);
        info!(
            "'{}' in '{}' mapped to {} ({})",
            failure.kind(),
            ctx.operation(),
            classification.status,
            classification.source
        );

        let status = self.build_status(failure);
        let shape = self.shapes.resolve(ctx.operation(), status, None);
        ErrorReply::structured(classification.status, shape.body)
    }

    /// Handle a failure raised outside a request handler.
    ///
    /// The uncaught-exception chain gets the sink first. If every entry
    /// declines, a last-resort reply is written. An entry that wrote part of
    /// a body has its response ended as it stands.
    ///
    /// # Errors
    ///
    /// Returns an error if the last-resort reply cannot be encoded or
    /// written.
    pub fn handle_uncaught_exception(
        &self,
        ctx: &RequestContext,
        sink: &mut dyn ResponseSink,
        failure: &dyn Failure,
    ) -> Result<()> {
        if self.chains.run_uncaught(ctx, sink, failure) == Disposition::Handled {
            if !sink.is_ended() {
                debug!("Ending response for '{}' left open by the uncaught chain", ctx.operation());
                sink.end_request();
            }
            return Ok(());
        }

        let reply = self.last_resort(failure);
        self.write_reply(ctx, sink, reply)
    }

    /// Reply used when nothing else resolved an outside-handler failure:
    /// an `HttpError` as built, anything else a 500 naming the kind.
    pub fn last_resort(&self, failure: &dyn Failure) -> ErrorReply {
        if let Some(http_error) = failure.as_http_error() {
            return ErrorReply::from_http_error(http_error.clone());
        }

        warn!("Unhandled '{}': {}", failure.kind(), failure.message());
        let mut status = ResponseStatus::new(failure.kind(), failure.message());
        if self.debug_mode {
            status.stack_trace = failure.trace().map(str::to_string);
        }
        ErrorReply::generic(StatusCode::INTERNAL_SERVER_ERROR, status)
    }

    /// Resolve a handler failure and write the reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the reply cannot be encoded or written.
    pub fn respond(
        &self,
        ctx: &RequestContext,
        request: &dyn Any,
        sink: &mut dyn ResponseSink,
        failure: &dyn Failure,
    ) -> Result<()> {
        let reply = self.handle_service_exception(ctx, request, failure);
        self.write_reply(ctx, sink, reply)
    }

    /// Write `reply` to `sink` and end the request.
    ///
    /// Structured bodies are replaced by a fallback page when the client
    /// prefers HTML and a page exists for the status; otherwise they are
    /// encoded with the codec negotiated from the `Accept` header. Replies
    /// from an `HttpError` are never replaced. Nothing is written to a sink
    /// that already holds body bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails, a content type is not a valid
    /// header value, or the sink refuses the body.
    pub fn write_reply(
        &self,
        ctx: &RequestContext,
        sink: &mut dyn ResponseSink,
        mut reply: ErrorReply,
    ) -> Result<()> {
        if sink.is_ended() {
            warn!("Response for '{}' already ended, dropping reply", ctx.operation());
            return Ok(());
        }

        if sink.is_committed() {
            warn!("Response for '{}' already has a body, dropping reply", ctx.operation());
            sink.end_request();
            return Ok(());
        }

        if reply.is_structured() && !reply.is_pre_resolved() && ctx.prefers_html() {
            if let Some(page) = self.pages.resolve(reply.status()) {
                debug!("Fallback page for {}", reply.status());
                let html = page.render(reply.status(), reply.response_status());
                reply.replace_body(ReplyBody::Page(html));
            }
        }

        let (status, headers, body) = reply.into_parts();
        sink.set_status(status);
        for (name, value) in &headers {
            sink.append_header(name.clone(), value.clone());
        }

        match body {
            ReplyBody::Structured(body) => {
                let codec = self.codecs.negotiate(ctx.accept());
                let bytes = codec.encode(&body)?;
                sink.set_header(CONTENT_TYPE, content_type_value(codec.content_type())?);
                sink.write_body(&bytes)?;
            }
            ReplyBody::Raw {
                content_type,
                bytes,
            } => {
                sink.set_header(CONTENT_TYPE, content_type_value(&content_type)?);
                sink.write_body(&bytes)?;
            }
            ReplyBody::Page(html) => {
                sink.set_header(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
                sink.write_body(html.as_bytes())?;
            }
            ReplyBody::Empty => {}
        }

        sink.end_request();
        Ok(())
    }
}

fn content_type_value(content_type: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(content_type).map_err(|e| PipelineError::Codec {
        content_type: content_type.to_string(),
        reason: e.to_string(),
    })
}

/// Builder for [`ErrorPipeline`].
///
/// Starts from the built-in kinds, an empty override table, JSON as the only
/// codec and no chain entries.
pub struct ErrorPipelineBuilder {
    debug_mode: bool,
    kinds: KindHierarchy,
    overrides: StatusOverrideTable,
    param_marker: String,
    enrich_from_causes: bool,
    enrichers: Vec<Box<dyn FieldErrorEnricher>>,
    types: ResponseTypes,
    chains: HandlerChains,
    codecs: Codecs,
    pages: FallbackPages,
}

impl std::fmt::Debug for ErrorPipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorPipelineBuilder")
            .field("debug_mode", &self.debug_mode)
            .field("kinds", &self.kinds.len())
            .field("overrides", &self.overrides)
            .field("param_marker", &self.param_marker)
            .field("enrich_from_causes", &self.enrich_from_causes)
            .field("enrichers", &self.enrichers.len())
            .field("types", &self.types)
            .field("chains", &self.chains)
            .field("codecs", &self.codecs)
            .field("pages", &self.pages)
            .finish()
    }
}

impl Default for ErrorPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorPipelineBuilder {
    /// Create a builder with defaults.
    pub fn new() -> Self {
        Self {
            debug_mode: false,
            kinds: KindHierarchy::builtin(),
            overrides: StatusOverrideTable::new(),
            param_marker: DEFAULT_PARAM_MARKER.to_string(),
            enrich_from_causes: false,
            enrichers: Vec::new(),
            types: ResponseTypes::new(DEFAULT_TYPE_SUFFIX),
            chains: HandlerChains::new(),
            codecs: Codecs::default(),
            pages: FallbackPages::new(),
        }
    }

    /// Include origination traces in bodies.
    pub fn debug_mode(mut self, enabled: bool) -> Self {
        self.debug_mode = enabled;
        self
    }

    /// Register a failure kind.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` is not registered.
    pub fn register_kind(
        mut self,
        name: &str,
        parent: Option<&str>,
        category: Option<FailureCategory>,
    ) -> Result<Self> {
        self.kinds.register(name, parent, category)?;
        Ok(self)
    }

    /// Map `kind` and its sub-kinds to `status`. A later mapping for the
    /// same kind is ignored.
    pub fn map_status(mut self, kind: impl Into<String>, status: StatusCode) -> Self {
        self.overrides.insert(kind, status);
        self
    }

    /// Marker separating a message from its parameter annotation.
    pub fn param_marker(mut self, marker: impl Into<String>) -> Self {
        self.param_marker = marker.into();
        self
    }

    /// Append field errors reported by nested causes.
    pub fn enrich_from_causes(mut self, enabled: bool) -> Self {
        self.enrich_from_causes = enabled;
        self
    }

    /// Add a field-error enricher.
    pub fn enricher(mut self, enricher: impl FieldErrorEnricher + 'static) -> Self {
        self.enrichers.push(Box::new(enricher));
        self
    }

    /// Add a field-error enricher from a closure.
    pub fn on_enrich<F>(self, enricher: F) -> Self
    where
        F: Fn(&dyn Failure, &ResponseStatus) -> Vec<failwire_model::ResponseError> + Send + Sync + 'static,
    {
        self.enricher(FnEnricher(enricher))
    }

    /// Register a response DTO under `type_name`.
    pub fn response_type<T>(mut self, type_name: impl Into<String>) -> Self
    where
        T: ResponseDto + Default + 'static,
    {
        self.types.register::<T>(type_name);
        self
    }

    /// Suffix appended to request type names to find their response type.
    pub fn response_type_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.types.set_suffix(suffix);
        self
    }

    /// Set the runner hook for request type `operation`.
    pub fn runner(mut self, operation: impl Into<String>, runner: impl ServiceRunner + 'static) -> Self {
        self.chains.set_runner(operation, Box::new(runner));
        self
    }

    /// Set the runner hook for request type `operation` from a closure.
    pub fn on_runner_exception<F>(self, operation: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&RequestContext, &dyn Any, &dyn Failure) -> Option<ErrorReply> + Send + Sync + 'static,
    {
        self.runner(operation, FnRunner(hook))
    }

    /// Append to the service-exception chain.
    pub fn service_exception_handler(mut self, handler: impl ServiceExceptionHandler + 'static) -> Self {
        self.chains.push_service(Box::new(handler));
        self
    }

    /// Append a closure to the service-exception chain.
    pub fn on_service_exception<F>(self, handler: F) -> Self
    where
        F: Fn(&RequestContext, &dyn Any, &dyn Failure) -> Option<ErrorReply> + Send + Sync + 'static,
    {
        self.service_exception_handler(FnServiceHandler(handler))
    }

    /// Append to the uncaught-exception chain.
    pub fn uncaught_exception_handler(mut self, handler: impl UncaughtExceptionHandler + 'static) -> Self {
        self.chains.push_uncaught(Box::new(handler));
        self
    }

    /// Append a closure to the uncaught-exception chain.
    pub fn on_uncaught_exception<F>(self, handler: F) -> Self
    where
        F: Fn(&RequestContext, &mut dyn ResponseSink, &dyn Failure) -> Disposition + Send + Sync + 'static,
    {
        self.uncaught_exception_handler(FnUncaughtHandler(handler))
    }

    /// Register a codec after the existing ones.
    pub fn codec(mut self, codec: impl Codec + 'static) -> Self {
        self.codecs.register(Box::new(codec));
        self
    }

    /// Page used for any status without its own page.
    pub fn fallback_page(mut self, renderer: impl PageRenderer + 'static) -> Self {
        self.pages.set_global(Box::new(renderer));
        self
    }

    /// Page for one status code.
    pub fn status_page(mut self, status: StatusCode, renderer: impl PageRenderer + 'static) -> Self {
        self.pages.set_status(status, Box::new(renderer));
        self
    }

    /// Apply a configuration file's settings on top of the builder's.
    ///
    /// Kinds are registered in file order, so a kind may name a parent
    /// defined earlier in the same file. Flags that are off in the file
    /// leave the builder's flags alone, and a marker or suffix equal to the
    /// default does not replace one set earlier. Overrides keep first-wins
    /// order, so mappings made before this call take precedence.
    ///
    /// # Errors
    ///
    /// Returns an error if a kind names an unknown parent, an override
    /// has an invalid status code, or a fallback page key is not a status.
    pub fn apply_config(mut self, config: &PipelineConfig) -> Result<Self> {
        self.debug_mode |= config.debug_mode;

        for kind in &config.kinds {
            self.kinds
                .register(&kind.name, kind.parent.as_deref(), kind.category)?;
        }

        for entry in &config.status_overrides {
            let status = StatusCode::from_u16(entry.status)
                .map_err(|_| ModelError::InvalidStatusCode(entry.status))?;
            self.overrides.insert(entry.kind.as_str(), status);
        }

        if config.field_errors.param_marker != DEFAULT_PARAM_MARKER {
            self.param_marker = config.field_errors.param_marker.clone();
        }
        self.enrich_from_causes |= config.field_errors.enrich_from_causes;
        if config.response.type_suffix != DEFAULT_TYPE_SUFFIX {
            self.types.set_suffix(config.response.type_suffix.as_str());
        }

        self.pages.apply_config(&config.fallback)?;

        Ok(self)
    }

    /// Finish building.
    pub fn build(self) -> ErrorPipeline {
        let mut enrichers = self.enrichers;
        if self.enrich_from_causes {
            enrichers.insert(0, Box::new(CauseParamEnricher::new(self.param_marker.as_str())));
        }

        info!(
            "Error pipeline ready: {} kinds, {} overrides, {} service handlers, {} uncaught handlers",
            self.kinds.len(),
            self.overrides.len(),
            self.chains.service_len(),
            self.chains.uncaught_len()
        );

        ErrorPipeline {
            debug_mode: self.debug_mode,
            classifier: StatusClassifier::new(self.kinds, self.overrides),
            status_builder: ResponseStatusBuilder::new(self.param_marker),
            enrichers,
            shapes: ShapeResolver::new(self.types),
            chains: self.chains,
            codecs: self.codecs,
            pages: self.pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::BufferedSink;
    use failwire_model::{kinds, HttpError, ServiceFailure};
    use serde_json::{json, Value};

    fn body_json(sink: &BufferedSink) -> Value {
        serde_json::from_slice(sink.body()).unwrap()
    }

    #[test]
    fn test_pipeline_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ErrorPipeline>();
    }

    #[test]
    fn test_default_reply() {
        let pipeline = ErrorPipeline::builder().build();
        let ctx = RequestContext::new("CreateUser");
        let reply = pipeline.handle_service_exception(&ctx, &(), &ServiceFailure::access_denied("No"));

        assert_eq!(reply.status(), StatusCode::FORBIDDEN);
        assert_eq!(reply.response_status().unwrap().error_code, kinds::ACCESS_DENIED);
    }

    #[test]
    fn test_http_error_skips_chains() {
        let pipeline = ErrorPipeline::builder()
            .on_service_exception(|_, _, _| Some(ErrorReply::empty(StatusCode::IM_A_TEAPOT)))
            .build();
        let ctx = RequestContext::new("GetOrder");
        let reply = pipeline.handle_service_exception(&ctx, &(), &HttpError::not_found("gone"));

        assert_eq!(reply.status(), StatusCode::NOT_FOUND);
        assert_eq!(reply.response_status().unwrap().error_code, "NotFound");
    }

    #[test]
    fn test_runner_beats_service_chain() {
        let pipeline = ErrorPipeline::builder()
            .on_runner_exception("GetOrder", |_, _, _| Some(ErrorReply::empty(StatusCode::GONE)))
            .on_service_exception(|_, _, _| Some(ErrorReply::empty(StatusCode::IM_A_TEAPOT)))
            .build();

        let failure = ServiceFailure::fault("boom");
        let get = pipeline.handle_service_exception(&RequestContext::new("GetOrder"), &(), &failure);
        let put = pipeline.handle_service_exception(&RequestContext::new("PutOrder"), &(), &failure);

        assert_eq!(get.status(), StatusCode::GONE);
        assert_eq!(put.status(), StatusCode::IM_A_TEAPOT);
    }

    #[test]
    fn test_write_reply_encodes_json() {
        let pipeline = ErrorPipeline::builder().build();
        let ctx = RequestContext::new("CreateUser");
        let mut sink = BufferedSink::new();
        pipeline
            .respond(&ctx, &(), &mut sink, &ServiceFailure::concurrency_conflict("stale"))
            .unwrap();

        assert_eq!(sink.status(), Some(StatusCode::CONFLICT));
        assert_eq!(sink.headers().get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(
            body_json(&sink),
            json!({ "responseStatus": { "errorCode": "ConcurrencyConflict", "message": "stale" } })
        );
        assert!(sink.is_ended());
    }

    #[test]
    fn test_write_reply_to_ended_sink_is_noop() {
        let pipeline = ErrorPipeline::builder().build();
        let mut sink = BufferedSink::new();
        sink.end_request();
        let reply = ErrorReply::empty(StatusCode::CONFLICT);
        pipeline
            .write_reply(&RequestContext::new("X"), &mut sink, reply)
            .unwrap();
        assert!(sink.status().is_none());
    }

    #[test]
    fn test_write_reply_keeps_repeated_headers() {
        use http::header::SET_COOKIE;

        let pipeline = ErrorPipeline::builder().build();
        let failure = HttpError::unauthorized("Session expired")
            .with_header(SET_COOKIE, HeaderValue::from_static("session=; Max-Age=0"))
            .with_header(SET_COOKIE, HeaderValue::from_static("remember=; Max-Age=0"));

        let mut sink = BufferedSink::new();
        pipeline
            .respond(&RequestContext::new("GetOrder"), &(), &mut sink, &failure)
            .unwrap();

        let cookies: Vec<_> = sink
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap())
            .collect();
        assert_eq!(cookies, vec!["session=; Max-Age=0", "remember=; Max-Age=0"]);
        assert_eq!(sink.headers().get_all(CONTENT_TYPE).iter().count(), 1);
    }

    #[test]
    fn test_write_reply_to_committed_sink_ends_it() {
        let pipeline = ErrorPipeline::builder().build();
        let mut sink = BufferedSink::new();
        sink.write_body(b"partial").unwrap();

        let reply = ErrorReply::generic(StatusCode::CONFLICT, ResponseStatus::new("Conflict", "stale"));
        pipeline
            .write_reply(&RequestContext::new("X"), &mut sink, reply)
            .unwrap();

        assert_eq!(sink.body_str(), "partial");
        assert!(sink.status().is_none());
        assert!(sink.is_ended());
    }

    #[test]
    fn test_structured_http_error_skips_fallback_page() {
        let pipeline = ErrorPipeline::builder()
            .fallback_page(crate::pages::StaticPage::new("<h1>Oops</h1>"))
            .build();
        let ctx = RequestContext::new("GetOrder").with_accept("text/html");

        let mut sink = BufferedSink::new();
        pipeline
            .respond(&ctx, &(), &mut sink, &HttpError::not_found("Order 42 does not exist"))
            .unwrap();
        assert_eq!(sink.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(sink.headers().get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(
            body_json(&sink),
            json!({ "responseStatus": { "errorCode": "NotFound", "message": "Order 42 does not exist" } })
        );

        let mut sink = BufferedSink::new();
        pipeline
            .respond(&ctx, &(), &mut sink, &ServiceFailure::fault("boom"))
            .unwrap();
        assert_eq!(sink.body_str(), "<h1>Oops</h1>");
    }

    #[test]
    fn test_invalid_raw_content_type() {
        let pipeline = ErrorPipeline::builder().build();
        let mut sink = BufferedSink::new();
        let reply = ErrorReply::raw(StatusCode::BAD_GATEWAY, "text/plain\n", "x");
        let err = pipeline
            .write_reply(&RequestContext::new("X"), &mut sink, reply)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Codec { .. }));
    }

    #[test]
    fn test_last_resort() {
        let pipeline = ErrorPipeline::builder().debug_mode(true).build();
        let failure = ServiceFailure::invalid_argument("bad json").with_trace("at binder.rs:3");
        let reply = pipeline.last_resort(&failure);

        assert_eq!(reply.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let status = reply.response_status().unwrap();
        assert_eq!(status.error_code, kinds::INVALID_ARGUMENT);
        assert_eq!(status.message, "bad json");
        assert_eq!(status.stack_trace.as_deref(), Some("at binder.rs:3"));
    }

    #[test]
    fn test_register_kind_unknown_parent() {
        let err = ErrorPipeline::builder()
            .register_kind("PaymentDeclined", Some("NoSuchKind"), None)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Model(_)));
    }

    #[test]
    fn test_custom_kind_inherits_override() {
        let pipeline = ErrorPipeline::builder()
            .register_kind("PaymentDeclined", Some(kinds::INVALID_ARGUMENT), None)
            .unwrap()
            .map_status(kinds::INVALID_ARGUMENT, StatusCode::UNPROCESSABLE_ENTITY)
            .build();
        let failure = ServiceFailure::new("PaymentDeclined", "card declined");
        assert_eq!(pipeline.classify(&failure), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_builder_debug_output() {
        let builder = ErrorPipeline::builder()
            .debug_mode(true)
            .map_status(kinds::CONCURRENCY_CONFLICT, StatusCode::CONFLICT);
        let rendered = format!("{:?}", builder);
        assert!(rendered.starts_with("ErrorPipelineBuilder"));
        assert!(rendered.contains("debug_mode: true"));
    }

    #[test]
    fn test_apply_config_keeps_builder_settings() {
        let pipeline = ErrorPipeline::builder()
            .debug_mode(true)
            .param_marker("(Parameter")
            .response_type_suffix("Result")
            .fallback_page(crate::pages::StaticPage::new("<h1>Mine</h1>"))
            .apply_config(&PipelineConfig::default())
            .unwrap()
            .build();
        assert!(pipeline.debug_mode());

        let failure = ServiceFailure::argument_null("Name", "Name is required (Parameter 'Name')")
            .with_trace("at users.rs:7");
        let status = pipeline.build_status(&failure);
        assert_eq!(status.errors[0].message, "Name is required");
        assert_eq!(status.stack_trace.as_deref(), Some("at users.rs:7"));

        let browser = RequestContext::new("GetOrder").with_accept("text/html");
        let mut sink = BufferedSink::new();
        pipeline
            .respond(&browser, &(), &mut sink, &ServiceFailure::fault("boom"))
            .unwrap();
        assert_eq!(sink.body_str(), "<h1>Mine</h1>");
    }

    #[test]
    fn test_apply_config_values_replace_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [field_errors]
            param_marker = "(Parameter"
            "#,
        )
        .unwrap();
        let pipeline = ErrorPipeline::builder()
            .apply_config(&config)
            .unwrap()
            .build();
        assert!(!pipeline.debug_mode());

        let failure = ServiceFailure::argument_null("Name", "Name is required (Parameter 'Name')");
        let status = pipeline.build_status(&failure);
        assert_eq!(status.errors[0].message, "Name is required");
    }

    #[test]
    fn test_from_config() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [[kinds]]
            name = "PaymentDeclined"
            parent = "InvalidArgument"

            [[status_overrides]]
            kind = "PaymentDeclined"
            status = 402
            "#,
        )
        .unwrap();
        let pipeline = ErrorPipeline::from_config(&config).unwrap();
        let failure = ServiceFailure::new("PaymentDeclined", "card declined");
        assert_eq!(pipeline.classify(&failure), StatusCode::PAYMENT_REQUIRED);
    }
}
