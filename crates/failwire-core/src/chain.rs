//! Handler chains.
//!
//! Failures raised inside a request handler go, in order, to:
//!
//! 1. the runner hook registered for the request type;
//! 2. the service-exception chain, in registration order.
//!
//! The first reply wins and nothing after it runs. Failures raised outside
//! a handler go to the uncaught-exception chain, whose entries write to the
//! response sink themselves.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use failwire_model::Failure;
use tracing::debug;

use crate::codec::media_type;
use crate::reply::ErrorReply;
use crate::sink::ResponseSink;

/// What is known about the request a failure belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    operation: String,
    accept: Option<String>,
    path: Option<String>,
}

impl RequestContext {
    /// Context for a request of type `operation`, e.g. `CreateUser`.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            accept: None,
            path: None,
        }
    }

    /// Set the `Accept` header value.
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Set the request path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Request type name.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// `Accept` header value.
    pub fn accept(&self) -> Option<&str> {
        self.accept.as_deref()
    }

    /// Request path.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Whether the client listed `text/html` first.
    pub fn prefers_html(&self) -> bool {
        self.accept
            .as_deref()
            .and_then(|accept| accept.split(',').find_map(media_type))
            .map_or(false, |first| first.eq_ignore_ascii_case("text/html"))
    }
}

/// Per-request-type hook, consulted before either chain.
pub trait ServiceRunner: Send + Sync {
    /// A reply for `failure`, or `None` to fall through.
    fn handle_exception(
        &self,
        ctx: &RequestContext,
        request: &dyn Any,
        failure: &dyn Failure,
    ) -> Option<ErrorReply>;
}

/// Entry in the service-exception chain.
pub trait ServiceExceptionHandler: Send + Sync {
    /// A reply for `failure`, or `None` to decline.
    fn handle(&self, ctx: &RequestContext, request: &dyn Any, failure: &dyn Failure) -> Option<ErrorReply>;
}

/// Outcome of an uncaught-exception chain entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The entry wrote the response.
    Handled,
    /// The entry left the response alone.
    Declined,
}

/// Entry in the uncaught-exception chain.
pub trait UncaughtExceptionHandler: Send + Sync {
    /// Write a response to `sink` for `failure`, or decline.
    fn handle(
        &self,
        ctx: &RequestContext,
        sink: &mut dyn ResponseSink,
        failure: &dyn Failure,
    ) -> Disposition;
}

pub(crate) struct FnRunner<F>(pub(crate) F);

impl<F> ServiceRunner for FnRunner<F>
where
    F: Fn(&RequestContext, &dyn Any, &dyn Failure) -> Option<ErrorReply> + Send + Sync,
{
    fn handle_exception(
        &self,
        ctx: &RequestContext,
        request: &dyn Any,
        failure: &dyn Failure,
    ) -> Option<ErrorReply> {
        (self.0)(ctx, request, failure)
    }
}

pub(crate) struct FnServiceHandler<F>(pub(crate) F);

impl<F> ServiceExceptionHandler for FnServiceHandler<F>
where
    F: Fn(&RequestContext, &dyn Any, &dyn Failure) -> Option<ErrorReply> + Send + Sync,
{
    fn handle(&self, ctx: &RequestContext, request: &dyn Any, failure: &dyn Failure) -> Option<ErrorReply> {
        (self.0)(ctx, request, failure)
    }
}

pub(crate) struct FnUncaughtHandler<F>(pub(crate) F);

impl<F> UncaughtExceptionHandler for FnUncaughtHandler<F>
where
    F: Fn(&RequestContext, &mut dyn ResponseSink, &dyn Failure) -> Disposition + Send + Sync,
{
    fn handle(
        &self,
        ctx: &RequestContext,
        sink: &mut dyn ResponseSink,
        failure: &dyn Failure,
    ) -> Disposition {
        (self.0)(ctx, sink, failure)
    }
}

/// Runner hooks and both chains.
#[derive(Default)]
pub struct HandlerChains {
    runners: HashMap<String, Box<dyn ServiceRunner>>,
    service: Vec<Box<dyn ServiceExceptionHandler>>,
    uncaught: Vec<Box<dyn UncaughtExceptionHandler>>,
}

impl fmt::Debug for HandlerChains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut runners: Vec<_> = self.runners.keys().collect();
        runners.sort();
        f.debug_struct("HandlerChains")
            .field("runners", &runners)
            .field("service", &self.service.len())
            .field("uncaught", &self.uncaught.len())
            .finish()
    }
}

impl HandlerChains {
    /// Create empty chains.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the runner hook for `operation`, replacing any earlier one.
    pub fn set_runner(&mut self, operation: impl Into<String>, runner: Box<dyn ServiceRunner>) {
        self.runners.insert(operation.into(), runner);
    }

    /// Append to the service-exception chain.
    pub fn push_service(&mut self, handler: Box<dyn ServiceExceptionHandler>) {
        self.service.push(handler);
    }

    /// Append to the uncaught-exception chain.
    pub fn push_uncaught(&mut self, handler: Box<dyn UncaughtExceptionHandler>) {
        self.uncaught.push(handler);
    }

    /// Whether a runner hook exists for `operation`.
    pub fn has_runner(&self, operation: &str) -> bool {
        self.runners.contains_key(operation)
    }

    /// Length of the service-exception chain.
    pub fn service_len(&self) -> usize {
        self.service.len()
    }

    /// Length of the uncaught-exception chain.
    pub fn uncaught_len(&self) -> usize {
        self.uncaught.len()
    }

    /// Ask the runner hook for the request's type.
    pub fn run_runner(
        &self,
        ctx: &RequestContext,
        request: &dyn Any,
        failure: &dyn Failure,
    ) -> Option<ErrorReply> {
        let runner = self.runners.get(ctx.operation())?;
        let reply = runner.handle_exception(ctx, request, failure);
        if reply.is_some() {
            debug!("Runner hook for '{}' resolved '{}'", ctx.operation(), failure.kind());
        }
        reply
    }

    /// Ask each service-exception entry in order; the first reply wins.
    pub fn run_service(
        &self,
        ctx: &RequestContext,
        request: &dyn Any,
        failure: &dyn Failure,
    ) -> Option<ErrorReply> {
        self.service.iter().enumerate().find_map(|(index, handler)| {
            let reply = handler.handle(ctx, request, failure)?;
            debug!("Service-exception entry {} resolved '{}'", index, failure.kind());
            Some(reply)
        })
    }

    /// Run the uncaught-exception chain until an entry handles the failure.
    ///
    /// An entry that ends the response or writes body bytes counts as having
    /// handled it, whatever it returned.
    pub fn run_uncaught(
        &self,
        ctx: &RequestContext,
        sink: &mut dyn ResponseSink,
        failure: &dyn Failure,
    ) -> Disposition {
        for (index, handler) in self.uncaught.iter().enumerate() {
            let disposition = handler.handle(ctx, sink, failure);
            if disposition == Disposition::Handled || sink.is_ended() || sink.is_committed() {
                debug!("Uncaught-exception entry {} handled '{}'", index, failure.kind());
                return Disposition::Handled;
            }
        }
        Disposition::Declined
    }
}
