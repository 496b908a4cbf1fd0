use std::sync::Arc;
use std::time::Instant;

use tracing::{Level, debug, span, warn};

use super::{MessageMiddleware, MessageNext, Middleware, Next};
use crate::context::{AnyContext, AnyMessageContext};

/// Request middleware that opens a span per dispatch and logs its outcome.
///
/// Failures are logged at `WARN`, everything else at `DEBUG`.
#[derive(Debug, Clone)]
pub struct TracingMiddleware {
    relay: Arc<str>,
}

impl TracingMiddleware {
    /// Creates a tracing middleware labelled with the relay's name.
    pub fn new(relay: impl Into<Arc<str>>) -> Self {
        Self {
            relay: relay.into(),
        }
    }
}

impl Middleware for TracingMiddleware {
    fn handle(&self, ctx: &mut dyn AnyContext, next: Next<'_>) {
        let request = ctx.request_type().name();
        let span = span!(Level::DEBUG, "relay.request", relay = %self.relay, request);
        let _enter = span.enter();

        let started = Instant::now();
        next.run(ctx);
        let elapsed = started.elapsed();

        match ctx.error() {
            Some(error) => warn!(%error, ?elapsed, "Request failed"),
            None if ctx.response().is_some() => debug!(?elapsed, "Request handled"),
            None => debug!(?elapsed, "Request finished without a response"),
        }
    }
}

/// Message counterpart of [`TracingMiddleware`].
#[derive(Debug, Clone)]
pub struct MessageTracingMiddleware {
    relay: Arc<str>,
}

impl MessageTracingMiddleware {
    /// Creates a tracing middleware labelled with the relay's name.
    pub fn new(relay: impl Into<Arc<str>>) -> Self {
        Self {
            relay: relay.into(),
        }
    }
}

impl MessageMiddleware for MessageTracingMiddleware {
    fn handle(&self, ctx: &mut dyn AnyMessageContext, next: MessageNext<'_>) {
        let message = ctx.message_type().name();
        let span = span!(Level::DEBUG, "relay.message", relay = %self.relay, message);
        let _enter = span.enter();

        let started = Instant::now();
        next.run(ctx);
        let elapsed = started.elapsed();

        match ctx.error() {
            Some(error) => warn!(%error, ?elapsed, "Message failed"),
            None => debug!(?elapsed, "Message handled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Context, MessageContext};
    use crate::error::RelayError;
    use crate::middleware::{MessageMiddlewareChain, MiddlewareChain};
    use crate::request::{Message, Request};

    struct Lookup;

    impl Request for Lookup {
        type Response = &'static str;
    }

    struct Tick;

    impl Message for Tick {}

    #[test]
    fn test_tracing_is_transparent() {
        let layer: Box<dyn Middleware> = Box::new(TracingMiddleware::new("test"));
        let chain = MiddlewareChain::new(vec![layer]);

        let mut ok = Context::new(Lookup);
        chain.run(ok.erased(), &|ctx| ctx.replace_response("found").unwrap());
        assert_eq!(ok.into_result().unwrap(), "found");

        let mut failed = Context::new(Lookup);
        chain.run(failed.erased(), &|ctx| {
            ctx.set_error(RelayError::HandlerNotFound { type_name: "Lookup" })
        });
        assert!(failed.into_result().unwrap_err().is_not_found());
    }

    #[test]
    fn test_message_tracing_is_transparent() {
        let layer: Box<dyn MessageMiddleware> = Box::new(MessageTracingMiddleware::new("test"));
        let chain = MessageMiddlewareChain::new(vec![layer]);
        let mut ctx = MessageContext::new(Tick);
        chain.run(ctx.erased(), &|ctx| assert!(ctx.is::<Tick>()));
        assert!(ctx.into_result().is_ok());
    }
}
