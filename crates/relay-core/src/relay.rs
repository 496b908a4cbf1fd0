//! The frozen dispatcher.
//!
//! A [`Relay`] is produced once by [`RelayBuilder::build`] and never changes
//! afterwards. Cloning is cheap and every clone shares the same registry, so
//! the relay can be handed to as many threads or tasks as needed without any
//! locking on the dispatch path.
//!
//! # Dispatch
//!
//! For each call the relay:
//!
//! 1. Creates a fresh context holding the request (or message)
//! 2. Looks the handler up by the value's [`TypeKey`]
//! 3. Runs the middleware chain, outermost first, around a terminal step
//! 4. The terminal step calls the registered handler, or the default handler
//!    when none is registered
//! 5. Reads the outcome back out of the context
//!
//! ```rust,ignore
//! let relay = RelayBuilder::new()
//!     .register(|req: GetBalance| Ok(ledger.balance(req.account)))
//!     .build();
//!
//! let balance: i64 = relay.handle(GetBalance { account: 7 })?;
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::builder::RelayBuilder;
use crate::context::{
    AnyContext, AnyMessageContext, Context, DynamicContext, DynamicMessageContext, MessageContext,
};
use crate::error::RelayResult;
use crate::handler::{DefaultHandler, DefaultMessageHandler};
use crate::key::TypeKey;
use crate::middleware::{MessageMiddlewareChain, MiddlewareChain};
use crate::registry::Registry;
use crate::request::{Message, Request};
use crate::value::AnyValue;

pub(crate) struct RelayInner {
    pub(crate) name: Arc<str>,
    pub(crate) registry: Registry,
    pub(crate) middleware: MiddlewareChain,
    pub(crate) message_middleware: MessageMiddlewareChain,
    pub(crate) default_handler: DefaultHandler,
    pub(crate) default_message_handler: DefaultMessageHandler,
}

/// An immutable, thread-safe request/message dispatcher.
///
/// # Thread Safety
///
/// `Relay` is `Send + Sync`. Dispatches never block one another; handlers and
/// middleware are invoked concurrently and must synchronize any state they
/// share.
#[derive(Clone)]
pub struct Relay {
    inner: Arc<RelayInner>,
}

impl Relay {
    pub(crate) fn from_inner(inner: RelayInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Starts a new [`RelayBuilder`].
    pub fn builder() -> RelayBuilder {
        RelayBuilder::new()
    }

    /// The name this relay was built with.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Dispatches `request` and returns its response.
    ///
    /// # Errors
    ///
    /// - The handler's error, unchanged
    /// - [`RelayError::HandlerNotFound`](crate::RelayError::HandlerNotFound)
    ///   from the default handler when nothing is registered for `R`
    /// - Whatever error a middleware recorded
    /// - [`RelayError::NoResponse`](crate::RelayError::NoResponse) when a
    ///   middleware short-circuited without setting a response or an error
    pub fn handle<R: Request>(&self, request: R) -> RelayResult<R::Response> {
        self.dispatch(request).into_result()
    }

    /// Dispatches `request` and returns the finished context.
    ///
    /// Use [`Context::into_parts`] to read the raw `(response, error)` pair.
    pub fn dispatch<R: Request>(&self, request: R) -> Context<R> {
        let mut ctx = Context::new(request);
        self.run_request(TypeKey::of::<R>(), ctx.erased());
        ctx
    }

    /// Dispatches a type-erased request.
    ///
    /// A registered type takes the same path as [`handle`](Self::handle) and
    /// the response comes back erased. An unregistered type still runs the
    /// middleware chain and the default handler, over a [`DynamicContext`].
    pub fn handle_any(&self, request: AnyValue) -> RelayResult<AnyValue> {
        let key = request.key();
        match self.inner.registry.request(&key) {
            Some(entry) => (entry.dynamic)(self, request),
            None => {
                let mut ctx = DynamicContext::new(request);
                self.run_request(key, &mut ctx);
                ctx.into_result()
            }
        }
    }

    fn run_request(&self, key: TypeKey, ctx: &mut dyn AnyContext) {
        let inner = &*self.inner;
        let entry = inner.registry.request(&key);
        trace!(
            relay = %inner.name,
            request = key.name(),
            found = entry.is_some(),
            "Handler lookup"
        );

        inner.middleware.run(ctx, &|ctx| match entry {
            Some(entry) => (entry.call)(ctx),
            None => {
                debug!(
                    relay = %inner.name,
                    request = key.name(),
                    "No handler registered, running default handler"
                );
                (inner.default_handler)(ctx)
            }
        });
    }

    // =========================================================================
    // Messages
    // =========================================================================

    /// Dispatches a one-way `message`.
    ///
    /// With the built-in default message handler an unregistered message is
    /// silently dropped and this returns `Ok(())`.
    ///
    /// # Errors
    ///
    /// Only what a message middleware or a custom default message handler
    /// recorded.
    pub fn handle_message<M: Message>(&self, message: M) -> RelayResult<()> {
        let mut ctx = MessageContext::new(message);
        self.run_message(TypeKey::of::<M>(), ctx.erased());
        ctx.into_result()
    }

    /// Dispatches a type-erased message.
    pub fn handle_any_message(&self, message: AnyValue) -> RelayResult<()> {
        let key = message.key();
        match self.inner.registry.message(&key) {
            Some(entry) => (entry.dynamic)(self, message),
            None => {
                let mut ctx = DynamicMessageContext::new(message);
                self.run_message(key, &mut ctx);
                ctx.into_result()
            }
        }
    }

    fn run_message(&self, key: TypeKey, ctx: &mut dyn AnyMessageContext) {
        let inner = &*self.inner;
        let entry = inner.registry.message(&key);
        trace!(
            relay = %inner.name,
            message = key.name(),
            found = entry.is_some(),
            "Handler lookup"
        );

        inner.message_middleware.run(ctx, &|ctx| match entry {
            Some(entry) => (entry.call)(ctx),
            None => {
                debug!(
                    relay = %inner.name,
                    message = key.name(),
                    "No handler registered, running default message handler"
                );
                (inner.default_message_handler)(ctx)
            }
        });
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Returns `true` if a handler is registered for request type `R`.
    pub fn has_handler<R: Request>(&self) -> bool {
        self.inner.registry.request(&TypeKey::of::<R>()).is_some()
    }

    /// Returns `true` if a handler is registered for message type `M`.
    pub fn has_message_handler<M: Message>(&self) -> bool {
        self.inner.registry.message(&TypeKey::of::<M>()).is_some()
    }

    /// Keys of every request type with a registered handler, in no particular order.
    pub fn request_types(&self) -> Vec<TypeKey> {
        self.inner.registry.request_types().collect()
    }

    /// Keys of every message type with a registered handler, in no particular order.
    pub fn message_types(&self) -> Vec<TypeKey> {
        self.inner.registry.message_types().collect()
    }

    /// The response type paired with a registered request type.
    pub fn response_type(&self, request: &TypeKey) -> Option<TypeKey> {
        self.inner.registry.request(request).map(|entry| entry.response)
    }

    /// Number of request middleware.
    pub fn middleware_count(&self) -> usize {
        self.inner.middleware.len()
    }

    /// Number of message middleware.
    pub fn message_middleware_count(&self) -> usize {
        self.inner.message_middleware.len()
    }
}

impl fmt::Debug for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relay")
            .field("name", &self.inner.name)
            .field("registry", &self.inner.registry)
            .field("middleware", &self.inner.middleware)
            .field("message_middleware", &self.inner.message_middleware)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::RelayError;

    #[derive(Debug)]
    struct Double(u32);

    impl Request for Double {
        type Response = u32;
    }

    struct Unknown;

    impl Request for Unknown {
        type Response = String;
    }

    struct Joined;

    impl Message for Joined {}

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_relay_is_send_sync() {
        assert_send_sync::<Relay>();
    }

    #[test]
    fn test_handle_registered() {
        let relay = RelayBuilder::new()
            .register(|req: Double| Ok(req.0 * 2))
            .build();
        assert_eq!(relay.handle(Double(21)).unwrap(), 42);
        assert!(relay.has_handler::<Double>());
        assert!(!relay.has_handler::<Unknown>());
    }

    #[test]
    fn test_unregistered_request_is_not_found() {
        let relay = RelayBuilder::new().build();
        let err = relay.handle(Unknown).unwrap_err();
        assert!(err.is_not_found());

        let (response, error) = relay.dispatch(Unknown).into_parts();
        assert!(response.is_none());
        assert!(error.is_some_and(|e| e.is_not_found()));
    }

    #[test]
    fn test_unregistered_message_is_silent() {
        let relay = RelayBuilder::new().build();
        assert!(relay.handle_message(Joined).is_ok());
    }

    #[test]
    fn test_message_handler_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let relay = RelayBuilder::new()
            .register_message(move |_: Joined| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        relay.handle_message(Joined).unwrap();
        relay.handle_message(Joined).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_handle_any_routes_by_key() {
        let relay = RelayBuilder::new()
            .register(|req: Double| Ok(req.0 * 2))
            .build();

        let response = relay.handle_any(AnyValue::new(Double(5))).unwrap();
        assert_eq!(response.downcast_ref::<u32>(), Some(&10));

        let err = relay.handle_any(AnyValue::new(Unknown)).unwrap_err();
        assert!(matches!(err, RelayError::HandlerNotFound { .. }));
    }

    #[test]
    fn test_response_type_introspection() {
        let relay = RelayBuilder::new()
            .register(|req: Double| Ok(req.0))
            .build();
        assert_eq!(
            relay.response_type(&TypeKey::of::<Double>()),
            Some(TypeKey::of::<u32>())
        );
        assert_eq!(relay.response_type(&TypeKey::of::<Unknown>()), None);
        assert_eq!(relay.request_types(), vec![TypeKey::of::<Double>()]);
        assert!(relay.message_types().is_empty());
    }

    #[test]
    fn test_clones_share_registry() {
        let relay = RelayBuilder::new()
            .name("shared")
            .register(|req: Double| Ok(req.0 + 1))
            .build();
        let clone = relay.clone();
        assert_eq!(clone.name(), "shared");
        assert_eq!(clone.handle(Double(1)).unwrap(), 2);
    }
}
