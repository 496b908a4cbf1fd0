//! Relay construction.
//!
//! All registration happens on a [`RelayBuilder`], which is consumed by
//! [`build`](RelayBuilder::build). The resulting [`Relay`] is immutable, so
//! there is no way to register a handler after dispatch has started.
//!
//! ```rust,ignore
//! fn accounts(builder: RelayBuilder) -> RelayBuilder {
//!     builder
//!         .register(|req: GetBalance| Ok(0))
//!         .register_message(|msg: AccountClosed| audit(msg))
//! }
//!
//! let relay = RelayBuilder::new()
//!     .name("bank")
//!     .wrap(accounts)
//!     .register_middleware(|ctx, next| next.run(ctx))
//!     .build();
//! ```
//!
//! For registration from several threads before the relay is frozen, see
//! [`SharedBuilder`].

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::context::{AnyContext, AnyMessageContext};
use crate::error::{RelayError, RelayResult};
use crate::handler::{DefaultHandler, DefaultMessageHandler, Handler, MessageHandler};
use crate::key::TypeKey;
use crate::middleware::{
    MessageMiddleware, MessageMiddlewareChain, MessageNext, Middleware, MiddlewareChain, Next,
};
use crate::registry::Registry;
use crate::relay::{Relay, RelayInner};
use crate::request::{Message, Request};

const DEFAULT_NAME: &str = "relay";

fn handler_not_found(ctx: &mut dyn AnyContext) {
    let type_name = ctx.request_type().name();
    ctx.set_error(RelayError::HandlerNotFound { type_name });
}

fn drop_message(_ctx: &mut dyn AnyMessageContext) {}

/// Mutable registration phase of a [`Relay`].
pub struct RelayBuilder {
    name: Arc<str>,
    registry: Registry,
    middleware: Vec<Box<dyn Middleware>>,
    message_middleware: Vec<Box<dyn MessageMiddleware>>,
    default_handler: DefaultHandler,
    default_message_handler: DefaultMessageHandler,
}

impl Default for RelayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayBuilder {
    /// Creates an empty builder.
    ///
    /// Until replaced, the default handler reports
    /// [`RelayError::HandlerNotFound`] and the default message handler does
    /// nothing.
    pub fn new() -> Self {
        Self {
            name: Arc::from(DEFAULT_NAME),
            registry: Registry::default(),
            middleware: Vec::new(),
            message_middleware: Vec::new(),
            default_handler: Arc::new(handler_not_found),
            default_message_handler: Arc::new(drop_message),
        }
    }

    /// Sets the relay's name, used in log output.
    pub fn name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Applies a group of registrations.
    pub fn wrap<F>(self, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        f(self)
    }

    // =========================================================================
    // Request handlers
    // =========================================================================

    /// Registers the handler for request type `R`.
    ///
    /// # Panics
    ///
    /// Panics if a handler for `R` is already registered. Use
    /// [`try_register`](Self::try_register) to handle that case instead.
    pub fn register<R, F>(self, handler: F) -> Self
    where
        R: Request,
        F: Fn(R) -> RelayResult<R::Response> + Send + Sync + 'static,
    {
        self.register_handler::<R, F>(handler)
    }

    /// Registers a [`Handler`] implementation for request type `R`.
    ///
    /// # Panics
    ///
    /// Panics if a handler for `R` is already registered.
    pub fn register_handler<R, H>(mut self, handler: H) -> Self
    where
        R: Request,
        H: Handler<R>,
    {
        if let Err(err) = self.try_register_handler::<R, H>(handler) {
            panic!("{err}");
        }
        self
    }

    /// Registers the handler for request type `R`, rejecting duplicates.
    ///
    /// # Errors
    ///
    /// [`RelayError::HandlerAlreadyExists`] if `R` already has a handler. The
    /// first handler stays registered.
    pub fn try_register<R, F>(&mut self, handler: F) -> RelayResult<()>
    where
        R: Request,
        F: Fn(R) -> RelayResult<R::Response> + Send + Sync + 'static,
    {
        self.try_register_handler::<R, F>(handler)
    }

    /// Registers a [`Handler`] implementation, rejecting duplicates.
    pub fn try_register_handler<R, H>(&mut self, handler: H) -> RelayResult<()>
    where
        R: Request,
        H: Handler<R>,
    {
        self.registry.insert_request::<R, H>(handler)
    }

    /// Replaces the handler run for requests with no registered handler.
    ///
    /// The handler sees the erased context and may set a response, an error,
    /// or neither.
    pub fn default_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut dyn AnyContext) + Send + Sync + 'static,
    {
        self.default_handler = Arc::new(handler);
        self
    }

    // =========================================================================
    // Message handlers
    // =========================================================================

    /// Registers the handler for message type `M`.
    ///
    /// # Panics
    ///
    /// Panics if a handler for `M` is already registered.
    pub fn register_message<M, F>(self, handler: F) -> Self
    where
        M: Message,
        F: Fn(M) + Send + Sync + 'static,
    {
        self.register_message_handler::<M, F>(handler)
    }

    /// Registers a [`MessageHandler`] implementation for message type `M`.
    ///
    /// # Panics
    ///
    /// Panics if a handler for `M` is already registered.
    pub fn register_message_handler<M, H>(mut self, handler: H) -> Self
    where
        M: Message,
        H: MessageHandler<M>,
    {
        if let Err(err) = self.try_register_message_handler::<M, H>(handler) {
            panic!("{err}");
        }
        self
    }

    /// Registers the handler for message type `M`, rejecting duplicates.
    pub fn try_register_message<M, F>(&mut self, handler: F) -> RelayResult<()>
    where
        M: Message,
        F: Fn(M) + Send + Sync + 'static,
    {
        self.try_register_message_handler::<M, F>(handler)
    }

    /// Registers a [`MessageHandler`] implementation, rejecting duplicates.
    pub fn try_register_message_handler<M, H>(&mut self, handler: H) -> RelayResult<()>
    where
        M: Message,
        H: MessageHandler<M>,
    {
        self.registry.insert_message::<M, H>(handler)
    }

    /// Replaces the handler run for messages with no registered handler.
    pub fn default_message_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut dyn AnyMessageContext) + Send + Sync + 'static,
    {
        self.default_message_handler = Arc::new(handler);
        self
    }

    // =========================================================================
    // Middleware
    // =========================================================================

    /// Appends a closure to the request middleware chain.
    ///
    /// Middleware registered earlier runs further out.
    pub fn register_middleware<F>(self, middleware: F) -> Self
    where
        F: Fn(&mut dyn AnyContext, Next<'_>) + Send + Sync + 'static,
    {
        self.with_middleware(middleware)
    }

    /// Appends a [`Middleware`] implementation to the request chain.
    pub fn with_middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.add_middleware(middleware);
        self
    }

    /// Appends a [`Middleware`] implementation to the request chain in place.
    pub fn add_middleware<M: Middleware>(&mut self, middleware: M) {
        self.middleware.push(Box::new(middleware));
    }

    /// Inserts a [`Middleware`] ahead of everything registered so far.
    pub fn with_outermost_middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middleware.insert(0, Box::new(middleware));
        self
    }

    /// Appends a closure to the message middleware chain.
    pub fn register_message_middleware<F>(self, middleware: F) -> Self
    where
        F: Fn(&mut dyn AnyMessageContext, MessageNext<'_>) + Send + Sync + 'static,
    {
        self.with_message_middleware(middleware)
    }

    /// Appends a [`MessageMiddleware`] implementation to the message chain.
    pub fn with_message_middleware<M: MessageMiddleware>(mut self, middleware: M) -> Self {
        self.add_message_middleware(middleware);
        self
    }

    /// Appends a [`MessageMiddleware`] implementation in place.
    pub fn add_message_middleware<M: MessageMiddleware>(&mut self, middleware: M) {
        self.message_middleware.push(Box::new(middleware));
    }

    /// Inserts a [`MessageMiddleware`] ahead of everything registered so far.
    pub fn with_outermost_message_middleware<M: MessageMiddleware>(
        mut self,
        middleware: M,
    ) -> Self {
        self.message_middleware.insert(0, Box::new(middleware));
        self
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Returns `true` if request type `R` has a handler.
    pub fn contains<R: Request>(&self) -> bool {
        self.registry.request(&TypeKey::of::<R>()).is_some()
    }

    /// Returns `true` if message type `M` has a handler.
    pub fn contains_message<M: Message>(&self) -> bool {
        self.registry.message(&TypeKey::of::<M>()).is_some()
    }

    /// Number of registered request handlers.
    pub fn handler_count(&self) -> usize {
        self.registry.request_count()
    }

    /// Number of registered message handlers.
    pub fn message_handler_count(&self) -> usize {
        self.registry.message_count()
    }

    /// Number of request middleware.
    pub fn middleware_count(&self) -> usize {
        self.middleware.len()
    }

    /// Number of message middleware.
    pub fn message_middleware_count(&self) -> usize {
        self.message_middleware.len()
    }

    /// Freezes the registrations into a [`Relay`].
    pub fn build(self) -> Relay {
        debug!(
            relay = %self.name,
            handlers = self.registry.request_count(),
            message_handlers = self.registry.message_count(),
            middleware = self.middleware.len(),
            message_middleware = self.message_middleware.len(),
            "Relay built"
        );

        Relay::from_inner(RelayInner {
            name: self.name,
            registry: self.registry,
            middleware: MiddlewareChain::new(self.middleware),
            message_middleware: MessageMiddlewareChain::new(self.message_middleware),
            default_handler: self.default_handler,
            default_message_handler: self.default_message_handler,
        })
    }
}

impl fmt::Debug for RelayBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayBuilder")
            .field("name", &self.name)
            .field("registry", &self.registry)
            .field("middleware", &self.middleware.len())
            .field("message_middleware", &self.message_middleware.len())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// SharedBuilder
// =============================================================================

/// A [`RelayBuilder`] behind a mutex, for registration from several threads.
///
/// Every operation takes `&self`. Once [`build`](Self::build) has frozen the
/// relay, all further calls return [`RelayError::AlreadyBuilt`].
pub struct SharedBuilder {
    inner: Mutex<Option<RelayBuilder>>,
}

impl Default for SharedBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedBuilder {
    /// Creates a shared builder around an empty [`RelayBuilder`].
    pub fn new() -> Self {
        Self::from_builder(RelayBuilder::new())
    }

    /// Creates a shared builder around `builder`.
    pub fn from_builder(builder: RelayBuilder) -> Self {
        Self {
            inner: Mutex::new(Some(builder)),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut RelayBuilder) -> RelayResult<T>) -> RelayResult<T> {
        let mut guard = self.inner.lock();
        let builder = guard.as_mut().ok_or(RelayError::AlreadyBuilt)?;
        f(builder)
    }

    /// Registers the handler for request type `R`.
    ///
    /// # Errors
    ///
    /// [`RelayError::HandlerAlreadyExists`] on a duplicate, or
    /// [`RelayError::AlreadyBuilt`] after [`build`](Self::build).
    pub fn register<R, F>(&self, handler: F) -> RelayResult<()>
    where
        R: Request,
        F: Fn(R) -> RelayResult<R::Response> + Send + Sync + 'static,
    {
        self.with(|builder| builder.try_register::<R, F>(handler))
    }

    /// Registers the handler for message type `M`.
    pub fn register_message<M, F>(&self, handler: F) -> RelayResult<()>
    where
        M: Message,
        F: Fn(M) + Send + Sync + 'static,
    {
        self.with(|builder| builder.try_register_message::<M, F>(handler))
    }

    /// Appends a closure to the request middleware chain.
    pub fn register_middleware<F>(&self, middleware: F) -> RelayResult<()>
    where
        F: Fn(&mut dyn AnyContext, Next<'_>) + Send + Sync + 'static,
    {
        self.with(|builder| {
            builder.add_middleware(middleware);
            Ok(())
        })
    }

    /// Appends a closure to the message middleware chain.
    pub fn register_message_middleware<F>(&self, middleware: F) -> RelayResult<()>
    where
        F: Fn(&mut dyn AnyMessageContext, MessageNext<'_>) + Send + Sync + 'static,
    {
        self.with(|builder| {
            builder.add_message_middleware(middleware);
            Ok(())
        })
    }

    /// Runs `f` against the builder while holding the lock.
    ///
    /// The builder stays in place for the whole call, so a panic inside `f`
    /// keeps every registration made before it.
    pub fn configure<T, F>(&self, f: F) -> RelayResult<T>
    where
        F: FnOnce(&mut RelayBuilder) -> T,
    {
        self.with(|builder| Ok(f(builder)))
    }

    /// Freezes the registrations into a [`Relay`]. Succeeds exactly once.
    pub fn build(&self) -> RelayResult<Relay> {
        self.inner
            .lock()
            .take()
            .map(RelayBuilder::build)
            .ok_or(RelayError::AlreadyBuilt)
    }

    /// Returns `true` once [`build`](Self::build) has succeeded.
    pub fn is_built(&self) -> bool {
        self.inner.lock().is_none()
    }
}

impl fmt::Debug for SharedBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBuilder")
            .field("built", &self.is_built())
            .finish_non_exhaustive()
    }
}
