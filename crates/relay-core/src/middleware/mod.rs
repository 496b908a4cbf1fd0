//! Middleware chains.
//!
//! Middleware intercepts every dispatch through the erased context. A
//! middleware may work before and after calling [`Next::run`], rewrite the
//! request, response, or error, or never call `next` at all, which
//! short-circuits everything inside it including the handler.
//!
//! Middleware registered first is outermost:
//!
//! ```text
//! m0 ─▶ m1 ─▶ … ─▶ mk ─▶ terminal (handler or default handler)
//!  ◀──── ◀──── … ◀──── ◀──
//! ```
//!
//! The chain is frozen into a [`MiddlewareChain`] at build time. Running it
//! walks the frozen slice and allocates nothing.
//!
//! ```rust,ignore
//! let relay = RelayBuilder::new()
//!     .register_middleware(|ctx, next| {
//!         if ctx.request_ref::<Transfer>().is_some_and(|t| t.amount == 0) {
//!             ctx.set_error(RelayError::handler("empty transfer"));
//!             return;
//!         }
//!         next.run(ctx);
//!     })
//!     .build();
//! ```

mod trace;

pub use trace::{MessageTracingMiddleware, TracingMiddleware};

use std::fmt;

use crate::context::{AnyContext, AnyMessageContext};

// =============================================================================
// Request middleware
// =============================================================================

/// Interceptor on the request path.
///
/// Implemented for every `Fn(&mut dyn AnyContext, Next<'_>)` closure.
pub trait Middleware: Send + Sync + 'static {
    /// Handles the dispatch, calling `next.run(ctx)` to continue inward.
    fn handle(&self, ctx: &mut dyn AnyContext, next: Next<'_>);
}

impl<F> Middleware for F
where
    F: Fn(&mut dyn AnyContext, Next<'_>) + Send + Sync + 'static,
{
    fn handle(&self, ctx: &mut dyn AnyContext, next: Next<'_>) {
        self(ctx, next)
    }
}

/// Continuation to the rest of the request chain.
///
/// Consumed by [`run`](Self::run), so the inner chain executes at most once
/// per middleware invocation.
pub struct Next<'a> {
    rest: &'a [Box<dyn Middleware>],
    terminal: &'a dyn Fn(&mut dyn AnyContext),
}

impl Next<'_> {
    /// Runs the remaining middleware and then the terminal step.
    pub fn run(self, ctx: &mut dyn AnyContext) {
        match self.rest.split_first() {
            Some((head, rest)) => head.handle(
                ctx,
                Next {
                    rest,
                    terminal: self.terminal,
                },
            ),
            None => (self.terminal)(ctx),
        }
    }

    /// Number of middleware still ahead of the terminal step.
    pub fn remaining(&self) -> usize {
        self.rest.len()
    }
}

/// Frozen, ordered request middleware.
#[derive(Default)]
pub struct MiddlewareChain {
    layers: Box<[Box<dyn Middleware>]>,
}

impl MiddlewareChain {
    pub(crate) fn new(layers: Vec<Box<dyn Middleware>>) -> Self {
        Self {
            layers: layers.into_boxed_slice(),
        }
    }

    /// Runs the chain around `terminal`.
    ///
    /// With no middleware this calls `terminal` directly.
    pub fn run(&self, ctx: &mut dyn AnyContext, terminal: &dyn Fn(&mut dyn AnyContext)) {
        Next {
            rest: &self.layers,
            terminal,
        }
        .run(ctx)
    }

    /// Number of middleware in the chain.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns `true` if no middleware is registered.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("len", &self.layers.len())
            .finish()
    }
}

// =============================================================================
// Message middleware
// =============================================================================

/// Interceptor on the message path.
///
/// Implemented for every `Fn(&mut dyn AnyMessageContext, MessageNext<'_>)` closure.
pub trait MessageMiddleware: Send + Sync + 'static {
    /// Handles the dispatch, calling `next.run(ctx)` to continue inward.
    fn handle(&self, ctx: &mut dyn AnyMessageContext, next: MessageNext<'_>);
}

impl<F> MessageMiddleware for F
where
    F: Fn(&mut dyn AnyMessageContext, MessageNext<'_>) + Send + Sync + 'static,
{
    fn handle(&self, ctx: &mut dyn AnyMessageContext, next: MessageNext<'_>) {
        self(ctx, next)
    }
}

/// Continuation to the rest of the message chain.
pub struct MessageNext<'a> {
    rest: &'a [Box<dyn MessageMiddleware>],
    terminal: &'a dyn Fn(&mut dyn AnyMessageContext),
}

impl MessageNext<'_> {
    /// Runs the remaining middleware and then the terminal step.
    pub fn run(self, ctx: &mut dyn AnyMessageContext) {
        match self.rest.split_first() {
            Some((head, rest)) => head.handle(
                ctx,
                MessageNext {
                    rest,
                    terminal: self.terminal,
                },
            ),
            None => (self.terminal)(ctx),
        }
    }

    /// Number of middleware still ahead of the terminal step.
    pub fn remaining(&self) -> usize {
        self.rest.len()
    }
}

/// Frozen, ordered message middleware.
#[derive(Default)]
pub struct MessageMiddlewareChain {
    layers: Box<[Box<dyn MessageMiddleware>]>,
}

impl MessageMiddlewareChain {
    pub(crate) fn new(layers: Vec<Box<dyn MessageMiddleware>>) -> Self {
        Self {
            layers: layers.into_boxed_slice(),
        }
    }

    /// Runs the chain around `terminal`.
    pub fn run(
        &self,
        ctx: &mut dyn AnyMessageContext,
        terminal: &dyn Fn(&mut dyn AnyMessageContext),
    ) {
        MessageNext {
            rest: &self.layers,
            terminal,
        }
        .run(ctx)
    }

    /// Number of middleware in the chain.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns `true` if no middleware is registered.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl fmt::Debug for MessageMiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageMiddlewareChain")
            .field("len", &self.layers.len())
            .finish()
    }
}
