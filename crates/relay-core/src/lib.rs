//! # Relay Core
//!
//! The dispatch engine behind the Relay request/message dispatcher.
//!
//! A [`Relay`] routes a value to the single handler registered for its
//! concrete type. Requests produce exactly one response whose type is fixed by
//! [`Request::Response`]; messages are one-way.
//!
//! ## Building Blocks
//!
//! - **Contracts**: [`Request`], [`Message`], keyed by [`TypeKey`]
//! - **Handlers**: [`Handler`] and [`MessageHandler`], implemented for plain closures
//! - **Contexts**: the typed [`Context`] and its erased view [`AnyContext`]
//! - **Middleware**: [`Middleware`] wrapped around every dispatch, outermost first
//! - **Construction**: [`RelayBuilder`] (and [`SharedBuilder`]) frozen into a [`Relay`]
//!
//! ```text
//!              ┌──────────────── Relay ────────────────┐
//! handle(req) ─┼─▶ m0 ─▶ m1 ─▶ … ─▶ handler / default ─┼─▶ Result<Response, RelayError>
//!              └───────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use relay_core::{RelayBuilder, RelayError, Request};
//!
//! struct Add(i32, i32);
//!
//! impl Request for Add {
//!     type Response = i32;
//! }
//!
//! let relay = RelayBuilder::new()
//!     .register(|Add(a, b): Add| Ok(a + b))
//!     .build();
//!
//! assert_eq!(relay.handle(Add(2, 3))?, 5);
//! ```

pub mod builder;
pub mod context;
pub mod error;
pub mod handler;
pub mod key;
pub mod middleware;
mod registry;
pub mod relay;
pub mod request;
pub mod value;

pub use builder::{RelayBuilder, SharedBuilder};
pub use context::{
    AnyContext, AnyMessageContext, Context, DynamicContext, DynamicMessageContext, MessageContext,
};
pub use error::{BoxError, RelayError, RelayResult};
pub use handler::{DefaultHandler, DefaultMessageHandler, Handler, MessageHandler};
pub use key::TypeKey;
pub use middleware::{
    MessageMiddleware, MessageMiddlewareChain, MessageNext, MessageTracingMiddleware, Middleware,
    MiddlewareChain, Next, TracingMiddleware,
};
pub use relay::Relay;
pub use request::{Message, Request};
pub use value::AnyValue;

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        AnyContext, AnyMessageContext, AnyValue, Context, Handler, Message, MessageHandler,
        MessageNext, Middleware, Next, Relay, RelayBuilder, RelayError, RelayResult, Request,
    };
}
