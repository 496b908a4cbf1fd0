//! Per-dispatch contexts.
//!
//! Every dispatch owns exactly one context for its whole lifetime:
//!
//! - [`Context<R>`]: the typed `(request, response, error)` cell of a
//!   request dispatch. The dispatcher and handlers use it directly.
//! - [`AnyContext`]: the erased view of the *same* cell, implemented by
//!   `Context<R>` itself. Middleware and default handlers only ever see
//!   `&mut dyn AnyContext`; its setters check the offered value's type tag
//!   and return [`RelayError::InvalidType`](crate::RelayError::InvalidType)
//!   on mismatch, leaving the cell unchanged.
//! - [`MessageContext<M>`] / [`AnyMessageContext`]: the same pair for
//!   one-way messages, carrying a message cell and an error cell.
//! - [`DynamicContext`] / [`DynamicMessageContext`]: contexts used by
//!   dynamic dispatch when no handler is registered for the value's type,
//!   so the concrete type can't be recovered.
//!
//! ```text
//!            ┌──────────── Context<R> ─────────────┐
//!  typed ───▶│ request: Option<R>                  │◀─── &mut dyn AnyContext
//!  view      │ response: Option<R::Response>       │     (middleware, default
//!            │ error: Option<RelayError>           │      handler)
//!            └─────────────────────────────────────┘
//! ```

mod dynamic;
mod message;
mod request;

pub use dynamic::{DynamicContext, DynamicMessageContext};
pub use message::{AnyMessageContext, MessageContext};
pub use request::{AnyContext, Context};
