//! Handler traits.
//!
//! Plain closures are handlers thanks to the blanket impls below; implement
//! the traits directly when a handler carries state worth naming.
//!
//! ```rust,ignore
//! struct Ledger {
//!     balances: HashMap<u64, i64>,
//! }
//!
//! impl Handler<GetBalance> for Ledger {
//!     fn handle(&self, request: GetBalance) -> RelayResult<i64> {
//!         self.balances
//!             .get(&request.account)
//!             .copied()
//!             .ok_or_else(|| RelayError::handler(UnknownAccount(request.account)))
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::context::{AnyContext, AnyMessageContext};
use crate::error::RelayResult;
use crate::request::{Message, Request};

/// Produces the response for one request type.
///
/// Handlers are shared across threads and invoked concurrently, so any
/// internal state needs its own synchronization.
pub trait Handler<R: Request>: Send + Sync + 'static {
    /// Handles `request`, consuming it.
    fn handle(&self, request: R) -> RelayResult<R::Response>;
}

impl<R, F> Handler<R> for F
where
    R: Request,
    F: Fn(R) -> RelayResult<R::Response> + Send + Sync + 'static,
{
    fn handle(&self, request: R) -> RelayResult<R::Response> {
        self(request)
    }
}

/// Consumes one message type.
pub trait MessageHandler<M: Message>: Send + Sync + 'static {
    /// Handles `message`, consuming it.
    fn handle(&self, message: M);
}

impl<M, F> MessageHandler<M> for F
where
    M: Message,
    F: Fn(M) + Send + Sync + 'static,
{
    fn handle(&self, message: M) {
        self(message)
    }
}

/// Fallback invoked for requests with no registered handler.
pub type DefaultHandler = Arc<dyn Fn(&mut dyn AnyContext) + Send + Sync>;

/// Fallback invoked for messages with no registered handler.
pub type DefaultMessageHandler = Arc<dyn Fn(&mut dyn AnyMessageContext) + Send + Sync>;
