//! Error types for the Relay dispatcher.
//!
//! Every dispatch-time failure is an ordinary [`RelayError`] value returned to
//! the caller. Build-time failures (duplicate registration) use the same type
//! so that the checked `try_*` registration methods can report them.

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Boxed error type accepted from handlers.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Errors produced by the relay.
#[derive(Debug, Clone, Error)]
pub enum RelayError {
    /// No handler is registered for the dispatched type.
    #[error("handler wasn't found for '{type_name}'")]
    HandlerNotFound {
        /// Name of the request or message type.
        type_name: &'static str,
    },

    /// A handler for this type was already registered.
    #[error("handler already exists for '{type_name}'")]
    HandlerAlreadyExists {
        /// Name of the request or message type.
        type_name: &'static str,
    },

    /// An erased accessor received a value of the wrong type.
    #[error("invalid type: expected '{expected}', got '{found}'")]
    InvalidType {
        /// The type the context slot holds.
        expected: &'static str,
        /// The type that was offered.
        found: &'static str,
    },

    /// The chain finished without producing a response or an error.
    ///
    /// Happens when a middleware short-circuits and sets neither.
    #[error("no response was produced for '{type_name}'")]
    NoResponse {
        /// Name of the request type.
        type_name: &'static str,
    },

    /// The request or message was taken out of its context before the
    /// handler ran.
    ///
    /// Happens when a middleware moves the value out through the typed
    /// context and never puts one back.
    #[error("'{type_name}' was consumed before reaching its handler")]
    Consumed {
        /// Name of the request or message type.
        type_name: &'static str,
    },

    /// A shared builder was used after it had been frozen.
    #[error("relay was already built")]
    AlreadyBuilt,

    /// An error returned by a handler. Passed through unchanged.
    #[error(transparent)]
    Handler(Arc<dyn StdError + Send + Sync>),
}

impl RelayError {
    /// Wraps an arbitrary handler error.
    ///
    /// A boxed `RelayError` is unwrapped rather than nested, so handlers can
    /// forward relay errors from nested dispatches with `?` unchanged.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        let err: BoxError = err.into();
        match err.downcast::<RelayError>() {
            Ok(relay) => *relay,
            Err(other) => Self::Handler(Arc::from(other)),
        }
    }

    /// Returns the handler error as `E`, if this is a handler error of that type.
    pub fn downcast_handler_ref<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Self::Handler(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Returns `true` for [`RelayError::HandlerNotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::HandlerNotFound { .. })
    }

    /// Returns `true` for [`RelayError::InvalidType`].
    pub fn is_invalid_type(&self) -> bool {
        matches!(self, Self::InvalidType { .. })
    }
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;
