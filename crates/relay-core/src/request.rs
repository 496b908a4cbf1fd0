//! Request and message contracts.
//!
//! A [`Request`] statically declares the response type it produces; a
//! [`Message`] is a one-way payload with no response. Both are identified by
//! their concrete Rust type.
//!
//! ```rust,ignore
//! use relay_core::Request;
//!
//! struct GetBalance {
//!     account: u64,
//! }
//!
//! impl Request for GetBalance {
//!     type Response = i64;
//! }
//! ```
//!
//! With the `macros` feature of the `relay` facade the impls can be derived:
//!
//! ```rust,ignore
//! #[derive(Request)]
//! #[request(response = "i64")]
//! struct GetBalance {
//!     account: u64,
//! }
//! ```

/// A value that, when handled, produces exactly one [`Request::Response`].
pub trait Request: Send + 'static {
    /// The response type produced by the single handler for this request.
    type Response: Send + 'static;
}

/// A one-way notification. Handling a message produces no response.
pub trait Message: Send + 'static {}
