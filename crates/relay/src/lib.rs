//! # Relay
//!
//! A typed, in-process request/response and message dispatcher.
//!
//! ## Overview
//!
//! Every request type declares the single response type it produces, and a
//! relay routes each value to the one handler registered for its concrete
//! type. Messages are one-way and may go unhandled. Middleware wraps every
//! dispatch and can inspect, rewrite or answer it before the handler runs.
//!
//! ```text
//! ┌──────────────┐   build()   ┌──────────────────── Relay ──────────────────┐
//! │ RelayBuilder │────────────▶│ m0 ─▶ m1 ─▶ … ─▶ handler / default handler  │
//! └──────────────┘             └─────────────────────────────────────────────┘
//! ```
//!
//! - **Core**: [`Relay`], [`RelayBuilder`], contexts and middleware (`relay-core`)
//! - **Runtime**: config loading, logging and [`ConfigureRelay`] (`relay-runtime`)
//! - **Macros**: `#[derive(Request)]` and `#[derive(Message)]` (`relay-macros`)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use relay::prelude::*;
//!
//! #[derive(Request)]
//! #[request(response = "u64")]
//! struct Square(u64);
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = relay::runtime::init()?;
//!
//!     let relay = RelayBuilder::new()
//!         .configure(&config)
//!         .register(|Square(n): Square| Ok(n * n))
//!         .build();
//!
//!     assert_eq!(relay.handle(Square(4))?, 16);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `macros`: Enable the `Request` and `Message` derive macros (default)
//! - `toml-config`: Read `relay.toml` config files (default)
//! - `yaml-config`: Read `relay.yaml` config files
//! - `json-log`: Enable the JSON log format

pub use relay_core as core;
pub use relay_runtime as runtime;

pub use relay_core::{
    AnyContext, AnyMessageContext, AnyValue, Context, Handler, Message, MessageContext,
    MessageHandler, MessageMiddleware, MessageNext, MessageTracingMiddleware, Middleware, Next,
    Relay, RelayBuilder, RelayError, RelayResult, Request, SharedBuilder, TracingMiddleware,
    TypeKey,
};
pub use relay_runtime::{ConfigureRelay, RelayConfig};

#[cfg(feature = "macros")]
pub use relay_macros::{Message, Request};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use relay::prelude::*;
/// ```
pub mod prelude {
    // Dispatcher
    pub use relay_core::{Relay, RelayBuilder, RelayError, RelayResult};

    // Contracts and handlers
    pub use relay_core::{Handler, Message, MessageHandler, Request};

    // Middleware
    pub use relay_core::{AnyContext, AnyMessageContext, MessageNext, Middleware, Next};

    // Configuration
    pub use relay_runtime::{ConfigureRelay, RelayConfig};

    // Derives share their names with the traits above
    #[cfg(feature = "macros")]
    pub use relay_macros::{Message, Request};
}
