//! Applying a [`RelayConfig`] to a [`RelayBuilder`].

use relay_core::{
    AnyMessageContext, MessageTracingMiddleware, RelayBuilder, RelayError, TracingMiddleware,
};
use tracing::warn;

use crate::config::{RelayConfig, UnhandledPolicy};

/// Extension trait configuring a builder from a loaded [`RelayConfig`].
///
/// ```rust,ignore
/// let config = relay_runtime::config::load_config()?;
/// let relay = RelayBuilder::new()
///     .configure(&config)
///     .register(|req: GetBalance| Ok(0))
///     .build();
/// ```
pub trait ConfigureRelay: Sized {
    /// Applies `config`:
    ///
    /// - sets the relay name
    /// - with `dispatch.trace`, installs tracing middleware outermost on
    ///   both chains
    /// - replaces the default message handler according to
    ///   `dispatch.unhandled_messages`
    fn configure(self, config: &RelayConfig) -> Self;
}

impl ConfigureRelay for RelayBuilder {
    fn configure(self, config: &RelayConfig) -> Self {
        let name = config.name.as_str();
        let mut builder = self.name(name);

        if config.dispatch.trace {
            builder = builder
                .with_outermost_middleware(TracingMiddleware::new(name))
                .with_outermost_message_middleware(MessageTracingMiddleware::new(name));
        }

        match config.dispatch.unhandled_messages {
            UnhandledPolicy::Ignore => builder,
            UnhandledPolicy::Warn => builder.default_message_handler(warn_unhandled),
            UnhandledPolicy::Error => builder.default_message_handler(reject_unhandled),
        }
    }
}

fn warn_unhandled(ctx: &mut dyn AnyMessageContext) {
    warn!(
        message = ctx.message_type().name(),
        "Message dropped, no handler registered"
    );
}

fn reject_unhandled(ctx: &mut dyn AnyMessageContext) {
    let type_name = ctx.message_type().name();
    ctx.set_error(RelayError::HandlerNotFound { type_name });
}
