//! # Relay Runtime
//!
//! Configuration and logging around a [`relay_core::Relay`].
//!
//! - [`config`]: layered loading of [`RelayConfig`] with figment
//! - [`logging`]: `tracing-subscriber` setup driven by that config
//! - [`ConfigureRelay`]: applies the dispatch settings to a builder
//!
//! ```rust,ignore
//! use relay_core::RelayBuilder;
//! use relay_runtime::ConfigureRelay;
//!
//! let config = relay_runtime::init()?;
//! let relay = RelayBuilder::new().configure(&config).build();
//! ```

pub mod config;
mod configure;
pub mod logging;

pub use config::{ConfigError, ConfigLoader, ConfigResult, RelayConfig};
pub use configure::ConfigureRelay;
pub use logging::{LoggingBuilder, SpanEvents, init_from_config};

/// Loads configuration from the default locations and installs logging from it.
///
/// # Errors
///
/// Any [`ConfigError`] from loading or validation. Logging is not installed
/// in that case.
pub fn init() -> ConfigResult<RelayConfig> {
    let config = config::load_config()?;
    init_from_config(&config.logging);
    Ok(config)
}
