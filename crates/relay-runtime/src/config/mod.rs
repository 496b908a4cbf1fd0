//! Configuration for a relay and its logging.
//!
//! Configuration is optional: every field has a default, so an application
//! with no `relay.toml` and no `RELAY_*` variables gets a working relay that
//! logs at `info` to stdout.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    DispatchConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, RelayConfig, SpanEventConfig,
    UnhandledPolicy,
};
pub use validation::validate_config;
