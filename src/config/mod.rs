//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Top-level config struct, loading and errors
//! - [`account`]: The IRC account (`[account]`)
//! - [`plugins`]: Plugin search paths and logging (`[plugins]`, `[logging]`)
//! - [`validation`]: Startup checks reporting every problem at once

mod account;
mod defaults;
mod plugins;
mod types;
mod validation;

pub use account::{AccountConfig, StatusKind};
pub use plugins::{LoggingConfig, PluginsConfig};
pub use types::{Config, ConfigError};
pub use validation::{ValidationError, validate};
