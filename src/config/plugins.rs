//! Plugin manager and logging configuration.

use serde::Deserialize;

use super::defaults::{default_env_var, default_log_level, default_true};

/// Where the plugin manager looks for plugins.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginsConfig {
    /// Extra search paths, scanned before the defaults.
    #[serde(default)]
    pub paths: Vec<String>,
    /// Environment variable holding more search paths.
    #[serde(default = "default_env_var")]
    pub env_var: String,
    /// Also search the system and user plugin directories.
    #[serde(default = "default_true")]
    pub add_default_paths: bool,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            env_var: default_env_var(),
            add_default_paths: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `purple_irc=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
