//! Default value functions for configuration.

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

pub fn default_encoding() -> String {
    "UTF-8".to_string()
}

pub fn default_away_message() -> String {
    "Away".to_string()
}

pub fn default_env_var() -> String {
    "PURPLE_PLUGIN_PATH".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}
