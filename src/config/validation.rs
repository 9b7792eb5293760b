//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use purple_proto::LineCodec;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("account.name is required")]
    MissingAccountName,
    #[error("account.name must be nick@server, got '{0}'")]
    MissingServer(String),
    #[error("account.name may not contain whitespace")]
    WhitespaceInAccountName,
    #[error("account.port must not be 0")]
    InvalidPort,
    #[error("account.encoding is not a known charset: {0}")]
    UnknownEncoding(String),
    #[error("account.sasl requires account.password")]
    SaslWithoutPassword,
    #[error("plugins.env_var must not be empty")]
    EmptyEnvVar,
    #[error("logging.level is not a valid filter: {0}")]
    InvalidLogLevel(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let account = &config.account;

    if account.name.is_empty() {
        errors.push(ValidationError::MissingAccountName);
    } else {
        if account.name.chars().any(char::is_whitespace) {
            errors.push(ValidationError::WhitespaceInAccountName);
        }
        match account.name.split_once('@') {
            Some((nick, server)) if !nick.is_empty() && !server.is_empty() => {}
            _ => errors.push(ValidationError::MissingServer(account.name.clone())),
        }
    }

    if account.port == Some(0) {
        errors.push(ValidationError::InvalidPort);
    }

    if LineCodec::new(&account.encoding).is_err() {
        errors.push(ValidationError::UnknownEncoding(account.encoding.clone()));
    }

    if account.sasl && account.password.as_deref().is_none_or(str::is_empty) {
        errors.push(ValidationError::SaslWithoutPassword);
    }

    if config.plugins.env_var.is_empty() {
        errors.push(ValidationError::EmptyEnvVar);
    }

    if tracing_subscriber::EnvFilter::try_new(&config.logging.level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(config.logging.level.clone()));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_valid_config() -> String {
        r#"
[account]
name = "purple@irc.example.net"
"#
        .to_string()
    }

    #[test]
    fn test_valid_config_passes() {
        let config: Config = toml::from_str(&minimal_valid_config()).unwrap();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_server_fails() {
        let toml = r#"
[account]
name = "purple"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MissingServer(_))));
    }

    #[test]
    fn test_whitespace_fails() {
        let toml = r#"
[account]
name = "pur ple@irc.example.net"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::WhitespaceInAccountName)));
    }

    #[test]
    fn test_reports_every_problem() {
        let toml = r#"
[account]
name = ""
port = 0
encoding = "klingon"
sasl = true

[plugins]
env_var = ""
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::UnknownEncoding(_))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::SaslWithoutPassword)));
    }

    #[test]
    fn test_latin1_is_known() {
        let toml = r#"
[account]
name = "purple@irc.example.net"
encoding = "ISO-8859-1"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(validate(&config).is_ok());
    }
}
