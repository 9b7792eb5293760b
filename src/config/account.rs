//! Account configuration.

use serde::Deserialize;

use super::defaults::{default_away_message, default_encoding, default_true};

/// Status to sign on with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    #[default]
    Available,
    Away,
}

/// The `[account]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    /// `nick@server`.
    pub name: String,
    /// Server or SASL password.
    #[serde(default)]
    pub password: Option<String>,
    /// Port; 6667, or 6697 with `ssl`, when unset.
    #[serde(default)]
    pub port: Option<u16>,
    /// Charset for lines that are not valid UTF-8, and for outbound lines.
    #[serde(default = "default_encoding")]
    pub encoding: String,
    /// Accept inbound UTF-8 regardless of `encoding`.
    #[serde(default = "default_true")]
    pub autodetect_utf8: bool,
    /// Ident sent in USER; defaults to the nick.
    #[serde(default)]
    pub username: Option<String>,
    /// Real name sent in USER.
    #[serde(default)]
    pub realname: Option<String>,
    #[serde(default)]
    pub ssl: bool,
    /// Authenticate with SASL instead of PASS.
    #[serde(default)]
    pub sasl: bool,
    /// Allow SASL PLAIN over an unencrypted connection.
    #[serde(default)]
    pub auth_plain_in_clear: bool,
    /// Nicks to poll with ISON.
    #[serde(default)]
    pub buddies: Vec<String>,
    /// Channels to join once connected. `"#chan key"` joins with a key.
    #[serde(default)]
    pub autojoin: Vec<String>,
    #[serde(default)]
    pub status: StatusKind,
    #[serde(default = "default_away_message")]
    pub away_message: String,
}

impl AccountConfig {
    /// A configuration with every option at its default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: None,
            port: None,
            encoding: default_encoding(),
            autodetect_utf8: true,
            username: None,
            realname: None,
            ssl: false,
            sasl: false,
            auth_plain_in_clear: false,
            buddies: Vec::new(),
            autojoin: Vec::new(),
            status: StatusKind::Available,
            away_message: default_away_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_from_toml() {
        let account: AccountConfig = toml::from_str("name = \"me@irc.example.net\"").unwrap();
        assert_eq!(account.encoding, "UTF-8");
        assert!(account.autodetect_utf8);
        assert!(!account.ssl);
        assert_eq!(account.status, StatusKind::Available);
        assert_eq!(account.away_message, "Away");
    }

    #[test]
    fn status_is_lowercase() {
        let account: AccountConfig =
            toml::from_str("name = \"me@irc.example.net\"\nstatus = \"away\"").unwrap();
        assert_eq!(account.status, StatusKind::Away);
    }
}
