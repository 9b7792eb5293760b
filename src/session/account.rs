//! Account settings resolved for one connection.

use purple_proto::{DEFAULT_PORT, DEFAULT_SSL_PORT};
use zeroize::Zeroizing;

use crate::config::{AccountConfig, StatusKind};
use crate::error::ConnectionError;

/// Real name sent when none is configured.
pub const DEFAULT_REALNAME: &str = "purple";

const WHITESPACE: &[char] = &[' ', '\t', '\x0b', '\r', '\n'];

/// A parsed `nick@server` account.
#[derive(Debug, Clone)]
pub struct Account {
    pub nick: String,
    pub server: String,
    pub port: u16,
    pub password: Option<Zeroizing<String>>,
    /// Ident for USER, spaces replaced by `_`.
    pub ident: String,
    pub realname: String,
    pub encoding: String,
    pub autodetect_utf8: bool,
    pub ssl: bool,
    pub sasl: bool,
    pub auth_plain_in_clear: bool,
    pub buddies: Vec<String>,
    pub autojoin: Vec<String>,
    pub status: StatusKind,
    pub away_message: String,
}

impl Account {
    pub fn parse(config: &AccountConfig) -> Result<Self, ConnectionError> {
        if config.name.contains(WHITESPACE) {
            return Err(ConnectionError::InvalidSettings(
                "IRC nick and server may not contain whitespace".to_string(),
            ));
        }

        let (nick, server) = match config.name.split_once('@') {
            Some((nick, server)) if !nick.is_empty() && !server.is_empty() => (nick, server),
            _ => {
                return Err(ConnectionError::InvalidSettings(
                    "IRC account name must be nick@server".to_string(),
                ));
            }
        };

        let port = config
            .port
            .unwrap_or(if config.ssl { DEFAULT_SSL_PORT } else { DEFAULT_PORT });

        let ident = config
            .username
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(nick)
            .replace(' ', "_");

        let realname = config
            .realname
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REALNAME)
            .to_string();

        Ok(Self {
            nick: nick.to_string(),
            server: server.to_string(),
            port,
            password: config
                .password
                .as_ref()
                .filter(|p| !p.is_empty())
                .map(|p| Zeroizing::new(p.clone())),
            ident,
            realname,
            encoding: config.encoding.clone(),
            autodetect_utf8: config.autodetect_utf8,
            ssl: config.ssl,
            sasl: config.sasl,
            auth_plain_in_clear: config.auth_plain_in_clear,
            buddies: config.buddies.clone(),
            autojoin: config.autojoin.clone(),
            status: config.status,
            away_message: config.away_message.clone(),
        })
    }

    /// Server name as sent in USER; a leading `:` would start the trailing
    /// argument, so such names are prefixed with `0`.
    pub fn user_server(&self) -> String {
        if self.server.starts_with(':') {
            format!("0{}", self.server)
        } else {
            self.server.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_defaults() {
        let account = Account::parse(&AccountConfig::new("purple@irc.example.net")).unwrap();
        assert_eq!(account.nick, "purple");
        assert_eq!(account.server, "irc.example.net");
        assert_eq!(account.port, 6667);
        assert_eq!(account.ident, "purple");
        assert_eq!(account.realname, "purple");
        assert!(account.password.is_none());
    }

    #[test]
    fn ssl_port_and_ident() {
        let mut config = AccountConfig::new("nick@irc.example.net");
        config.ssl = true;
        config.username = Some("my ident".into());
        let account = Account::parse(&config).unwrap();
        assert_eq!(account.port, 6697);
        assert_eq!(account.ident, "my_ident");
    }

    #[test]
    fn whitespace_is_invalid() {
        for name in ["ni ck@irc.example.net", "nick@irc.\texample.net", "nick\n@srv"] {
            let err = Account::parse(&AccountConfig::new(name)).unwrap_err();
            assert_eq!(err.to_string(), "IRC nick and server may not contain whitespace");
            assert_eq!(err.kind(), crate::error::ConnectionErrorKind::InvalidSettings);
        }
    }

    #[test]
    fn missing_server_is_invalid() {
        assert!(Account::parse(&AccountConfig::new("nick")).is_err());
        assert!(Account::parse(&AccountConfig::new("nick@")).is_err());
    }

    #[test]
    fn colon_server_gets_zero_prefix() {
        let account = Account::parse(&AccountConfig::new("nick@:1")).unwrap();
        assert_eq!(account.user_server(), "0:1");
    }
}
