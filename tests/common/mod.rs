//! Integration test common infrastructure.
//!
//! A [`FakeServer`] plays the IRC server over an in-memory duplex stream;
//! [`DuplexConnector`] hands the other end to the connection driver.

pub mod connector;
pub mod server;

#[allow(unused_imports)]
pub use connector::DuplexConnector;
#[allow(unused_imports)]
pub use server::FakeServer;

use purple_irc::Session;
use purple_irc::config::AccountConfig;

/// A logged-in session that has not started yet.
#[allow(dead_code)]
pub fn session(config: &AccountConfig) -> Session {
    Session::login(config).expect("valid account")
}

/// A session past registration, joined to `channels`, with the
/// registration burst and events drained.
#[allow(dead_code)]
pub fn connected(name: &str, channels: &[&str]) -> Session {
    let mut s = session(&AccountConfig::new(name));
    s.start(false);
    let nick = s.display_nick().to_string();
    s.handle_line(&format!(":irc.test 001 {nick} :Welcome"));
    s.handle_line(&format!(":irc.test 376 {nick} :End of /MOTD command."));
    for channel in channels {
        s.handle_line(&format!(":{nick}!u@host JOIN {channel}"));
    }
    s.drain_outbound();
    s.drain_events();
    s
}
