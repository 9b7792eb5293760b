//! # purple-irc
//!
//! IRC protocol plugin for purple.
//!
//! A [`Session`] holds one account's connection state and reacts to
//! decoded lines, timer ticks and application commands by queueing
//! outbound lines and [`Event`]s. It performs no I/O itself;
//! [`network::spawn`] runs it over a TCP or TLS socket on a tokio task.
//! The protocol is registered with the plugin manager through
//! [`plugin::register`].
//!
//! ```
//! use purple_irc::config::AccountConfig;
//! use purple_irc::Session;
//!
//! let mut session = Session::login(&AccountConfig::new("purple@irc.example.net")).unwrap();
//! session.start(false);
//! assert_eq!(
//!     session.drain_outbound(),
//!     vec!["USER purple * irc.example.net :purple\r\n", "NICK purple\r\n"],
//! );
//! ```

pub mod buddies;
pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod network;
pub mod plugin;
pub mod session;
pub mod telemetry;

pub use self::error::{ConnectionError, ConnectionErrorKind};
pub use self::events::{BuddyStatus, ChatUserFlags, Event, NotifyLevel};
pub use self::network::{Command, Connector, DriverHandle, TcpConnector};
pub use self::session::{ConnectionState, Session, Status};
