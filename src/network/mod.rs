//! Transport and connection task.
//!
//! [`Connector`] opens the socket; [`driver`] runs a [`crate::Session`] over
//! it.

mod connector;
pub mod driver;

pub use connector::{Connector, IrcStream, TcpConnector};
pub use driver::{Command, DriverHandle, connect, run, spawn};
