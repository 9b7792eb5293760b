//! Connector that serves a prepared in-memory stream.

use async_trait::async_trait;
use parking_lot::Mutex;
use purple_irc::network::IrcStream;
use purple_irc::{ConnectionError, Connector};
use tokio::io::{DuplexStream, duplex};

use super::FakeServer;

/// Hands out one end of a duplex pipe on the first connect; later
/// connects fail like a refused TCP connection.
pub struct DuplexConnector {
    stream: Mutex<Option<DuplexStream>>,
    target: Mutex<Option<(String, u16, bool)>>,
}

impl DuplexConnector {
    /// A connector and the server sitting on the other end.
    pub fn pair() -> (Self, FakeServer) {
        let (client, server) = duplex(64 * 1024);
        (
            Self {
                stream: Mutex::new(Some(client)),
                target: Mutex::new(None),
            },
            FakeServer::new(server),
        )
    }

    /// A connector whose connect always fails.
    #[allow(dead_code)]
    pub fn refusing() -> Self {
        Self {
            stream: Mutex::new(None),
            target: Mutex::new(None),
        }
    }

    /// Host, port and TLS flag of the last connect.
    #[allow(dead_code)]
    pub fn target(&self) -> Option<(String, u16, bool)> {
        self.target.lock().clone()
    }
}

#[async_trait]
impl Connector for DuplexConnector {
    async fn connect(
        &self,
        host: &str,
        port: u16,
        tls: bool,
    ) -> Result<Box<dyn IrcStream>, ConnectionError> {
        *self.target.lock() = Some((host.to_string(), port, tls));
        match self.stream.lock().take() {
            Some(stream) => Ok(Box::new(stream)),
            None => Err(ConnectionError::unable_to_connect("Connection refused")),
        }
    }
}
