//! Socket setup: plain TCP, or TLS with the platform's root certificates.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tracing::{debug, info, warn};

use crate::error::ConnectionError;

/// A connected byte stream to the IRC server.
pub trait IrcStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> IrcStream for T {}

/// Opens the transport for a session.
///
/// The default is [`TcpConnector`]; tests and proxies supply their own.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        host: &str,
        port: u16,
        tls: bool,
    ) -> Result<Box<dyn IrcStream>, ConnectionError>;
}

/// Direct TCP connection, upgraded to TLS when asked.
#[derive(Clone, Default)]
pub struct TcpConnector {
    tls: Option<TlsConnector>,
}

impl TcpConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured TLS client instead of the native root store.
    pub fn with_tls_config(config: Arc<ClientConfig>) -> Self {
        Self {
            tls: Some(TlsConnector::from(config)),
        }
    }

    fn tls_connector(&self) -> TlsConnector {
        match &self.tls {
            Some(connector) => connector.clone(),
            None => TlsConnector::from(Arc::new(native_client_config())),
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(
        &self,
        host: &str,
        port: u16,
        tls: bool,
    ) -> Result<Box<dyn IrcStream>, ConnectionError> {
        debug!(host = %host, port, tls, "connecting");
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(ConnectionError::unable_to_connect)?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!(error = %e, "failed to set TCP_NODELAY");
        }

        if !tls {
            info!(host = %host, port, "connected");
            return Ok(Box::new(stream));
        }

        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| ConnectionError::Encryption(format!("Invalid server name: {e}")))?;
        let stream = self
            .tls_connector()
            .connect(server_name, stream)
            .await
            .map_err(|e| ConnectionError::Encryption(format!("SSL Connection Failed: {e}")))?;

        info!(host = %host, port, "connected with TLS");
        Ok(Box::new(stream))
    }
}

/// Client config trusting the platform's root certificates.
fn native_client_config() -> ClientConfig {
    let mut roots = RootCertStore::empty();
    let certs = rustls_native_certs::load_native_certs();
    for cert in certs.certs {
        if let Err(e) = roots.add(cert) {
            warn!("Failed to add root cert: {}", e);
        }
    }
    for e in &certs.errors {
        warn!("Error loading native certs: {}", e);
    }

    ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn plain_tcp_roundtrip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"hello\r\n").await.unwrap();
        });

        let mut stream = TcpConnector::new()
            .connect("127.0.0.1", port, false)
            .await
            .unwrap();
        let mut buf = [0u8; 7];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello\r\n");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn refused_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = TcpConnector::new()
            .connect("127.0.0.1", port, false)
            .await
            .err()
            .unwrap();
        assert!(err.to_string().starts_with("Unable to connect: "));
    }
}
