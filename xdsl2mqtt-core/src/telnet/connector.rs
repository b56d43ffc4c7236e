//! Byte-stream transports for the Telnet session

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Default Telnet port
pub const DEFAULT_TELNET_PORT: u16 = 23;

/// Opens the byte stream a [`super::TelnetSession`] talks over.
///
/// Production code uses [`TcpConnector`]; tests substitute scripted streams.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Stream type produced by this connector
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    /// Opens a fresh stream to the remote command interface
    ///
    /// # Errors
    ///
    /// Returns an IO error if the remote end cannot be reached.
    async fn open(&self) -> std::io::Result<Self::Stream>;

    /// Human-readable remote address for logs
    fn peer(&self) -> String;
}

/// Plain TCP transport to a Telnet server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpConnector {
    host: String,
    port: u16,
}

impl TcpConnector {
    /// Creates a connector for `host:port`
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Remote host name or address
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Remote port
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn open(&self) -> std::io::Result<TcpStream> {
        let stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
        // Commands are tiny; don't let Nagle hold them back
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    fn peer(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
