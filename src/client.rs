//! Gateway TCP client.
//!
//! One connection per cycle: connect, send the live-data command, read
//! one response, drop the socket. The protocol is single-shot and the
//! response is small, so a single bounded read is all the framing the
//! transport layer needs; frame-level validation happens in the codec.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

use crate::codec::live_data::CMD_LIVE_DATA;
use crate::core::error::TransportError;

/// TCP port the Ecowitt gateway listens on. Fixed by the device firmware.
pub const GATEWAY_PORT: u16 = 45000;

/// Gateway client configuration.
#[derive(Debug, Clone)]
pub struct GatewayClientConfig {
    /// Connection timeout
    pub connect_timeout: Duration,

    /// Response read timeout
    pub read_timeout: Duration,

    /// Upper bound on the response buffer
    pub max_frame: usize,
}

impl Default for GatewayClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(3),
            max_frame: 1024,
        }
    }
}

impl GatewayClientConfig {
    /// Set connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set response read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

/// Trait for fetching one raw live-data frame.
///
/// The acquisition loop depends on this trait rather than on
/// [`GatewayClient`] directly, so cycle behavior is testable with a
/// scripted fake in place of a real device.
#[async_trait]
pub trait LiveDataClient: Send + Sync {
    /// Perform one request/response round trip against `address` and
    /// return the raw response bytes.
    async fn fetch_live_data(&self, address: &str) -> Result<Vec<u8>, TransportError>;
}

/// TCP client for the Ecowitt gateway.
///
/// Stateless between calls: each [`fetch_live_data`] opens and drops its
/// own connection, so the socket is released on every exit path and no
/// reconnect bookkeeping is needed.
///
/// [`fetch_live_data`]: LiveDataClient::fetch_live_data
#[derive(Debug, Clone, Default)]
pub struct GatewayClient {
    config: GatewayClientConfig,
}

impl GatewayClient {
    /// Create a new gateway client.
    pub fn new(config: GatewayClientConfig) -> Self {
        Self { config }
    }

    /// Append the fixed gateway port when the address has none.
    fn qualify(address: &str) -> String {
        if address.contains(':') {
            address.to_string()
        } else {
            format!("{}:{}", address, GATEWAY_PORT)
        }
    }
}

#[async_trait]
impl LiveDataClient for GatewayClient {
    async fn fetch_live_data(&self, address: &str) -> Result<Vec<u8>, TransportError> {
        let addr = Self::qualify(address);

        let mut stream = timeout(self.config.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| TransportError::ConnectTimeout {
                addr: addr.clone(),
                timeout: self.config.connect_timeout,
            })?
            .map_err(|source| TransportError::Connect {
                addr: addr.clone(),
                source,
            })?;

        trace!(%addr, "connected, sending live-data command");

        let io_result: Result<Vec<u8>, io::Error> = timeout(self.config.read_timeout, async {
            stream.write_all(&CMD_LIVE_DATA).await?;
            let mut buf = vec![0u8; self.config.max_frame];
            let n = stream.read(&mut buf).await?;
            buf.truncate(n);
            Ok(buf)
        })
        .await
        .map_err(|_| TransportError::ReadTimeout {
            addr: addr.clone(),
            timeout: self.config.read_timeout,
        })?;

        let frame = io_result.map_err(|source| TransportError::Io {
            addr: addr.clone(),
            source,
        })?;

        trace!(%addr, len = frame.len(), "received response frame");
        Ok(frame)
    }
}
