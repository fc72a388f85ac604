use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::packet::{encode_message, Endpoint, MESSAGE_TERMINATOR};

const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Client side of a blackboard connection.
///
/// Writes NUL-terminated text messages and reads replies up to the next
/// terminator.
pub struct TcpConnection {
    stream: TcpStream,
    endpoint: Endpoint,
    local: Endpoint,
    pending: BytesMut,
}

impl TcpConnection {
    /// Connect to a listening blackboard module (blocking).
    pub fn connect(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<Self> {
        let stream = TcpStream::connect(&addr).map_err(|e| TransportError::Connect {
            addr: addr.to_string(),
            source: e,
        })?;
        Self::from_stream(stream)
    }

    /// Connect, giving up after `timeout`.
    pub fn connect_timeout(addr: &str, timeout: Duration) -> Result<Self> {
        let target = addr
            .to_socket_addrs()
            .map_err(|e| TransportError::Connect {
                addr: addr.to_string(),
                source: e,
            })?
            .next()
            .ok_or_else(|| TransportError::Unresolved(addr.to_string()))?;
        let stream =
            TcpStream::connect_timeout(&target, timeout).map_err(|e| TransportError::Connect {
                addr: addr.to_string(),
                source: e,
            })?;
        Self::from_stream(stream)
    }

    fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        let endpoint = Endpoint::new(stream.peer_addr()?);
        let local = Endpoint::new(stream.local_addr()?);
        debug!(%endpoint, %local, "connected");
        Ok(Self {
            stream,
            endpoint,
            local,
            pending: BytesMut::with_capacity(READ_CHUNK_SIZE),
        })
    }

    /// Send one text message followed by the terminator.
    pub fn send_text(&mut self, text: &str) -> Result<()> {
        self.stream.write_all(&encode_message(text))?;
        self.stream.flush()?;
        Ok(())
    }

    /// Read the next NUL-terminated message (blocking).
    ///
    /// Returns `Err(TransportError::ConnectionClosed)` when the peer closes
    /// before a terminator arrives.
    pub fn read_message(&mut self) -> Result<String> {
        loop {
            if let Some(pos) = self.pending.iter().position(|b| *b == MESSAGE_TERMINATOR) {
                let message = self.pending.split_to(pos);
                self.pending.advance(1);
                return String::from_utf8(message.to_vec()).map_err(|_| {
                    TransportError::InvalidText {
                        peer: self.endpoint.addr(),
                    }
                });
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.stream.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            };

            if read == 0 {
                return Err(TransportError::ConnectionClosed);
            }

            self.pending.extend_from_slice(&chunk[..read]);
        }
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.stream.set_read_timeout(timeout).map_err(Into::into)
    }

    /// The remote peer.
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// This side of the connection, as the remote peer sees it.
    pub fn local_endpoint(&self) -> Endpoint {
        self.local
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.endpoint.addr()
    }

    /// Close both directions of the stream.
    pub fn close(&self) -> Result<()> {
        self.stream.shutdown(Shutdown::Both).map_err(Into::into)
    }
}

impl std::fmt::Debug for TcpConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpConnection")
            .field("endpoint", &self.endpoint)
            .field("local", &self.local)
            .field("pending", &self.pending.len())
            .finish()
    }
}
