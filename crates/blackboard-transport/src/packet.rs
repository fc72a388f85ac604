use std::fmt;
use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::str::FromStr;

use bytes::Bytes;

/// Byte that terminates every message written by this transport.
pub const MESSAGE_TERMINATOR: u8 = 0x00;

/// Identity of a remote peer: its address and port.
///
/// This is the key for all per-connection state above the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint(SocketAddr);

impl Endpoint {
    pub fn new(addr: SocketAddr) -> Self {
        Self(addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.0
    }

    pub fn ip(&self) -> IpAddr {
        self.0.ip()
    }

    pub fn port(&self) -> u16 {
        self.0.port()
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self(addr)
    }
}

impl FromStr for Endpoint {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The bytes of a single read from one endpoint.
///
/// Packets carry no framing: a message may span several packets and one
/// packet may hold several messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    /// The peer the bytes came from.
    pub endpoint: Endpoint,
    /// The bytes as read from the socket.
    pub payload: Bytes,
}

impl RawPacket {
    /// Create a new packet.
    pub fn new(endpoint: Endpoint, payload: impl Into<Bytes>) -> Self {
        Self {
            endpoint,
            payload: payload.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Encode one text message in the wire format: UTF-8 bytes plus a NUL.
pub fn encode_message(text: &str) -> Vec<u8> {
    let mut wire = Vec::with_capacity(text.len() + 1);
    wire.extend_from_slice(text.as_bytes());
    wire.push(MESSAGE_TERMINATOR);
    wire
}
