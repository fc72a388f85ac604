//! TCP transport for the blackboard protocol.
//!
//! This is the lowest layer of the blackboard stack. It owns the network
//! side of a connection and nothing else:
//! - [`Endpoint`] identifies a remote peer (address + port)
//! - [`RawPacket`] carries the bytes of one socket read from one endpoint
//! - [`TcpServer`] accepts peers and turns their reads into packets
//! - [`TcpConnection`] is the client side, sending NUL-terminated text
//!
//! Everything above (message parsing, dispatch, payload encoding) builds on
//! the packets produced here.

pub mod connection;
pub mod error;
pub mod packet;
pub mod server;

pub use connection::TcpConnection;
pub use error::{Result, TransportError};
pub use packet::{encode_message, Endpoint, RawPacket, MESSAGE_TERMINATOR};
pub use server::{PacketHandler, ServerConfig, TcpServer};
