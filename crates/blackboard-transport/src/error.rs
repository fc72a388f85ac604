use std::net::SocketAddr;

use crate::packet::Endpoint;

/// Errors that can occur in blackboard transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on a connected stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No live connection exists for the endpoint.
    #[error("no connection for endpoint {0}")]
    UnknownEndpoint(Endpoint),

    /// The address could not be resolved to any socket address.
    #[error("address {0} did not resolve")]
    Unresolved(String),

    /// The remote peer closed the connection.
    #[error("connection closed")]
    ConnectionClosed,

    /// A received message was not valid UTF-8.
    #[error("message from {peer} is not valid UTF-8")]
    InvalidText { peer: SocketAddr },

    /// The server has been shut down.
    #[error("transport shut down")]
    Shutdown,
}

pub type Result<T> = std::result::Result<T, TransportError>;
