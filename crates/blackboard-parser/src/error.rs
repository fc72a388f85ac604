use blackboard_transport::Endpoint;

/// Errors surfaced by the parser layer.
///
/// Transport and protocol faults inside a parsing worker are never reported
/// here; they only end or discard the message being assembled.
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    /// The worker thread for an endpoint could not be started.
    #[error("failed to spawn parsing worker for {endpoint}: {source}")]
    Spawn {
        endpoint: Endpoint,
        source: std::io::Error,
    },

    /// Text is not a valid command.
    #[error("invalid command: {0:?}")]
    InvalidCommand(String),

    /// Text is not a valid response.
    #[error("invalid response: {0:?}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, ParserError>;
