use std::fmt;
use std::io;

use blackboard_parser::ParserError;
use blackboard_transport::TransportError;
use blackboard_vars::VariableError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

/// Failure of a CLI command: process exit code plus the line printed to stderr.
#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn caused_by(code: i32, context: &str, cause: impl fmt::Display) -> Self {
        Self::new(code, format!("{context}: {cause}"))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

fn io_code(kind: io::ErrorKind) -> i32 {
    match kind {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::AddrInUse => FAILURE,
        _ => INTERNAL,
    }
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let code = match &err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_code(source.kind()),
        TransportError::InvalidText { .. } => DATA_INVALID,
        TransportError::ConnectionClosed => FAILURE,
        TransportError::Unresolved(_) => USAGE,
        TransportError::Shutdown | TransportError::UnknownEndpoint(_) => TRANSPORT_ERROR,
    };
    CliError::caused_by(code, context, err)
}

pub fn parser_error(context: &str, err: ParserError) -> CliError {
    let code = match &err {
        ParserError::Spawn { source, .. } => io_code(source.kind()),
        ParserError::InvalidCommand(_) | ParserError::InvalidResponse(_) => USAGE,
    };
    CliError::caused_by(code, context, err)
}

pub fn variable_error(context: &str, err: VariableError) -> CliError {
    let code = match err {
        VariableError::UnknownType(_) | VariableError::InvalidName(_) => USAGE,
        _ => DATA_INVALID,
    };
    CliError::caused_by(code, context, err)
}
