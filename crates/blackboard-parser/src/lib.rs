//! Per-endpoint packet parsing and message dispatch.
//!
//! Raw packets from the transport are routed by [`ParserEngine`] to one
//! [`ParsingTask`] per remote endpoint. Each task owns a bounded
//! [`PacketQueue`] and a worker thread that rebuilds UTF-8 text from the
//! queued bytes, cuts it into messages and dispatches every message that
//! parses as a [`Response`] or a [`Command`] to a [`MessageSink`].
//!
//! Message boundaries are implicit: a NUL character, or any decode failure
//! (including reaching the end of the currently buffered bytes) while text
//! is buffered, completes the message.

pub mod config;
pub mod engine;
pub mod error;
pub mod message;
pub mod queue;
pub mod task;
pub mod utf8;

pub use config::ParserConfig;
pub use engine::ParserEngine;
pub use error::{ParserError, Result};
pub use message::{Command, Message, MessageSink, MessageSource, Response};
pub use queue::{ByteSource, PacketQueue, PacketReader, ReadFault};
pub use task::ParsingTask;
pub use utf8::{read_utf8, DecodeFault};
