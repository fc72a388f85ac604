use std::time::Duration;

/// Default number of packets buffered per endpoint.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Default upper bound, in characters, of one assembled message: 1 Mi.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// Configuration shared by every parsing task of an engine.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Packets buffered per endpoint before producers block. Zero is
    /// treated as one.
    pub queue_capacity: usize,
    /// How long a stop waits for each worker to finish. Default: 1 s.
    pub stop_timeout: Duration,
    /// Messages longer than this are discarded. Default: 1 Mi characters.
    pub max_message_len: usize,
    /// Whether reaching the end of the buffered bytes completes a message.
    /// When false only a NUL or an invalid byte sequence does. Default: true.
    pub boundary_on_drain: bool,
}

impl ParserConfig {
    pub(crate) fn effective_capacity(&self) -> usize {
        self.queue_capacity.max(1)
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            stop_timeout: Duration::from_secs(1),
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
            boundary_on_drain: true,
        }
    }
}
