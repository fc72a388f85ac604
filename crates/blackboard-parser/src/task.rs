use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use blackboard_transport::{Endpoint, RawPacket};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

use crate::config::ParserConfig;
use crate::error::{ParserError, Result};
use crate::message::{Message, MessageSink, MessageSource};
use crate::queue::{PacketQueue, PacketReader};
use crate::utf8::read_utf8;

const TERMINATOR: char = '\0';

/// Parsing state for one remote endpoint.
///
/// Owns the endpoint's bounded queue and the worker thread that decodes it.
/// The worker lives until [`stop`](Self::stop) (or the pair
/// [`signal_stop`](Self::signal_stop) + [`join`](Self::join)) is called;
/// a message still being assembled at that point is discarded.
pub struct ParsingTask {
    endpoint: Endpoint,
    queue: Arc<PacketQueue>,
    running: Arc<AtomicBool>,
    completion: Arc<Completion>,
    worker: Mutex<Option<JoinHandle<()>>>,
    stop_timeout: Duration,
}

impl ParsingTask {
    /// Create the queue and start the worker thread.
    pub fn spawn(
        endpoint: Endpoint,
        sink: Arc<dyn MessageSink>,
        config: &ParserConfig,
    ) -> Result<Self> {
        let queue = Arc::new(PacketQueue::new(endpoint, config.effective_capacity()));
        let running = Arc::new(AtomicBool::new(true));
        let completion = Arc::new(Completion::default());

        let mut worker = Worker {
            endpoint,
            reader: PacketReader::with_drain_reporting(
                Arc::clone(&queue),
                config.boundary_on_drain,
            ),
            buffer: String::new(),
            chars: 0,
            overflowed: false,
            max_message_len: config.max_message_len,
            running: Arc::clone(&running),
            sink,
        };
        let finished = FinishOnDrop(Arc::clone(&completion));

        let handle = std::thread::Builder::new()
            .name(format!("bb-parse-{endpoint}"))
            .spawn(move || {
                let _finished = finished;
                worker.run();
            })
            .map_err(|source| ParserError::Spawn { endpoint, source })?;

        debug!(%endpoint, capacity = queue.capacity(), "parsing task started");

        Ok(Self {
            endpoint,
            queue,
            running,
            completion,
            worker: Mutex::new(Some(handle)),
            stop_timeout: config.stop_timeout,
        })
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Whether the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.completion.is_finished()
    }

    /// Queue a packet for this endpoint, blocking while the queue is full.
    pub fn enqueue(&self, packet: RawPacket) -> bool {
        self.queue.enqueue(packet)
    }

    /// Packets waiting to be decoded.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Clear the running flag and interrupt a blocked read.
    pub fn signal_stop(&self) {
        self.running.store(false, Ordering::Release);
        self.queue.close();
    }

    /// Wait up to the configured stop timeout for the worker to exit.
    ///
    /// Returns `true` when the worker finished. On timeout the thread is
    /// detached and left to exit on its own.
    pub fn join(&self) -> bool {
        let Some(handle) = self.worker.lock().take() else {
            return self.completion.is_finished();
        };

        if handle.thread().id() == std::thread::current().id() {
            // Stopped from inside a dispatch callback; the loop exits on return.
            return false;
        }

        if self.completion.wait_for(self.stop_timeout) {
            let _ = handle.join();
            debug!(endpoint = %self.endpoint, "parsing task stopped");
            true
        } else {
            warn!(
                endpoint = %self.endpoint,
                timeout = ?self.stop_timeout,
                "parsing task did not stop in time; detaching"
            );
            false
        }
    }

    /// Signal the worker and wait for it.
    pub fn stop(&self) -> bool {
        self.signal_stop();
        self.join()
    }
}

impl std::fmt::Debug for ParsingTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsingTask")
            .field("endpoint", &self.endpoint)
            .field("running", &self.is_running())
            .field("pending", &self.pending())
            .finish()
    }
}

struct Worker {
    endpoint: Endpoint,
    reader: PacketReader,
    buffer: String,
    /// Characters in `buffer`; the limit counts characters, not bytes.
    chars: usize,
    overflowed: bool,
    max_message_len: usize,
    running: Arc<AtomicBool>,
    sink: Arc<dyn MessageSink>,
}

impl Worker {
    fn run(&mut self) {
        while self.running.load(Ordering::Acquire) {
            match read_utf8(&mut self.reader) {
                Ok(TERMINATOR) => self.complete_message(),
                Ok(ch) => self.push(ch),
                Err(fault) if fault.is_closed() => break,
                Err(fault) => {
                    trace!(endpoint = %self.endpoint, %fault, "decode boundary");
                    if !self.buffer.is_empty() || self.overflowed {
                        self.complete_message();
                    }
                }
            }
        }

        if !self.buffer.is_empty() {
            debug!(
                endpoint = %self.endpoint,
                chars = self.chars,
                "discarding incomplete message"
            );
        }
    }

    fn push(&mut self, ch: char) {
        if self.overflowed {
            return;
        }
        if self.chars >= self.max_message_len {
            warn!(
                endpoint = %self.endpoint,
                max = self.max_message_len,
                "message too long; discarding"
            );
            self.reset();
            self.overflowed = true;
            return;
        }
        self.buffer.push(ch);
        self.chars += 1;
    }

    fn complete_message(&mut self) {
        if std::mem::take(&mut self.overflowed) {
            self.reset();
            return;
        }
        if self.buffer.is_empty() {
            return;
        }

        match Message::try_parse(&self.buffer) {
            Some(mut message) => {
                message.set_source(MessageSource {
                    module: self.sink.name().to_string(),
                    endpoint: self.endpoint,
                });
                trace!(endpoint = %self.endpoint, name = message.name(), "dispatching");
                match message {
                    Message::Response(response) => self.sink.on_response_received(response),
                    Message::Command(command) => self.sink.on_command_received(command),
                }
            }
            None => {
                debug!(
                    endpoint = %self.endpoint,
                    chars = self.chars,
                    "dropping unparseable message"
                );
            }
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.chars = 0;
    }
}

#[derive(Default)]
struct Completion {
    finished: Mutex<bool>,
    cv: Condvar,
}

impl Completion {
    fn finish(&self) {
        *self.finished.lock() = true;
        self.cv.notify_all();
    }

    fn is_finished(&self) -> bool {
        *self.finished.lock()
    }

    fn wait_for(&self, timeout: Duration) -> bool {
        let mut finished = self.finished.lock();
        if !*finished {
            let _ = self
                .cv
                .wait_while_for(&mut finished, |finished| !*finished, timeout);
        }
        *finished
    }
}

/// Marks the worker finished even if a sink callback panics.
struct FinishOnDrop(Arc<Completion>);

impl Drop for FinishOnDrop {
    fn drop(&mut self) {
        self.0.finish();
    }
}
