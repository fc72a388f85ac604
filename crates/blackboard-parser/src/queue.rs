use std::collections::VecDeque;
use std::sync::Arc;

use blackboard_transport::{Endpoint, RawPacket};
use bytes::Bytes;
use parking_lot::{Condvar, Mutex};
use tracing::trace;

/// Why a byte could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReadFault {
    /// Every buffered byte has been consumed and no packet is waiting.
    #[error("no buffered data")]
    Drained,
    /// The queue was closed; no more bytes will arrive.
    #[error("queue closed")]
    Closed,
}

/// A blocking source of single bytes.
pub trait ByteSource {
    /// Read the next byte. Failures are values, never panics.
    fn read_byte(&mut self) -> Result<u8, ReadFault>;
}

/// Slices report [`ReadFault::Drained`] once exhausted.
impl ByteSource for std::slice::Iter<'_, u8> {
    fn read_byte(&mut self) -> Result<u8, ReadFault> {
        self.next().copied().ok_or(ReadFault::Drained)
    }
}

enum Dequeued {
    Packet(RawPacket),
    Empty,
    Closed,
}

struct QueueState {
    packets: VecDeque<RawPacket>,
    closed: bool,
}

/// Fixed-capacity blocking queue of raw packets for one endpoint.
///
/// Producers block while the queue is full, the consumer blocks while it is
/// empty. Closing wakes both sides.
pub struct PacketQueue {
    endpoint: Endpoint,
    capacity: usize,
    state: Mutex<QueueState>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl PacketQueue {
    /// Create a queue for `endpoint`. A capacity of zero is treated as one.
    pub fn new(endpoint: Endpoint, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            endpoint,
            capacity,
            state: Mutex::new(QueueState {
                packets: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.state.lock().packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Append a packet, blocking while the queue is full.
    ///
    /// Returns `false` without queueing when the packet belongs to another
    /// endpoint, carries no bytes, or the queue is (or becomes) closed.
    pub fn enqueue(&self, packet: RawPacket) -> bool {
        if packet.endpoint != self.endpoint || packet.is_empty() {
            trace!(
                queue = %self.endpoint,
                packet = %packet.endpoint,
                len = packet.len(),
                "ignoring packet"
            );
            return false;
        }

        let mut state = self.state.lock();
        while state.packets.len() >= self.capacity && !state.closed {
            self.not_full.wait(&mut state);
        }
        if state.closed {
            return false;
        }

        state.packets.push_back(packet);
        let became_non_empty = state.packets.len() == 1;
        drop(state);

        if became_non_empty {
            self.not_empty.notify_one();
        }
        true
    }

    /// Close the queue, dropping any buffered packets and waking every
    /// blocked producer and consumer.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.packets.clear();
        drop(state);

        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Pop the oldest packet, blocking while empty. `None` once closed.
    fn dequeue(&self) -> Option<RawPacket> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(packet) = state.packets.pop_front() {
                let freed_slot = state.packets.len() + 1 == self.capacity;
                drop(state);
                if freed_slot {
                    self.not_full.notify_one();
                }
                return Some(packet);
            }
            self.not_empty.wait(&mut state);
        }
    }

    fn try_dequeue(&self) -> Dequeued {
        let mut state = self.state.lock();
        if state.closed {
            return Dequeued::Closed;
        }
        match state.packets.pop_front() {
            Some(packet) => {
                let freed_slot = state.packets.len() + 1 == self.capacity;
                drop(state);
                if freed_slot {
                    self.not_full.notify_one();
                }
                Dequeued::Packet(packet)
            }
            None => Dequeued::Empty,
        }
    }
}

impl std::fmt::Debug for PacketQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("PacketQueue")
            .field("endpoint", &self.endpoint)
            .field("capacity", &self.capacity)
            .field("len", &state.packets.len())
            .field("closed", &state.closed)
            .finish()
    }
}

/// Consumer-side cursor reading single bytes across queued packets.
///
/// When the current packet is exhausted the reader moves on to the next
/// queued packet. If none is waiting it reports [`ReadFault::Drained`] once
/// (when enabled) and then blocks until a packet arrives or the queue closes.
pub struct PacketReader {
    queue: Arc<PacketQueue>,
    current: Bytes,
    index: usize,
    report_drain: bool,
    drain_reported: bool,
}

impl PacketReader {
    /// Create a reader that reports each drain once.
    pub fn new(queue: Arc<PacketQueue>) -> Self {
        Self::with_drain_reporting(queue, true)
    }

    /// Create a reader, choosing whether drains are reported.
    pub fn with_drain_reporting(queue: Arc<PacketQueue>, report_drain: bool) -> Self {
        Self {
            queue,
            current: Bytes::new(),
            index: 0,
            report_drain,
            // Nothing has been consumed yet, so there is nothing to flush.
            drain_reported: true,
        }
    }

    /// Return the next byte of the stream.
    pub fn read(&mut self) -> Result<u8, ReadFault> {
        loop {
            if let Some(&byte) = self.current.get(self.index) {
                self.index += 1;
                return Ok(byte);
            }

            match self.queue.try_dequeue() {
                Dequeued::Packet(packet) => self.load(packet),
                Dequeued::Closed => return Err(ReadFault::Closed),
                Dequeued::Empty => {
                    if self.report_drain && !self.drain_reported {
                        self.drain_reported = true;
                        return Err(ReadFault::Drained);
                    }
                    match self.queue.dequeue() {
                        Some(packet) => self.load(packet),
                        None => return Err(ReadFault::Closed),
                    }
                }
            }
        }
    }

    /// Bytes of the current packet not yet read.
    pub fn remaining(&self) -> usize {
        self.current.len().saturating_sub(self.index)
    }

    fn load(&mut self, packet: RawPacket) {
        self.current = packet.payload;
        self.index = 0;
        self.drain_reported = false;
    }
}

impl ByteSource for PacketReader {
    fn read_byte(&mut self) -> Result<u8, ReadFault> {
        self.read()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use super::*;

    fn endpoint() -> Endpoint {
        "127.0.0.1:5000".parse().unwrap()
    }

    fn packet(bytes: &'static [u8]) -> RawPacket {
        RawPacket::new(endpoint(), Bytes::from_static(bytes))
    }

    #[test]
    fn ignores_foreign_and_empty_packets() {
        let queue = PacketQueue::new(endpoint(), 4);
        let other: Endpoint = "127.0.0.1:5001".parse().unwrap();

        assert!(!queue.enqueue(RawPacket::new(other, Bytes::from_static(b"x"))));
        assert!(!queue.enqueue(RawPacket::new(endpoint(), Bytes::new())));
        assert!(queue.is_empty());
        assert!(queue.enqueue(packet(b"x")));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let queue = PacketQueue::new(endpoint(), 0);
        assert_eq!(queue.capacity(), 1);
        assert!(queue.enqueue(packet(b"a")));
    }

    #[test]
    fn reader_spans_packets_in_order() {
        let queue = Arc::new(PacketQueue::new(endpoint(), 4));
        queue.enqueue(packet(b"ab"));
        queue.enqueue(packet(b"c"));

        let mut reader = PacketReader::new(Arc::clone(&queue));
        assert_eq!(reader.read(), Ok(b'a'));
        assert_eq!(reader.remaining(), 1);
        assert_eq!(reader.read(), Ok(b'b'));
        assert_eq!(reader.read(), Ok(b'c'));
        assert_eq!(reader.read(), Err(ReadFault::Drained));
    }

    #[test]
    fn drain_is_reported_once_then_read_blocks() {
        let queue = Arc::new(PacketQueue::new(endpoint(), 4));
        queue.enqueue(packet(b"a"));
        let mut reader = PacketReader::new(Arc::clone(&queue));
        assert_eq!(reader.read(), Ok(b'a'));
        assert_eq!(reader.read(), Err(ReadFault::Drained));

        let (tx, rx) = mpsc::channel();
        let consumer = thread::spawn(move || {
            tx.send(reader.read()).unwrap();
        });

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        queue.enqueue(packet(b"z"));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), Ok(b'z'));
        consumer.join().unwrap();
    }

    #[test]
    fn drain_reporting_can_be_disabled() {
        let queue = Arc::new(PacketQueue::new(endpoint(), 4));
        queue.enqueue(packet(b"a"));
        let mut reader = PacketReader::with_drain_reporting(Arc::clone(&queue), false);
        assert_eq!(reader.read(), Ok(b'a'));

        let closer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                queue.close();
            })
        };
        assert_eq!(reader.read(), Err(ReadFault::Closed));
        closer.join().unwrap();
    }

    #[test]
    fn close_interrupts_blocked_reader() {
        let queue = Arc::new(PacketQueue::new(endpoint(), 2));
        let mut reader = PacketReader::new(Arc::clone(&queue));

        let (tx, rx) = mpsc::channel();
        let consumer = thread::spawn(move || {
            tx.send(reader.read()).unwrap();
        });

        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        queue.close();
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            Err(ReadFault::Closed)
        );
        consumer.join().unwrap();
    }

    #[test]
    fn producer_blocks_until_consumer_frees_a_slot() {
        let queue = Arc::new(PacketQueue::new(endpoint(), 1));
        assert!(queue.enqueue(packet(b"1")));

        let (tx, rx) = mpsc::channel();
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let accepted = queue.enqueue(packet(b"2"));
                tx.send(accepted).unwrap();
            })
        };

        // Still full: the second enqueue must be parked.
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        let mut reader = PacketReader::new(Arc::clone(&queue));
        assert_eq!(reader.read(), Ok(b'1'));
        assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap());
        assert_eq!(reader.read(), Ok(b'2'));
        producer.join().unwrap();
    }

    #[test]
    fn close_releases_blocked_producer() {
        let queue = Arc::new(PacketQueue::new(endpoint(), 1));
        queue.enqueue(packet(b"1"));

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.enqueue(packet(b"2")))
        };
        thread::sleep(Duration::from_millis(50));
        queue.close();

        assert!(!producer.join().unwrap());
        assert!(queue.is_closed());
        assert!(queue.is_empty());
        assert!(!queue.enqueue(packet(b"3")));
    }

    #[test]
    fn slice_source_reports_drained() {
        let bytes = [1u8, 2];
        let mut source = bytes.iter();
        assert_eq!(source.read_byte(), Ok(1));
        assert_eq!(source.read_byte(), Ok(2));
        assert_eq!(source.read_byte(), Err(ReadFault::Drained));
    }
}
