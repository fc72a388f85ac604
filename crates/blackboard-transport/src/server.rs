use std::collections::HashMap;
use std::io::{ErrorKind, Read, Write};
use std::net::{Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::packet::{encode_message, Endpoint, RawPacket};

const DEFAULT_READ_CHUNK_SIZE: usize = 8 * 1024;

/// Receives the packets and disconnects produced by a [`TcpServer`].
///
/// Called from the per-connection reader threads, so implementations must be
/// thread-safe. `on_packet` may block; doing so stalls only the connection
/// that produced the packet.
pub trait PacketHandler: Send + Sync {
    /// A read completed on a connected endpoint.
    fn on_packet(&self, packet: RawPacket);

    /// The endpoint disconnected or its stream failed.
    fn on_disconnect(&self, _endpoint: Endpoint) {}
}

impl<F> PacketHandler for F
where
    F: Fn(RawPacket) + Send + Sync,
{
    fn on_packet(&self, packet: RawPacket) {
        self(packet)
    }
}

/// Configuration for accepted connections.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Size of the buffer used for each socket read. Default: 8 KiB.
    pub read_chunk_size: usize,
    /// Read timeout applied to accepted streams.
    pub read_timeout: Option<Duration>,
    /// Write timeout applied to accepted streams. A peer that stops reading
    /// fails [`TcpServer::send_to`] after this long instead of blocking it.
    pub write_timeout: Option<Duration>,
    /// Disable Nagle's algorithm on accepted streams. Default: true.
    pub nodelay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            read_timeout: None,
            write_timeout: None,
            nodelay: true,
        }
    }
}

/// Blocking TCP server producing one [`RawPacket`] per socket read.
///
/// [`serve`](Self::serve) runs the accept loop on the calling thread and
/// spawns one reader thread per connection. The server is shared through an
/// `Arc` so other threads can [`send_to`](Self::send_to) connected peers or
/// [`shutdown`](Self::shutdown) the loop.
pub struct TcpServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: ServerConfig,
    connections: Arc<Mutex<HashMap<Endpoint, Arc<Connection>>>>,
    shutdown: Arc<AtomicBool>,
}

/// Write half of an accepted stream.
///
/// `control` is never locked so shutdown can close a socket whose writer is
/// blocked on a peer that stopped reading.
struct Connection {
    writer: Mutex<TcpStream>,
    control: TcpStream,
}

impl TcpServer {
    /// Bind with default configuration.
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<Self> {
        Self::bind_with_config(addr, ServerConfig::default())
    }

    /// Bind with explicit configuration.
    pub fn bind_with_config(
        addr: impl ToSocketAddrs + std::fmt::Display,
        config: ServerConfig,
    ) -> Result<Self> {
        let listener = TcpListener::bind(&addr).map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
        let local_addr = listener.local_addr()?;

        info!(%local_addr, "listening on tcp");

        Ok(Self {
            listener,
            local_addr,
            config,
            connections: Arc::new(Mutex::new(HashMap::new())),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The bound local address (resolves port 0 to the assigned port).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until [`shutdown`](Self::shutdown) is called.
    pub fn serve(&self, handler: Arc<dyn PacketHandler>) -> Result<()> {
        if self.is_shut_down() {
            return Err(TransportError::Shutdown);
        }
        for incoming in self.listener.incoming() {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            let stream = match incoming {
                Ok(stream) => stream,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Accept(err)),
            };

            if let Err(err) = self.spawn_reader(stream, Arc::clone(&handler)) {
                warn!(error = %err, "failed to set up accepted connection");
            }
        }

        debug!(local_addr = %self.local_addr, "accept loop finished");
        Ok(())
    }

    /// Write `text` plus the message terminator to a connected endpoint.
    ///
    /// Only this endpoint's writer is held during the write; a peer that
    /// stops reading blocks callers writing to it and nobody else.
    pub fn send_to(&self, endpoint: Endpoint, text: &str) -> Result<()> {
        if self.is_shut_down() {
            return Err(TransportError::Shutdown);
        }
        let connection = self
            .connections
            .lock()
            .get(&endpoint)
            .cloned()
            .ok_or(TransportError::UnknownEndpoint(endpoint))?;

        let mut stream = connection.writer.lock();
        stream.write_all(&encode_message(text))?;
        stream.flush()?;
        Ok(())
    }

    /// Endpoints with a live connection.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        let mut endpoints: Vec<Endpoint> = self.connections.lock().keys().copied().collect();
        endpoints.sort_unstable();
        endpoints
    }

    /// Stop accepting, close every connection and unblock [`serve`](Self::serve).
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }

        let connections: Vec<_> = self.connections.lock().drain().collect();
        for (endpoint, connection) in connections {
            debug!(%endpoint, "closing connection");
            let _ = connection.control.shutdown(Shutdown::Both);
        }

        // The accept loop only observes the flag once `accept` returns.
        let _ = TcpStream::connect_timeout(&wake_addr(self.local_addr), Duration::from_secs(1));
        info!(local_addr = %self.local_addr, "tcp server shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    fn spawn_reader(&self, stream: TcpStream, handler: Arc<dyn PacketHandler>) -> Result<()> {
        let endpoint = Endpoint::new(stream.peer_addr()?);
        stream.set_nodelay(self.config.nodelay)?;
        stream.set_read_timeout(self.config.read_timeout)?;
        stream.set_write_timeout(self.config.write_timeout)?;
        let connection = Arc::new(Connection {
            writer: Mutex::new(stream.try_clone()?),
            control: stream.try_clone()?,
        });
        self.connections.lock().insert(endpoint, connection);

        debug!(%endpoint, "accepted connection");

        let connections = Arc::clone(&self.connections);
        let shutdown = Arc::clone(&self.shutdown);
        let chunk_size = self.config.read_chunk_size.max(1);

        std::thread::Builder::new()
            .name(format!("bb-conn-{endpoint}"))
            .spawn(move || {
                read_loop(stream, endpoint, chunk_size, &shutdown, handler.as_ref());
                connections.lock().remove(&endpoint);
                handler.on_disconnect(endpoint);
                debug!(%endpoint, "connection closed");
            })?;
        Ok(())
    }
}

impl Drop for TcpServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn read_loop(
    mut stream: TcpStream,
    endpoint: Endpoint,
    chunk_size: usize,
    shutdown: &AtomicBool,
    handler: &dyn PacketHandler,
) {
    let mut chunk = vec![0u8; chunk_size];
    loop {
        let read = match stream.read(&mut chunk) {
            Ok(0) => return,
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                if shutdown.load(Ordering::SeqCst) {
                    return;
                }
                continue;
            }
            Err(err) => {
                debug!(%endpoint, error = %err, "read failed");
                return;
            }
        };

        handler.on_packet(RawPacket::new(
            endpoint,
            Bytes::copy_from_slice(&chunk[..read]),
        ));
    }
}

fn wake_addr(local: SocketAddr) -> SocketAddr {
    match local {
        SocketAddr::V4(v4) if v4.ip().is_unspecified() => {
            SocketAddr::from((Ipv4Addr::LOCALHOST, v4.port()))
        }
        SocketAddr::V6(v6) if v6.ip().is_unspecified() => {
            SocketAddr::from((Ipv6Addr::LOCALHOST, v6.port()))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::thread;

    use super::*;
    use crate::connection::TcpConnection;

    struct ChannelHandler {
        packets: Mutex<mpsc::Sender<RawPacket>>,
        disconnects: Mutex<mpsc::Sender<Endpoint>>,
    }

    impl PacketHandler for ChannelHandler {
        fn on_packet(&self, packet: RawPacket) {
            let _ = self.packets.lock().send(packet);
        }

        fn on_disconnect(&self, endpoint: Endpoint) {
            let _ = self.disconnects.lock().send(endpoint);
        }
    }

    fn start_server() -> (
        Arc<TcpServer>,
        thread::JoinHandle<Result<()>>,
        mpsc::Receiver<RawPacket>,
        mpsc::Receiver<Endpoint>,
    ) {
        let server = Arc::new(TcpServer::bind("127.0.0.1:0").expect("server should bind"));
        let (packet_tx, packet_rx) = mpsc::channel();
        let (disc_tx, disc_rx) = mpsc::channel();
        let handler: Arc<dyn PacketHandler> = Arc::new(ChannelHandler {
            packets: Mutex::new(packet_tx),
            disconnects: Mutex::new(disc_tx),
        });

        let serving = Arc::clone(&server);
        let join = thread::spawn(move || serving.serve(handler));
        (server, join, packet_rx, disc_rx)
    }

    fn collect_until_terminator(rx: &mpsc::Receiver<RawPacket>) -> (Endpoint, Vec<u8>) {
        let mut bytes = Vec::new();
        let mut endpoint = None;
        while !bytes.contains(&0) {
            let packet = rx
                .recv_timeout(Duration::from_secs(5))
                .expect("packet should arrive");
            endpoint = Some(packet.endpoint);
            bytes.extend_from_slice(&packet.payload);
        }
        (endpoint.expect("at least one packet"), bytes)
    }

    #[test]
    fn client_text_arrives_as_packets() {
        let (server, join, packets, _disc) = start_server();

        let mut client = TcpConnection::connect(server.local_addr()).expect("client should connect");
        client.send_text("PING 1").expect("send should succeed");

        let (endpoint, bytes) = collect_until_terminator(&packets);
        assert_eq!(bytes, b"PING 1\0");
        assert_eq!(endpoint, client.local_endpoint());

        server.shutdown();
        join.join().expect("serve thread").expect("serve should end cleanly");
    }

    #[test]
    fn send_to_reaches_connected_client() {
        let (server, join, packets, _disc) = start_server();

        let mut client = TcpConnection::connect(server.local_addr()).expect("client should connect");
        client.send_text("hello").expect("send should succeed");
        let (endpoint, _) = collect_until_terminator(&packets);

        server
            .send_to(endpoint, "hello 1 @0")
            .expect("reply should send");
        client
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("timeout should apply");
        assert_eq!(client.read_message().expect("reply"), "hello 1 @0");

        server.shutdown();
        join.join().expect("serve thread").expect("serve should end cleanly");
    }

    #[test]
    fn send_to_unknown_endpoint_fails() {
        let server = TcpServer::bind("127.0.0.1:0").expect("server should bind");
        let ghost: Endpoint = "127.0.0.1:9".parse().unwrap();
        let err = server.send_to(ghost, "x").unwrap_err();
        assert!(matches!(err, TransportError::UnknownEndpoint(ep) if ep == ghost));
    }

    #[test]
    fn disconnect_is_reported() {
        let (server, join, packets, disconnects) = start_server();

        let mut client = TcpConnection::connect(server.local_addr()).expect("client should connect");
        client.send_text("bye").expect("send should succeed");
        let (endpoint, _) = collect_until_terminator(&packets);
        drop(client);

        let gone = disconnects
            .recv_timeout(Duration::from_secs(5))
            .expect("disconnect should be reported");
        assert_eq!(gone, endpoint);

        server.shutdown();
        join.join().expect("serve thread").expect("serve should end cleanly");
        assert!(server.endpoints().is_empty());
    }

    #[test]
    fn closure_handlers_are_accepted() {
        let server = Arc::new(TcpServer::bind("127.0.0.1:0").expect("server should bind"));
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let handler: Arc<dyn PacketHandler> = Arc::new(move |packet: RawPacket| {
            let _ = tx.lock().send(packet);
        });

        let serving = Arc::clone(&server);
        let join = thread::spawn(move || serving.serve(handler));

        let mut client = TcpConnection::connect(server.local_addr()).expect("client should connect");
        client.send_text("x").expect("send should succeed");
        let (_, bytes) = collect_until_terminator(&rx);
        assert_eq!(bytes, b"x\0");

        server.shutdown();
        join.join().expect("serve thread").expect("serve should end cleanly");
    }

    #[test]
    fn stalled_peer_does_not_block_other_endpoints() {
        let (server, join, packets, _disc) = start_server();

        let mut stalled = TcpConnection::connect(server.local_addr()).expect("client should connect");
        stalled.send_text("slow").expect("send should succeed");
        let (stalled_ep, _) = collect_until_terminator(&packets);

        // Fill the stalled peer's socket buffers; the writer ends up blocked.
        let flooding = Arc::clone(&server);
        let flood = thread::spawn(move || {
            let chunk = "x".repeat(1024 * 1024);
            while flooding.send_to(stalled_ep, &chunk).is_ok() {}
        });
        thread::sleep(Duration::from_millis(300));

        let mut healthy = TcpConnection::connect(server.local_addr()).expect("client should connect");
        healthy.send_text("PING 1").expect("send should succeed");
        let (healthy_ep, bytes) = collect_until_terminator(&packets);
        assert_eq!(healthy_ep, healthy.local_endpoint());
        assert_eq!(bytes, b"PING 1\0");

        server.send_to(healthy_ep, "PING \"\" 1").expect("reply should send");
        healthy
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("timeout should apply");
        assert_eq!(healthy.read_message().expect("reply"), "PING \"\" 1");

        server.shutdown();
        drop(stalled);
        flood.join().expect("flood thread should finish");
        join.join().expect("serve thread").expect("serve should end cleanly");
    }

    #[test]
    fn write_timeout_fails_sends_to_stalled_peer() {
        let config = ServerConfig {
            write_timeout: Some(Duration::from_millis(100)),
            ..ServerConfig::default()
        };
        let server = Arc::new(TcpServer::bind_with_config("127.0.0.1:0", config).expect("bind"));
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let handler: Arc<dyn PacketHandler> = Arc::new(move |packet: RawPacket| {
            let _ = tx.lock().send(packet);
        });
        let serving = Arc::clone(&server);
        let join = thread::spawn(move || serving.serve(handler));

        let mut stalled = TcpConnection::connect(server.local_addr()).expect("client should connect");
        stalled.send_text("slow").expect("send should succeed");
        let (endpoint, _) = collect_until_terminator(&rx);

        let chunk = "x".repeat(1024 * 1024);
        let failure = (0..256).find_map(|_| server.send_to(endpoint, &chunk).err());
        match failure {
            Some(TransportError::Io(err)) => assert!(
                matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut),
                "unexpected error kind {:?}",
                err.kind()
            ),
            other => panic!("expected a write timeout, got {other:?}"),
        }

        server.shutdown();
        join.join().expect("serve thread").expect("serve should end cleanly");
    }

    #[test]
    fn idle_reads_survive_read_timeout_without_nodelay() {
        let config = ServerConfig {
            read_timeout: Some(Duration::from_millis(20)),
            nodelay: false,
            ..ServerConfig::default()
        };
        let server = Arc::new(TcpServer::bind_with_config("127.0.0.1:0", config).expect("bind"));
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let handler: Arc<dyn PacketHandler> = Arc::new(move |packet: RawPacket| {
            let _ = tx.lock().send(packet);
        });
        let serving = Arc::clone(&server);
        let join = thread::spawn(move || serving.serve(handler));

        let mut client = TcpConnection::connect(server.local_addr()).expect("client should connect");
        thread::sleep(Duration::from_millis(150));
        client.send_text("late").expect("send should succeed");
        let (_, bytes) = collect_until_terminator(&rx);
        assert_eq!(bytes, b"late\0");

        server.shutdown();
        join.join().expect("serve thread").expect("serve should end cleanly");
    }

    #[test]
    fn shut_down_server_refuses_work() {
        let server = TcpServer::bind("127.0.0.1:0").expect("server should bind");
        server.shutdown();
        let ghost: Endpoint = "127.0.0.1:9".parse().unwrap();
        assert!(matches!(server.send_to(ghost, "x"), Err(TransportError::Shutdown)));
        let handler: Arc<dyn PacketHandler> = Arc::new(|_: RawPacket| {});
        assert!(matches!(server.serve(handler), Err(TransportError::Shutdown)));
    }

    #[test]
    fn wake_addr_maps_unspecified_to_loopback() {
        let v4: SocketAddr = "0.0.0.0:4000".parse().unwrap();
        assert_eq!(wake_addr(v4), "127.0.0.1:4000".parse::<SocketAddr>().unwrap());
        let bound: SocketAddr = "192.168.1.2:4000".parse().unwrap();
        assert_eq!(wake_addr(bound), bound);
    }
}
