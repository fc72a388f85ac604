use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use blackboard_transport::{Endpoint, PacketHandler, RawPacket};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::ParserConfig;
use crate::error::Result;
use crate::message::MessageSink;
use crate::task::ParsingTask;

/// Routes raw packets to one [`ParsingTask`] per endpoint.
///
/// Tasks are created lazily on the first packet from an unseen endpoint.
/// Lookups take the registry's read lock; only insertion and removal take
/// the write lock, so packets for different endpoints never contend on the
/// registry. Once [`stop`](Self::stop) has run the engine stays stopped.
pub struct ParserEngine {
    sink: Arc<dyn MessageSink>,
    config: ParserConfig,
    running: AtomicBool,
    tasks: RwLock<HashMap<Endpoint, Arc<ParsingTask>>>,
}

impl ParserEngine {
    /// Create a running engine with default configuration.
    pub fn new(sink: Arc<dyn MessageSink>) -> Self {
        Self::with_config(sink, ParserConfig::default())
    }

    /// Create a running engine with explicit configuration.
    pub fn with_config(sink: Arc<dyn MessageSink>, config: ParserConfig) -> Self {
        Self {
            sink,
            config,
            running: AtomicBool::new(true),
            tasks: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Route a packet to its endpoint's task, creating the task if needed.
    ///
    /// A no-op once the engine is stopped. Blocks while the endpoint's queue
    /// is full; other endpoints are unaffected. Fails only when a new worker
    /// thread cannot be spawned.
    pub fn enqueue(&self, packet: RawPacket) -> Result<()> {
        if !self.is_running() {
            return Ok(());
        }

        let existing = self.tasks.read().get(&packet.endpoint).cloned();
        let task = match existing {
            Some(task) => task,
            None => match self.task_for(packet.endpoint)? {
                Some(task) => task,
                None => return Ok(()),
            },
        };

        // The registry lock is released before a possibly blocking enqueue.
        task.enqueue(packet);
        Ok(())
    }

    fn task_for(&self, endpoint: Endpoint) -> Result<Option<Arc<ParsingTask>>> {
        let mut tasks = self.tasks.write();
        if !self.is_running() {
            return Ok(None);
        }
        if let Some(task) = tasks.get(&endpoint) {
            return Ok(Some(Arc::clone(task)));
        }

        let task = Arc::new(ParsingTask::spawn(
            endpoint,
            Arc::clone(&self.sink),
            &self.config,
        )?);
        tasks.insert(endpoint, Arc::clone(&task));
        debug!(%endpoint, tasks = tasks.len(), "registered endpoint");
        Ok(Some(task))
    }

    /// Stop and remove the task for one endpoint.
    ///
    /// Returns `false` if the endpoint had no task.
    pub fn stop_endpoint(&self, endpoint: Endpoint) -> bool {
        let removed = self.tasks.write().remove(&endpoint);
        match removed {
            Some(task) => {
                task.stop();
                debug!(%endpoint, "endpoint stopped");
                true
            }
            None => false,
        }
    }

    /// Stop every task and leave the engine stopped.
    ///
    /// All workers are signalled before any is joined, so the total wait is
    /// bounded by the slowest worker rather than the sum of all of them.
    pub fn stop(&self) {
        let was_running = self.running.swap(false, Ordering::AcqRel);
        let tasks: Vec<Arc<ParsingTask>> = self.tasks.write().drain().map(|(_, t)| t).collect();

        for task in &tasks {
            task.signal_stop();
        }
        let detached = tasks.iter().filter(|task| !task.join()).count();

        if detached > 0 {
            warn!(detached, "some parsing tasks did not stop in time");
        }
        if was_running {
            info!(stopped = tasks.len(), "parser engine stopped");
        }
    }

    /// Endpoints that currently have a task.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        let mut endpoints: Vec<Endpoint> = self.tasks.read().keys().copied().collect();
        endpoints.sort_unstable();
        endpoints
    }

    pub fn task_count(&self) -> usize {
        self.tasks.read().len()
    }
}

impl PacketHandler for ParserEngine {
    fn on_packet(&self, packet: RawPacket) {
        let endpoint = packet.endpoint;
        if let Err(err) = self.enqueue(packet) {
            warn!(%endpoint, error = %err, "dropping packet");
        }
    }

    fn on_disconnect(&self, endpoint: Endpoint) {
        self.stop_endpoint(endpoint);
    }
}

impl Drop for ParserEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for ParserEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserEngine")
            .field("running", &self.is_running())
            .field("tasks", &self.task_count())
            .field("config", &self.config)
            .finish()
    }
}
