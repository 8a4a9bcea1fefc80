//! Command queue serializing writes against the event store
//!
//! Ingress handlers never touch the store directly; they wrap work in a
//! command and submit it here. One worker task executes commands in
//! submission order, which is the single serialization point for event
//! writes.

use crate::error::{Result, StoreError};
use crate::store::EventStore;
use action_events::ActionEvent;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Queue accounting label for event persistence commands.
pub const PERSIST_EVENTS_COMMAND: &str = "action.event";

/// A queued unit of work against the event store.
#[async_trait]
pub trait Command: Send + Sync {
    /// Stable label used in queue accounting and logs.
    fn name(&self) -> &str;

    async fn execute(&self, store: &dyn EventStore) -> Result<()>;
}

/// Accepts commands without blocking the caller.
pub trait CommandQueue: Send + Sync {
    /// Enqueue a command. Fails only after the queue has been shut down.
    fn submit(&self, command: Box<dyn Command>) -> Result<()>;
}

/// Persists one decoded event batch in a single store call.
pub struct PersistEventsCommand {
    events: Vec<ActionEvent>,
}

impl PersistEventsCommand {
    pub fn new(events: Vec<ActionEvent>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl Command for PersistEventsCommand {
    fn name(&self) -> &str {
        PERSIST_EVENTS_COMMAND
    }

    async fn execute(&self, store: &dyn EventStore) -> Result<()> {
        debug!(events = self.events.len(), "persisting event batch");
        store.insert_events(&self.events).await
    }
}

/// Default queue implementation: an unbounded channel drained by one
/// worker task. Command failures are logged and the worker moves on;
/// retry policy belongs to the queue's operator, not the command.
pub struct CommandRunner {
    tx: Mutex<Option<mpsc::UnboundedSender<Box<dyn Command>>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl CommandRunner {
    /// Spawn the worker on the current runtime.
    pub fn start(store: Arc<dyn EventStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Box<dyn Command>>();
        let worker = tokio::spawn(async move {
            info!("command runner started");
            while let Some(command) = rx.recv().await {
                if let Err(err) = command.execute(store.as_ref()).await {
                    error!(command = command.name(), error = %err, "command failed");
                }
            }
            info!("command runner stopped");
        });
        Self { tx: Mutex::new(Some(tx)), worker: Mutex::new(Some(worker)) }
    }

    /// Close the queue, let the worker drain what was already submitted,
    /// and wait for it to exit. Idempotent.
    pub async fn shutdown(&self) {
        drop(self.tx.lock().take());
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(err) = worker.await {
                error!(error = %err, "command runner task failed");
            }
        }
    }
}

impl CommandQueue for CommandRunner {
    fn submit(&self, command: Box<dyn Command>) -> Result<()> {
        match self.tx.lock().as_ref() {
            Some(tx) => tx.send(command).map_err(|_| StoreError::QueueClosed),
            None => Err(StoreError::QueueClosed),
        }
    }
}
