//! Service state wiring and lifecycle

use crate::config::ServiceConfig;
use anyhow::{Context, Result};
use event_gateway::{routes, CommandEngine, OrchestratorEngine};
use event_store::{
    CommandQueue, CommandRunner, EventStore, MemoryEventStore, PostgresEventStore, StoreBackend,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Everything the listener needs, wired store-up: the event store feeds a
/// command runner, the runner backs the engine, the engine backs the
/// HTTP routes.
pub struct ServiceState {
    config: ServiceConfig,
    store: Arc<dyn EventStore>,
    commands: Arc<CommandRunner>,
    engine: Arc<dyn OrchestratorEngine>,
    listener_stop: Mutex<Option<oneshot::Sender<()>>>,
    listener_task: Mutex<Option<JoinHandle<()>>>,
}

impl ServiceState {
    pub async fn new(config: ServiceConfig) -> Result<Self> {
        info!(service = %config.service.name, "initializing event service");

        let store: Arc<dyn EventStore> = match config.store.backend {
            StoreBackend::Memory => {
                warn!("using the in-memory event store, events will not survive restarts");
                Arc::new(MemoryEventStore::new())
            }
            StoreBackend::Postgres => Arc::new(
                PostgresEventStore::connect(&config.store)
                    .await
                    .context("failed to connect to the event store database")?,
            ),
        };

        let commands = Arc::new(CommandRunner::start(store.clone()));
        let engine: Arc<dyn OrchestratorEngine> =
            Arc::new(CommandEngine::new(commands.clone() as Arc<dyn CommandQueue>));

        Ok(Self {
            config,
            store,
            commands,
            engine,
            listener_stop: Mutex::new(None),
            listener_task: Mutex::new(None),
        })
    }

    pub fn store(&self) -> Arc<dyn EventStore> {
        self.store.clone()
    }

    /// Bind the callback listener and serve until shutdown. Returns the
    /// bound address, which matters when the configured port is 0.
    pub async fn start_listener(&self) -> Result<SocketAddr> {
        let (stop_tx, stop_rx) = oneshot::channel();
        let (addr, serving) = routes::bind(&self.config.listener, self.engine.clone(), stop_rx)
            .context("failed to bind the callback listener")?;
        info!(%addr, "callback listener started");

        *self.listener_stop.lock().await = Some(stop_tx);
        *self.listener_task.lock().await = Some(tokio::spawn(serving));
        Ok(addr)
    }

    /// Stop the listener first so no new batches arrive, then drain and
    /// stop the command queue.
    pub async fn shutdown(&self) {
        info!("shutting down event service");
        let timeout = self.config.shutdown_timeout();

        if let Some(stop_tx) = self.listener_stop.lock().await.take() {
            let _ = stop_tx.send(());
        }
        let listener = self.listener_task.lock().await.take();
        if let Some(listener) = listener {
            graceful_shutdown(listener, timeout, "callback listener").await;
        }

        if tokio::time::timeout(timeout, self.commands.shutdown()).await.is_err() {
            warn!("command queue did not drain within {}s", timeout.as_secs());
        }
        info!("event service stopped");
    }
}

/// Wait for a task to finish, logging instead of hanging forever.
async fn graceful_shutdown(task: JoinHandle<()>, timeout: Duration, name: &str) {
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(())) => info!(task = name, "task stopped"),
        Ok(Err(err)) => error!(task = name, error = %err, "task failed during shutdown"),
        Err(_) => warn!(task = name, "task did not stop within {}s", timeout.as_secs()),
    }
}
