//! Producer-side event pipeline for Trellis workflow actions
//!
//! A running action builds one `ActionEventReporter` from its
//! configuration, reports progress events through it, and calls `finish`
//! before exiting so buffered events get a final flush. Reporting is
//! fire-and-forget: producers never observe a send failure, the sender
//! retries on its own cycle.

pub mod config;
pub mod error;
pub mod observer;
pub mod queue;
pub mod sender;
pub mod transport;

pub use config::ReporterConfig;
pub use error::SendError;
pub use observer::LogObserver;
pub use queue::EventQueue;
pub use transport::{CallbackTransport, Transport};

use action_events::ActionEvent;
use sender::{BatchSender, SenderHandle};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Entry point for reporting action events back to the orchestrator.
pub struct ActionEventReporter {
    action_id: String,
    pipeline: Option<Pipeline>,
}

struct Pipeline {
    queue: Arc<EventQueue>,
    sender: Mutex<Option<SenderHandle>>,
}

impl ActionEventReporter {
    /// Build a reporter from configuration. Without a callback URL the
    /// pipeline is disabled: nothing is spawned and reported events are
    /// dropped. Must be called from within a tokio runtime when a URL is
    /// configured.
    pub fn new(config: ReporterConfig) -> Result<Self, SendError> {
        match &config.callback_url {
            Some(url) => {
                let transport = Arc::new(CallbackTransport::new(url)?);
                Ok(Self::with_transport(config, transport))
            }
            None => {
                info!(
                    action_id = %config.action_id,
                    "event handling is disabled, no events will be sent"
                );
                Ok(Self { action_id: config.action_id, pipeline: None })
            }
        }
    }

    /// Build an enabled reporter over a custom transport.
    pub fn with_transport(config: ReporterConfig, transport: Arc<dyn Transport>) -> Self {
        info!(
            action_id = %config.action_id,
            interval_secs = config.send_interval_secs,
            "event handling is enabled"
        );
        let queue = Arc::new(EventQueue::new());
        let handle = BatchSender::spawn(queue.clone(), transport, config.send_interval());
        Self {
            action_id: config.action_id,
            pipeline: Some(Pipeline { queue, sender: Mutex::new(Some(handle)) }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Events queued but not yet sent.
    pub fn pending(&self) -> usize {
        self.pipeline.as_ref().map_or(0, |pipeline| pipeline.queue.len())
    }

    /// New event stamped with this reporter's action id, the default
    /// category and the current time.
    pub fn new_event(&self) -> ActionEvent {
        ActionEvent::for_action(self.action_id.clone())
    }

    /// Queue an event for delivery. False means the pipeline is disabled
    /// and the event was dropped.
    pub fn report(&self, event: ActionEvent) -> bool {
        match &self.pipeline {
            Some(pipeline) => {
                pipeline.queue.push(event);
                true
            }
            None => {
                debug!("event dropped, event handling is disabled");
                false
            }
        }
    }

    /// Stop the sender after a final flush of everything still queued.
    /// Idempotent; later calls are no-ops.
    pub async fn finish(&self) {
        if let Some(pipeline) = &self.pipeline {
            let handle = pipeline.sender.lock().await.take();
            if let Some(handle) = handle {
                handle.stop().await;
            }
        }
    }
}
