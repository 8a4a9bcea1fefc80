//! Seam between the ingestion endpoint and the orchestrator core

use crate::error::GatewayError;
use action_events::ActionEvent;
use async_trait::async_trait;
use event_store::{CommandQueue, PersistEventsCommand};
use std::sync::Arc;
use tracing::debug;

/// What the endpoint hands decoded batches to. Implementations must not
/// block the HTTP handler on storage.
#[async_trait]
pub trait OrchestratorEngine: Send + Sync {
    async fn submit_event_batch(
        &self,
        action_id: &str,
        events: Vec<ActionEvent>,
    ) -> Result<(), GatewayError>;
}

/// Production engine: wraps each batch in a persistence command and hands
/// it to the command queue, returning as soon as it is accepted.
pub struct CommandEngine {
    commands: Arc<dyn CommandQueue>,
}

impl CommandEngine {
    pub fn new(commands: Arc<dyn CommandQueue>) -> Self {
        Self { commands }
    }
}

#[async_trait]
impl OrchestratorEngine for CommandEngine {
    async fn submit_event_batch(
        &self,
        action_id: &str,
        events: Vec<ActionEvent>,
    ) -> Result<(), GatewayError> {
        debug!(action_id, events = events.len(), "queueing event batch");
        self.commands.submit(Box::new(PersistEventsCommand::new(events)))?;
        Ok(())
    }
}
