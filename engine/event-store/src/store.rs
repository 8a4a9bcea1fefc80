//! Storage contract for action events

use crate::error::Result;
use action_events::ActionEvent;
use async_trait::async_trait;

/// Persistence operations for action events.
///
/// Insertion never deduplicates: reporting the same content twice means
/// two rows. Listings come back newest first with undated events last;
/// ties keep insertion order.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append the whole batch as a single unit, one row per event.
    async fn insert_events(&self, events: &[ActionEvent]) -> Result<()>;

    /// Remove every event recorded for the action. Returns the number of
    /// rows removed.
    async fn delete_events_for_action(&self, action_id: &str) -> Result<u64>;

    /// Events recorded for one action, newest first.
    async fn events_for_action(&self, action_id: &str) -> Result<Vec<ActionEvent>>;

    /// Number of events recorded for the action.
    async fn count_events_for_action(&self, action_id: &str) -> Result<u64>;

    /// Every stored event across all actions, newest first.
    async fn all_events(&self) -> Result<Vec<ActionEvent>>;
}
