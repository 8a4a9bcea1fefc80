//! In-memory event store
//!
//! Backs tests and single-node setups. Same observable behavior as the
//! Postgres store, without durability.

use crate::error::Result;
use crate::store::EventStore;
use action_events::ActionEvent;
use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Default)]
pub struct MemoryEventStore {
    events: Arc<Mutex<Vec<ActionEvent>>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first, undated events after every dated one. Used with a stable
/// sort so ties keep insertion order.
fn newest_first(a: &ActionEvent, b: &ActionEvent) -> Ordering {
    match (&a.timestamp, &b.timestamp) {
        (Some(left), Some(right)) => right.cmp(left),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert_events(&self, events: &[ActionEvent]) -> Result<()> {
        let mut store = self.events.lock().await;
        store.extend_from_slice(events);
        Ok(())
    }

    async fn delete_events_for_action(&self, action_id: &str) -> Result<u64> {
        let mut store = self.events.lock().await;
        let before = store.len();
        store.retain(|event| event.action_id.as_deref() != Some(action_id));
        Ok((before - store.len()) as u64)
    }

    async fn events_for_action(&self, action_id: &str) -> Result<Vec<ActionEvent>> {
        let store = self.events.lock().await;
        let mut matching: Vec<ActionEvent> = store
            .iter()
            .filter(|event| event.action_id.as_deref() == Some(action_id))
            .cloned()
            .collect();
        matching.sort_by(newest_first);
        Ok(matching)
    }

    async fn count_events_for_action(&self, action_id: &str) -> Result<u64> {
        let store = self.events.lock().await;
        let count =
            store.iter().filter(|event| event.action_id.as_deref() == Some(action_id)).count();
        Ok(count as u64)
    }

    async fn all_events(&self) -> Result<Vec<ActionEvent>> {
        let store = self.events.lock().await;
        let mut all = store.clone();
        all.sort_by(newest_first);
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn test_event(action_id: &str, message: &str, secs: i64) -> ActionEvent {
        ActionEvent {
            action_id: Some(action_id.to_string()),
            event_type: Some("other".to_string()),
            message: Some(message.to_string()),
            timestamp: Some(Utc.timestamp_opt(secs, 0).unwrap()),
        }
    }

    #[tokio::test]
    async fn lists_only_the_requested_action_newest_first() {
        let store = MemoryEventStore::new();
        store
            .insert_events(&[
                test_event("a1", "first", 100),
                test_event("a1", "third", 300),
                test_event("a1", "second", 200),
            ])
            .await
            .unwrap();
        store
            .insert_events(&[test_event("a2", "other action", 150), test_event("a2", "more", 250)])
            .await
            .unwrap();

        let events = store.events_for_action("a1").await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].message.as_deref(), Some("third"));
        assert_eq!(events[1].message.as_deref(), Some("second"));
        assert_eq!(events[2].message.as_deref(), Some("first"));

        assert_eq!(store.count_events_for_action("a1").await.unwrap(), 3);
        assert_eq!(store.count_events_for_action("a2").await.unwrap(), 2);
        assert_eq!(store.count_events_for_action("a3").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_content_is_not_deduplicated() {
        let store = MemoryEventStore::new();
        let event = test_event("a1", "same", 100);
        store.insert_events(&[event.clone()]).await.unwrap();
        store.insert_events(&[event]).await.unwrap();

        assert_eq!(store.count_events_for_action("a1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn undated_events_sort_last() {
        let store = MemoryEventStore::new();
        let undated = ActionEvent {
            action_id: Some("a1".to_string()),
            message: Some("undated".to_string()),
            ..Default::default()
        };
        store
            .insert_events(&[test_event("a1", "late", 200), undated, test_event("a1", "early", 100)])
            .await
            .unwrap();

        let events = store.events_for_action("a1").await.unwrap();
        assert_eq!(events[0].message.as_deref(), Some("late"));
        assert_eq!(events[1].message.as_deref(), Some("early"));
        assert_eq!(events[2].message.as_deref(), Some("undated"));
    }

    #[tokio::test]
    async fn delete_touches_only_the_requested_action() {
        let store = MemoryEventStore::new();
        store
            .insert_events(&[
                test_event("a1", "one", 100),
                test_event("a1", "two", 200),
                test_event("a2", "keep", 300),
            ])
            .await
            .unwrap();

        assert_eq!(store.delete_events_for_action("a1").await.unwrap(), 2);
        assert_eq!(store.count_events_for_action("a1").await.unwrap(), 0);
        assert_eq!(store.count_events_for_action("a2").await.unwrap(), 1);

        assert_eq!(store.delete_events_for_action("a1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn all_events_spans_every_action() {
        let store = MemoryEventStore::new();
        store
            .insert_events(&[test_event("a1", "older", 100), test_event("a2", "newer", 200)])
            .await
            .unwrap();

        let all = store.all_events().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].action_id.as_deref(), Some("a2"));
        assert_eq!(all[1].action_id.as_deref(), Some("a1"));
    }
}
