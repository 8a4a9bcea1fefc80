//! Unbounded buffer between event producers and the batch sender

use action_events::ActionEvent;
use crossbeam_queue::SegQueue;

/// Multi-producer event buffer. Producers push from any task or thread
/// without blocking; the batch sender is the single consumer and drains
/// in arrival order.
#[derive(Debug, Default)]
pub struct EventQueue {
    inner: SegQueue<ActionEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue one event. Never blocks, never fails.
    pub fn push(&self, event: ActionEvent) {
        self.inner.push(event);
    }

    /// Remove and return everything currently queued, in arrival order.
    /// A second drain with no pushes in between returns an empty batch.
    pub fn drain_all(&self) -> Vec<ActionEvent> {
        let mut batch = Vec::with_capacity(self.inner.len());
        while let Some(event) = self.inner.pop() {
            batch.push(event);
        }
        batch
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn test_event(message: &str) -> ActionEvent {
        ActionEvent::for_action("job-1-W@step").with_message(message)
    }

    #[test]
    fn drains_in_arrival_order() {
        let queue = EventQueue::new();
        queue.push(test_event("first"));
        queue.push(test_event("second"));
        queue.push(test_event("third"));
        assert_eq!(queue.len(), 3);

        let batch = queue.drain_all();
        let messages: Vec<_> = batch.iter().filter_map(|e| e.message.as_deref()).collect();
        assert_eq!(messages, ["first", "second", "third"]);
    }

    #[test]
    fn second_drain_is_empty() {
        let queue = EventQueue::new();
        queue.push(test_event("only"));

        assert_eq!(queue.drain_all().len(), 1);
        assert!(queue.drain_all().is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn accepts_pushes_from_many_threads() {
        let queue = Arc::new(EventQueue::new());
        let mut handles = Vec::new();
        for t in 0..4 {
            let queue = queue.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..100 {
                    queue.push(test_event(&format!("{t}-{i}")));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(queue.len(), 400);
        assert_eq!(queue.drain_all().len(), 400);
    }
}
