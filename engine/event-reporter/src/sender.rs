//! Background flush task draining the queue into the transport

use crate::queue::EventQueue;
use crate::transport::Transport;
use action_events::codec;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Periodic sender owning the consumer side of the event queue.
pub struct BatchSender {
    queue: Arc<EventQueue>,
    transport: Arc<dyn Transport>,
    interval: Duration,
    stop_rx: watch::Receiver<bool>,
}

/// Stops a spawned sender and awaits its terminal flush.
pub struct SenderHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SenderHandle {
    /// Request stop, which wakes the sender mid-sleep, and wait for the
    /// task to finish its terminal flush.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(err) = self.task.await {
            error!(error = %err, "event sender task failed");
        }
    }
}

impl BatchSender {
    /// Spawn the sender task on the current runtime.
    pub fn spawn(
        queue: Arc<EventQueue>,
        transport: Arc<dyn Transport>,
        interval: Duration,
    ) -> SenderHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let sender = Self { queue, transport, interval, stop_rx };
        let task = tokio::spawn(sender.run());
        SenderHandle { stop_tx, task }
    }

    async fn run(mut self) {
        info!(interval_secs = self.interval.as_secs(), "event sender started");
        loop {
            if *self.stop_rx.borrow() {
                break;
            }
            if !self.queue.is_empty() {
                self.flush_once().await;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = self.stop_rx.changed() => {
                    // an Err means every stop handle is gone; treat it as stop
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        self.terminal_flush().await;
        info!("event sender stopped");
    }

    /// Drain and send one batch. On failure every drained event goes back
    /// on the queue for the next cycle; arrival order across the retry
    /// boundary is not preserved, the server orders by timestamp.
    async fn flush_once(&self) {
        let batch = self.queue.drain_all();
        if batch.is_empty() {
            return;
        }
        let body = codec::encode_batch(&batch);
        debug!(events = batch.len(), bytes = body.len(), "sending event batch");
        if let Err(err) = self.transport.post(body.into_bytes()).await {
            warn!(error = %err, events = batch.len(), "event batch send failed, requeueing");
            for event in batch {
                self.queue.push(event);
            }
        }
    }

    /// Final drain after the loop exits. A failure here does not requeue;
    /// the rendered wire form is logged so operators can recover the
    /// events by hand.
    async fn terminal_flush(&self) {
        let batch = self.queue.drain_all();
        if batch.is_empty() {
            return;
        }
        let body = codec::encode_batch(&batch);
        if let Err(err) = self.transport.post(body.clone().into_bytes()).await {
            error!(
                error = %err,
                events = batch.len(),
                payload = %body,
                "terminal event flush failed, events dropped"
            );
        }
    }
}
