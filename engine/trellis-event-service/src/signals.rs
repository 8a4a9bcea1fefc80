//! Signal handling for graceful shutdown

use signal_hook::consts::SIGTERM;
use signal_hook::flag;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::info;

/// Resolve the returned channel when ctrl-c or SIGTERM arrives.
pub fn setup_signal_handlers() -> anyhow::Result<oneshot::Receiver<()>> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let term_flag = Arc::new(AtomicBool::new(false));
    flag::register(SIGTERM, term_flag.clone())?;

    tokio::spawn(async move {
        let mut poll = tokio::time::interval(Duration::from_millis(100));
        loop {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if result.is_ok() {
                        info!("received ctrl-c, shutting down");
                        break;
                    }
                }
                _ = poll.tick() => {
                    if term_flag.load(Ordering::Relaxed) {
                        info!("received SIGTERM, shutting down");
                        break;
                    }
                }
            }
        }
        let _ = shutdown_tx.send(());
    });

    Ok(shutdown_rx)
}
