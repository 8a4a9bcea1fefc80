//! Trellis event listener service
//!
//! Receives action event batches from running workflow actions and
//! persists them through the command queue.

use tracing::info;
use trellis_event_service::config::load_config;
use trellis_event_service::logging::initialize_logging;
use trellis_event_service::service::ServiceState;
use trellis_event_service::signals::setup_signal_handlers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            std::process::exit(1);
        }
    };

    initialize_logging(&config.logging)?;
    info!(service = %config.service.name, "starting the Trellis event service");

    let state = ServiceState::new(config).await?;
    let shutdown_rx = setup_signal_handlers()?;

    state.start_listener().await?;

    let _ = shutdown_rx.await;
    state.shutdown().await;

    info!("shutdown complete");
    Ok(())
}
