//! Gateway error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid bind address: {0}")]
    InvalidAddress(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("engine rejected the batch: {0}")]
    Engine(#[from] event_store::StoreError),
}
