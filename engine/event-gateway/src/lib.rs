//! HTTP ingestion endpoint for Trellis action events
//!
//! Producers POST wire batches to `/callback/events`; the endpoint
//! decodes them and hands each non-empty batch to the orchestrator
//! engine in exactly one call. Persistence happens behind the engine's
//! command queue, never inline in the request handler.

pub mod config;
pub mod engine;
pub mod error;
pub mod routes;

pub use config::ListenerConfig;
pub use engine::{CommandEngine, OrchestratorEngine};
pub use error::GatewayError;
pub use routes::{bind, create_routes};
