//! Server-side persistence for Trellis action events
//!
//! The listener decodes event batches off the wire and submits them here
//! as commands; a single worker executes them against the configured
//! `EventStore` backend. The in-memory backend serves tests and
//! single-node setups, the Postgres backend is the durable one.

pub mod command;
pub mod config;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use command::{
    Command, CommandQueue, CommandRunner, PersistEventsCommand, PERSIST_EVENTS_COMMAND,
};
pub use config::{StoreBackend, StoreConfig};
pub use error::{Result, StoreError};
pub use memory::MemoryEventStore;
pub use postgres::PostgresEventStore;
pub use store::EventStore;
