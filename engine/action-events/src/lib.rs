//! Shared action event model and wire codec for the Trellis orchestrator
//!
//! Running workflow actions report progress as `ActionEvent` records. This
//! crate holds the record type itself plus the wire form both sides of the
//! callback speak: a JSON array with a fixed escape table and RFC 822
//! timestamps. The producer pipeline lives in `event-reporter`, the
//! listener side in `event-gateway` and `event-store`.

pub mod codec;
pub mod event;

pub use codec::{decode_batch, encode_batch, CodecError};
pub use event::{ActionEvent, EVENT_TYPE_HADOOP_JOB_ID, EVENT_TYPE_OTHER};
