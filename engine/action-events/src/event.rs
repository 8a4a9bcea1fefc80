//! Action event record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default event category.
pub const EVENT_TYPE_OTHER: &str = "other";

/// Category for sub-job ids discovered in an action's log output.
pub const EVENT_TYPE_HADOOP_JOB_ID: &str = "hadoop-job-id";

/// A single progress event emitted by a running workflow action.
///
/// Every field is optional so a decoded record can represent explicit
/// absence. In particular a record that arrives without a timestamp keeps
/// `None`; the pipeline never substitutes the current time for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEvent {
    /// Identifier of the workflow action that emitted the event.
    #[serde(rename = "actionId")]
    pub action_id: Option<String>,

    /// Category label, one of the EVENT_TYPE_* values or a custom string.
    #[serde(rename = "type")]
    pub event_type: Option<String>,

    /// Free-text payload.
    pub message: Option<String>,

    /// Creation instant. Carried as epoch milliseconds in the compact
    /// binary form.
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ActionEvent {
    /// New event for the given action with the default category and the
    /// current time.
    pub fn for_action(action_id: impl Into<String>) -> Self {
        Self {
            action_id: Some(action_id.into()),
            event_type: Some(EVENT_TYPE_OTHER.to_string()),
            message: None,
            timestamp: Some(Utc::now()),
        }
    }

    /// Replace the category label.
    pub fn with_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Replace the message payload.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Compact binary form used when events ride inside engine-internal
    /// messages. Sub-millisecond precision is dropped.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Decode the compact binary form produced by `to_bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}
