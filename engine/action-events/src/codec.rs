//! Wire codec for action event batches
//!
//! The wire form is a JSON array; each record is an object with the fields
//! `type`, `actionId`, `timestamp` and `message`, in that order. String
//! values pass through a fixed escape table and nothing else, so non-ASCII
//! text travels unescaped. Timestamps use the RFC 822 layout
//! `Wed, 01 Jan 2020 00:00:00 GMT`, always rendered in UTC.
//!
//! The encoder is hand-rolled because the escape table mandates `\/`;
//! the decoder rides on serde_json and is deliberately tolerant: absent
//! or `null` fields stay unset, only structurally malformed input errors.

use crate::event::ActionEvent;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// RFC 822 timestamp layout used on the wire.
pub const TIMESTAMP_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a json array of event objects")]
    NotAnArray,

    #[error("event {index}: expected a json object")]
    NotAnObject { index: usize },

    #[error("event {index}: field {field} must be a string")]
    InvalidField { index: usize, field: &'static str },
}

/// Render a timestamp in the wire layout.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a wire timestamp. `None` when the text is not a valid RFC 822
/// date; callers treat that the same as an absent field.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(text).ok().map(|parsed| parsed.with_timezone(&Utc))
}

/// Encode a batch of events as one wire JSON array.
pub fn encode_batch(events: &[ActionEvent]) -> String {
    let mut out = String::with_capacity(events.len() * 96 + 2);
    out.push('[');
    for (i, event) in events.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        encode_event(&mut out, event);
    }
    out.push(']');
    out
}

fn encode_event(out: &mut String, event: &ActionEvent) {
    out.push('{');
    push_field(out, "type", event.event_type.as_deref());
    out.push(',');
    push_field(out, "actionId", event.action_id.as_deref());
    out.push(',');
    let rendered = event.timestamp.as_ref().map(format_timestamp);
    push_field(out, "timestamp", rendered.as_deref());
    out.push(',');
    push_field(out, "message", event.message.as_deref());
    out.push('}');
}

fn push_field(out: &mut String, name: &str, value: Option<&str>) {
    out.push('"');
    out.push_str(name);
    out.push_str("\":");
    match value {
        Some(value) => {
            out.push('"');
            escape_into(out, value);
            out.push('"');
        }
        None => out.push_str("null"),
    }
}

/// The fixed escape table. Everything outside it is emitted untouched.
fn escape_into(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '/' => out.push_str("\\/"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
}

/// Decode a wire batch.
pub fn decode_batch(input: &str) -> Result<Vec<ActionEvent>, CodecError> {
    let value: Value = serde_json::from_str(input)?;
    let items = value.as_array().ok_or(CodecError::NotAnArray)?;
    items.iter().enumerate().map(|(index, item)| decode_event(index, item)).collect()
}

fn decode_event(index: usize, value: &Value) -> Result<ActionEvent, CodecError> {
    let object = value.as_object().ok_or(CodecError::NotAnObject { index })?;

    // An unparseable timestamp string is treated like an absent one.
    let timestamp =
        string_field(object, index, "timestamp")?.and_then(|text| parse_timestamp(&text));

    Ok(ActionEvent {
        action_id: string_field(object, index, "actionId")?,
        event_type: string_field(object, index, "type")?,
        message: string_field(object, index, "message")?,
        timestamp,
    })
}

fn string_field(
    object: &serde_json::Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<Option<String>, CodecError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(_) => Err(CodecError::InvalidField { index, field }),
    }
}
