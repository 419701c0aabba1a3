//! Inbound WebSocket frames.
//!
//! A frame is a JSON object that may carry any combination of three shapes:
//! `{ "event": PipelineEvent }`, `{ "type": "connected", "events": [...] }` and
//! `{ "status": "..." }`. Each shape is recognised independently, and a part
//! that does not decode is skipped without losing the rest of the frame.

use serde_json::Value;
use thiserror::Error;

use crate::pipeline::PipelineEvent;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundFrame {
    /// A single new event to append.
    pub event: Option<PipelineEvent>,
    /// Backlog sent on (re)connect, replacing the accumulated list.
    pub backlog: Option<Vec<PipelineEvent>>,
    /// Pipeline status string, forwarded without touching the event list.
    pub status: Option<String>,
    /// Parts that were present but did not decode, as `field: reason`.
    pub skipped: Vec<String>,
}

impl InboundFrame {
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(mut obj) = value else {
            return Ok(Self::default());
        };
        let mut skipped = Vec::new();

        let event = match obj.remove("event") {
            Some(Value::Null) | None => None,
            Some(raw) => match serde_json::from_value(raw) {
                Ok(event) => Some(event),
                Err(e) => {
                    skipped.push(format!("event: {e}"));
                    None
                }
            },
        };

        let is_connected = obj.get("type").and_then(Value::as_str) == Some("connected");
        let backlog = match obj.remove("events") {
            Some(Value::Array(items)) if is_connected => {
                let mut events = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    match serde_json::from_value(item) {
                        Ok(event) => events.push(event),
                        Err(e) => skipped.push(format!("events[{i}]: {e}")),
                    }
                }
                Some(events)
            }
            _ => None,
        };

        let status = obj
            .get("status")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self {
            event,
            backlog,
            status,
            skipped,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.event.is_none() && self.backlog.is_none() && self.status.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_frame() {
        let frame = InboundFrame::parse(
            r#"{"event":{"type":"tool_start","timestamp":"t","sessionId":"s","data":{"toolName":"Read"}}}"#,
        )
        .unwrap();
        let event = frame.event.unwrap();
        assert_eq!(event.event_type, "tool_start");
        assert_eq!(event.data_str("toolName"), Some("Read"));
        assert!(frame.backlog.is_none());
        assert!(frame.status.is_none());
    }

    #[test]
    fn connected_backlog_frame() {
        let frame = InboundFrame::parse(
            r#"{"type":"connected","events":[{"type":"started"},{"type":"init","data":{}}]}"#,
        )
        .unwrap();
        let backlog = frame.backlog.unwrap();
        assert_eq!(backlog.len(), 2);
        assert_eq!(backlog[1].event_type, "init");
    }

    #[test]
    fn events_without_connected_type_are_ignored() {
        let frame = InboundFrame::parse(r#"{"events":[{"type":"started"}]}"#).unwrap();
        assert!(frame.is_empty());
    }

    #[test]
    fn shapes_coexist() {
        let frame = InboundFrame::parse(
            r#"{"type":"connected","events":[],"status":"running","event":{"type":"approved"}}"#,
        )
        .unwrap();
        assert_eq!(frame.backlog.as_deref().map(<[_]>::len), Some(0));
        assert_eq!(frame.status.as_deref(), Some("running"));
        assert_eq!(frame.event.unwrap().event_type, "approved");
    }

    #[test]
    fn malformed_json_errors() {
        assert!(matches!(
            InboundFrame::parse("{not json"),
            Err(FrameError::Json(_))
        ));
        assert!(InboundFrame::parse("42").unwrap().is_empty());
    }

    #[test]
    fn undecodable_event_keeps_the_rest_of_the_frame() {
        let frame = InboundFrame::parse(r#"{"event":42,"status":"running"}"#).unwrap();
        assert!(frame.event.is_none());
        assert_eq!(frame.status.as_deref(), Some("running"));
        assert_eq!(frame.skipped.len(), 1);
        assert!(frame.skipped[0].starts_with("event: "));
    }

    #[test]
    fn undecodable_backlog_entries_are_skipped_individually() {
        let frame = InboundFrame::parse(
            r#"{"type":"connected","events":[{"type":"started","data":null},"junk",{"type":"init"}]}"#,
        )
        .unwrap();
        let backlog = frame.backlog.unwrap();
        let kinds: Vec<_> = backlog.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(kinds, ["started", "init"]);
        assert!(backlog[0].data.is_empty());
        assert_eq!(frame.skipped.len(), 1);
        assert!(frame.skipped[0].starts_with("events[1]: "));
    }
}
