//! Builders for tests in this and downstream crates.

use serde_json::{Map, Value};

use crate::pipeline::{PipelineEvent, PipelineStatus, Session, SessionDetail};

/// Event of `event_type` whose payload is `data` (non-objects become an empty payload).
pub fn event(event_type: &str, data: Value) -> PipelineEvent {
    let data = match data {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let mut event = PipelineEvent::new(event_type, data);
    event.timestamp = "2026-01-05T14:15:09Z".to_string();
    event.session_id = "sess-1".to_string();
    event
}

pub fn session(pipeline_id: &str, status: PipelineStatus, created_at: &str) -> Session {
    serde_json::from_value(serde_json::json!({
        "pipelineId": pipeline_id,
        "status": status,
        "createdAt": created_at,
    }))
    .expect("session fixture")
}

pub fn session_detail(pipeline_id: &str, status: PipelineStatus, events: Vec<PipelineEvent>) -> SessionDetail {
    let mut detail: SessionDetail = serde_json::from_value(serde_json::json!({
        "pipelineId": pipeline_id,
        "status": status,
    }))
    .expect("detail fixture");
    detail.events = events;
    detail
}
