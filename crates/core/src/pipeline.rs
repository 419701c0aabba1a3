//! Wire types shared by the REST client, the live connection and the views.
//!
//! Field names follow the backend's camelCase JSON. Event payloads (`data`) are
//! deliberately left as an untyped JSON object: the shape depends on the event
//! type and consumers treat every field as optional.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─── Enumerations ────────────────────────────────────────────────────────────

/// Workflow a pipeline runs. Unknown values decode into [`WorkflowType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WorkflowType {
    ResolveTask,
    CodeReview,
    SpecAnalysis,
    MultiRepo,
    Other(String),
}

impl WorkflowType {
    pub const ALL: [WorkflowType; 4] = [
        Self::ResolveTask,
        Self::CodeReview,
        Self::SpecAnalysis,
        Self::MultiRepo,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::ResolveTask => "resolve-task",
            Self::CodeReview => "code-review",
            Self::SpecAnalysis => "spec-analysis",
            Self::MultiRepo => "multi-repo",
            Self::Other(s) => s,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::ResolveTask => "Resolve Task",
            Self::CodeReview => "Code Review",
            Self::SpecAnalysis => "Spec Analysis",
            Self::MultiRepo => "Multi-Repo",
            Self::Other(s) => s,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::ResolveTask => "Full task resolution with code changes",
            Self::CodeReview => "Review existing code changes",
            Self::SpecAnalysis => "Analyze specifications only",
            Self::MultiRepo => "Coordinate changes across repos",
            Self::Other(_) => "",
        }
    }
}

impl From<String> for WorkflowType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "resolve-task" => Self::ResolveTask,
            "code-review" => Self::CodeReview,
            "spec-analysis" => Self::SpecAnalysis,
            "multi-repo" => Self::MultiRepo,
            _ => Self::Other(value),
        }
    }
}

impl From<WorkflowType> for String {
    fn from(value: WorkflowType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much detail the backend should emit. Only displayed by this library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerbosityLevel {
    Condensed,
    Normal,
    Debug,
}

impl VerbosityLevel {
    pub const ALL: [VerbosityLevel; 3] = [Self::Condensed, Self::Normal, Self::Debug];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Condensed => "Condensed",
            Self::Normal => "Normal",
            Self::Debug => "Debug",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    Opus,
    Sonnet,
    Haiku,
}

impl ModelType {
    pub const ALL: [ModelType; 3] = [Self::Haiku, Self::Sonnet, Self::Opus];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opus => "opus",
            Self::Sonnet => "sonnet",
            Self::Haiku => "haiku",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Opus => "Opus",
            Self::Sonnet => "Sonnet",
            Self::Haiku => "Haiku",
        }
    }
}

/// Lifecycle state of a pipeline run.
///
/// Unknown values sent by a newer backend decode into [`PipelineStatus::Other`]
/// instead of failing the whole payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PipelineStatus {
    Running,
    WaitingApproval,
    Completed,
    Failed,
    Other(String),
}

impl PipelineStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "running",
            Self::WaitingApproval => "waiting_approval",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Other(s) => s,
        }
    }

    /// Running or waiting for approval: the states that still change server-side.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::WaitingApproval)
    }
}

impl From<String> for PipelineStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "running" => Self::Running,
            "waiting_approval" => Self::WaitingApproval,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for PipelineStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<PipelineStatus> for String {
    fn from(value: PipelineStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which store the session list is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSource {
    Local,
    Merged,
}

impl SessionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Merged => "merged",
        }
    }
}

// ─── Lenient fields ──────────────────────────────────────────────────────────

/// Decoders for fields the backend does not type strictly. A value of the
/// wrong shape decodes as absent instead of failing the enclosing payload.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::{Map, Value};

    pub fn object<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }

    pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(s),
            _ => Ok(String::new()),
        }
    }

    /// Non-negative whole number; fractions are truncated.
    pub fn count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(value.as_u64().or_else(|| {
            value
                .as_f64()
                .filter(|n| n.is_finite() && *n >= 0.0)
                .map(|n| n as u64)
        }))
    }

    pub fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(value
            .as_i64()
            .or_else(|| value.as_f64().filter(|n| n.is_finite()).map(|n| n as i64)))
    }

    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Value::deserialize(deserializer)?.as_f64())
    }
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// One timestamped record emitted during a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineEvent {
    #[serde(rename = "type", default, deserialize_with = "lenient::string")]
    pub event_type: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub session_id: String,
    #[serde(
        default,
        deserialize_with = "lenient::integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub turn_number: Option<i64>,
    /// Older backends send `turn` instead of `turnNumber`.
    #[serde(
        default,
        deserialize_with = "lenient::integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub turn: Option<i64>,
    /// `null` or a non-object payload decodes as empty.
    #[serde(default, deserialize_with = "lenient::object")]
    pub data: Map<String, Value>,
}

impl PipelineEvent {
    pub fn new(event_type: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: String::new(),
            session_id: String::new(),
            turn_number: None,
            turn: None,
            data,
        }
    }

    /// Turn number under either spelling.
    pub fn display_turn(&self) -> Option<i64> {
        self.turn_number.or(self.turn)
    }

    /// Top-level `data` field when it is a non-empty string.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Top-level `data` field when it is an object.
    pub fn data_object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.data.get(key).and_then(Value::as_object)
    }
}

// ─── Requests ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPipelineRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub workflow_type: WorkflowType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_approval: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_create_pr: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_review: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_budget_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<VerbosityLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_overrides: Option<HashMap<String, AgentOverride>>,
}

impl StartPipelineRequest {
    pub fn for_task(task_id: impl Into<String>, workflow_type: WorkflowType) -> Self {
        Self {
            task_id: Some(task_id.into()),
            prompt: None,
            workflow_type,
            skip_approval: None,
            dry_run: None,
            auto_create_pr: None,
            auto_review: None,
            model: None,
            max_budget_usd: None,
            verbosity: None,
            agent_overrides: None,
        }
    }
}

/// Body of the approve and resume endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Query of `GET /api/sessions`. Zero `limit`/`offset` are omitted on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListSessionsParams {
    pub status: Option<PipelineStatus>,
    pub source: Option<SessionSource>,
    pub limit: u32,
    pub offset: u32,
}

impl ListSessionsParams {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = &self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(source) = self.source {
            pairs.push(("source", source.as_str().to_string()));
        }
        if self.limit > 0 {
            pairs.push(("limit", self.limit.to_string()));
        }
        if self.offset > 0 {
            pairs.push(("offset", self.offset.to_string()));
        }
        pairs
    }
}

// ─── Sessions ────────────────────────────────────────────────────────────────

/// Session list entry, owned by the backend and identified by `pipeline_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub pipeline_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub status: PipelineStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_type: Option<WorkflowType>,
    #[serde(
        default,
        deserialize_with = "lenient::count",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub cost: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::count",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_url: Option<String>,
}

impl Session {
    /// Heading shown for the session: task title, else task id, else pipeline id.
    pub fn display_title(&self) -> &str {
        self.task_title
            .as_deref()
            .or(self.task_id.as_deref())
            .unwrap_or(&self.pipeline_id)
    }

    /// Creation time in epoch milliseconds; absent or unparseable → 0.
    pub fn created_at_millis(&self) -> i64 {
        self.created_at
            .as_deref()
            .and_then(crate::format::parse_timestamp)
            .map(|dt| dt.timestamp_millis())
            .unwrap_or(0)
    }
}

/// Sort sessions newest first by `createdAt`.
pub fn sort_newest_first(sessions: &mut [Session]) {
    sessions.sort_by_key(|s| std::cmp::Reverse(s.created_at_millis()));
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: Session,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<StartPipelineRequest>,
    #[serde(default)]
    pub events: Vec<PipelineEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<PipelineResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "lenient::count",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_changes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_modified: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetrics {
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_cost_usd: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::count",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_ms: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient::count",
        skip_serializing_if = "Option::is_none"
    )]
    pub num_turns: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<RunMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

// ─── Responses ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPipelineResponse {
    pub pipeline_id: String,
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub ws_url: String,
}

/// Raw event log of a running pipeline (`GET /api/pipeline/:id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSnapshot {
    pub pipeline_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub events: Vec<PipelineEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovePipelineResponse {
    pub pipeline_id: String,
    pub status: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePipeline {
    pub pipeline_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub event_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivePipelinesResponse {
    #[serde(default)]
    pub pipelines: Vec<ActivePipeline>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListSessionsResponse {
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumableSessionsResponse {
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSessionResponse {
    pub pipeline_id: String,
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub ws_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSessionResponse {
    #[serde(default)]
    pub message: String,
    pub pipeline_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub active_pipelines: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_provider: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_decodes_camel_case_and_missing_data() {
        let event: PipelineEvent = serde_json::from_value(json!({
            "type": "started",
            "timestamp": "2026-01-01T00:00:00Z",
            "sessionId": "s1",
            "turn": 3
        }))
        .unwrap();
        assert_eq!(event.event_type, "started");
        assert_eq!(event.session_id, "s1");
        assert!(event.data.is_empty());
        assert_eq!(event.display_turn(), Some(3));
    }

    #[test]
    fn turn_number_wins_over_turn() {
        let mut event = PipelineEvent::new("x", Map::new());
        event.turn = Some(1);
        event.turn_number = Some(2);
        assert_eq!(event.display_turn(), Some(2));
    }

    #[test]
    fn unknown_status_is_preserved() {
        let session: Session = serde_json::from_value(json!({
            "pipelineId": "p1",
            "status": "paused"
        }))
        .unwrap();
        assert_eq!(session.status, PipelineStatus::Other("paused".into()));
        assert!(!session.status.is_active());
        assert_eq!(serde_json::to_value(&session.status).unwrap(), json!("paused"));
    }

    #[test]
    fn waiting_approval_is_active() {
        assert!(PipelineStatus::from("waiting_approval").is_active());
        assert!(PipelineStatus::Running.is_active());
        assert!(!PipelineStatus::Completed.is_active());
        assert!(!PipelineStatus::Failed.is_active());
    }

    #[test]
    fn session_detail_flattens_session_fields() {
        let detail: SessionDetail = serde_json::from_value(json!({
            "pipelineId": "p1",
            "status": "completed",
            "taskTitle": "Fix login",
            "workflowType": "code-review",
            "events": [{ "type": "started", "timestamp": "", "sessionId": "s", "data": {} }]
        }))
        .unwrap();
        assert_eq!(detail.session.display_title(), "Fix login");
        assert_eq!(detail.session.workflow_type, Some(WorkflowType::CodeReview));
        assert_eq!(detail.events.len(), 1);
    }

    #[test]
    fn display_title_falls_back_to_ids() {
        let mut session: Session = serde_json::from_value(json!({
            "pipelineId": "p1",
            "status": "running",
            "taskId": "t1"
        }))
        .unwrap();
        assert_eq!(session.display_title(), "t1");
        session.task_id = None;
        assert_eq!(session.display_title(), "p1");
    }

    #[test]
    fn sessions_sort_newest_first_with_missing_dates_last() {
        let mut sessions: Vec<Session> = serde_json::from_value(json!([
            { "pipelineId": "old", "status": "completed", "createdAt": "2026-01-01T00:00:00Z" },
            { "pipelineId": "none", "status": "completed" },
            { "pipelineId": "new", "status": "completed", "createdAt": "2026-02-01T00:00:00Z" }
        ]))
        .unwrap();
        sort_newest_first(&mut sessions);
        let ids: Vec<_> = sessions.iter().map(|s| s.pipeline_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "none"]);
    }

    #[test]
    fn list_params_skip_zero_and_absent_values() {
        let params = ListSessionsParams {
            status: Some(PipelineStatus::Failed),
            source: Some(SessionSource::Merged),
            limit: 20,
            offset: 0,
        };
        assert_eq!(
            params.query_pairs(),
            vec![
                ("status", "failed".to_string()),
                ("source", "merged".to_string()),
                ("limit", "20".to_string()),
            ]
        );
        assert!(ListSessionsParams::default().query_pairs().is_empty());
    }

    #[test]
    fn loosely_typed_session_fields_degrade() {
        let response: ListSessionsResponse = serde_json::from_value(json!({
            "sessions": [
                { "pipelineId": "p1", "status": "completed", "duration": 1234.5,
                  "eventCount": 12.0, "cost": "n/a" },
                { "pipelineId": "p2", "status": "running", "workflowType": "hotfix",
                  "duration": -3 }
            ],
            "total": 2
        }))
        .unwrap();
        let first = &response.sessions[0];
        assert_eq!(first.duration, Some(1234));
        assert_eq!(first.event_count, Some(12));
        assert_eq!(first.cost, None);

        let second = &response.sessions[1];
        assert_eq!(second.duration, None);
        assert_eq!(
            second.workflow_type,
            Some(WorkflowType::Other("hotfix".into()))
        );
        assert_eq!(second.workflow_type.as_ref().map(WorkflowType::label), Some("hotfix"));
        assert_eq!(
            serde_json::to_value(&second.workflow_type).unwrap(),
            json!("hotfix")
        );
    }

    #[test]
    fn detail_keeps_events_with_null_or_odd_payloads() {
        let detail: SessionDetail = serde_json::from_value(json!({
            "pipelineId": "p1",
            "status": "completed",
            "duration": 90000.7,
            "events": [
                { "type": "started", "timestamp": "t", "data": null },
                { "type": "tool_start", "timestamp": null, "sessionId": null,
                  "turnNumber": 2.0, "data": "not an object" },
                { "timestamp": "t", "data": { "message": "untyped" } }
            ],
            "result": { "success": true, "metrics": { "durationMs": 5.5, "numTurns": 4.0 } }
        }))
        .unwrap();
        assert_eq!(detail.session.duration, Some(90000));
        assert_eq!(detail.events.len(), 3);
        assert!(detail.events[0].data.is_empty());
        assert!(detail.events[1].data.is_empty());
        assert_eq!(detail.events[1].timestamp, "");
        assert_eq!(detail.events[1].display_turn(), Some(2));
        assert_eq!(detail.events[2].event_type, "");
        let metrics = detail.result.unwrap().metrics.unwrap();
        assert_eq!(metrics.duration_ms, Some(5));
        assert_eq!(metrics.num_turns, Some(4));
    }

    #[test]
    fn start_request_serializes_camel_case_without_nones() {
        let mut req = StartPipelineRequest::for_task("t1", WorkflowType::ResolveTask);
        req.dry_run = Some(true);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({ "taskId": "t1", "workflowType": "resolve-task", "dryRun": true })
        );
    }
}
