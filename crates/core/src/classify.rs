//! Event → presentation mapping.
//!
//! Every event type the backend emits has an entry in a static table that
//! supplies a glyph, a color class, a title function and an optional subtitle
//! function. Payloads are schema-less, so each extractor treats every field as
//! optional and wrong-typed values as absent; classification never fails.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::config::UrlFn;
use crate::links::{Link, extract_links};
use crate::pipeline::PipelineEvent;

/// Visual tone of a timeline row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorClass {
    Success,
    Error,
    Warning,
    Muted,
    Primary,
    Purple,
    Tool,
    Orange,
}

impl ColorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Muted => "muted",
            Self::Primary => "primary",
            Self::Purple => "purple",
            Self::Tool => "tool",
            Self::Orange => "orange",
        }
    }
}

/// Derived, never persisted. Recomputed from the event on every render.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRenderModel {
    pub icon: &'static str,
    pub color_class: ColorClass,
    pub title: String,
    pub subtitle: Option<String>,
    pub is_minor: bool,
    pub links: Vec<Link>,
}

type TitleFn = fn(&PipelineEvent) -> String;
type SubtitleFn = fn(&PipelineEvent) -> Option<String>;

#[derive(Clone, Copy)]
struct EventSpec {
    icon: &'static str,
    color: ColorClass,
    title: TitleFn,
    subtitle: Option<SubtitleFn>,
    minor: bool,
}

const fn spec(icon: &'static str, color: ColorClass, title: TitleFn) -> EventSpec {
    EventSpec {
        icon,
        color,
        title,
        subtitle: None,
        minor: false,
    }
}

impl EventSpec {
    const fn sub(mut self, subtitle: SubtitleFn) -> Self {
        self.subtitle = Some(subtitle);
        self
    }

    const fn minor(mut self) -> Self {
        self.minor = true;
        self
    }
}

const FALLBACK_ICON: &str = "•";

static EVENT_TABLE: LazyLock<HashMap<&'static str, EventSpec>> = LazyLock::new(|| {
    use ColorClass::*;

    let tool_call = spec("🔧", Tool, tool_title).sub(tool_subtitle);
    let mcp_call = spec("🔌", Orange, mcp_title).sub(mcp_subtitle);
    let agent_start = spec("🤖", Purple, |e| {
        e.data_str("agentType").unwrap_or("Agent").to_string()
    })
    .sub(|e| text_field(&e.data, "agentDescription"));
    let agent_complete = spec("🤖", Success, |e| {
        format!("{} Complete", e.data_str("agentType").unwrap_or("Agent"))
    });

    HashMap::from([
        // Lifecycle
        (
            "started",
            spec("▶", Success, |_| "Pipeline Started".into())
                .sub(|e| display_field(&e.data, "workflowType")),
        ),
        (
            "completed",
            spec("✓", Success, |_| "Pipeline Completed".into()).sub(|e| {
                number_field(&e.data, "cost")
                    .filter(|c| *c != 0.0)
                    .map(|c| format!("${c:.4}"))
            }),
        ),
        (
            "failed",
            spec("✕", Error, |_| "Pipeline Failed".into()).sub(|e| text_field(&e.data, "error")),
        ),
        (
            "init",
            spec("⚙", Muted, |_| "Session Initialized".into()).sub(init_subtitle),
        ),
        (
            "waiting_approval",
            spec("⏸", Warning, |_| "Waiting for Approval".into()),
        ),
        ("approved", spec("✓", Success, |_| "Plan Approved".into())),
        ("rejected", spec("✕", Error, |_| "Plan Rejected".into())),
        // Workflow
        (
            "prefetch_start",
            spec("⏳", Muted, |_| "Prefetching task...".into()).minor(),
        ),
        (
            "prefetch_complete",
            spec("✓", Muted, |_| "Task prefetched".into()).minor(),
        ),
        (
            "task_fetched",
            spec("📋", Primary, |e| {
                text_field(&e.data, "title").unwrap_or_else(|| "Task Fetched".into())
            })
            .sub(|e| text_field(&e.data, "taskId")),
        ),
        ("plan_generated", spec("📝", Primary, |_| "Plan Generated".into())),
        (
            "execution_started",
            spec("🚀", Primary, |_| "Execution Started".into()),
        ),
        ("repos_selected", spec("📂", Primary, repos_title)),
        (
            "evaluation_complete",
            spec("✓", Success, |e| {
                if truthy(e.data.get("requiresCode")) {
                    "Task requires code changes".into()
                } else {
                    "Task evaluated".into()
                }
            }),
        ),
        // Agents
        ("agent_start", agent_start),
        ("agent_started", agent_start),
        ("agent_complete", agent_complete),
        ("agent_completed", agent_complete),
        // Tools
        ("tool_call", tool_call),
        ("tool_start", tool_call),
        (
            "tool_complete",
            spec("✓", Success, |e| {
                format!("{} complete", e.data_str("toolName").unwrap_or("Tool"))
            })
            .minor(),
        ),
        // MCP
        ("mcp_call", mcp_call),
        ("mcp_start", mcp_call),
        (
            "mcp_complete",
            spec("✓", Success, |e| {
                format!("{} complete", e.data_str("mcpTool").unwrap_or("MCP"))
            })
            .minor(),
        ),
        // Messages
        (
            "assistant_message",
            spec("💬", Primary, |_| "Claude".into()).sub(|e| {
                let text = text_field(&e.data, "preview").or_else(|| text_field(&e.data, "text"));
                clip(text.as_deref(), 100)
            }),
        ),
        // Debug
        (
            "sdk_message",
            spec("·", Muted, sdk_message_title)
                .sub(sdk_message_subtitle)
                .minor(),
        ),
        (
            "sdk_thinking",
            spec("🧠", Muted, |_| "Thinking".into())
                .sub(|e| clip(e.data_str("thinking"), 80))
                .minor(),
        ),
        (
            "timing",
            spec("⏱", Muted, |e| {
                display_field(&e.data, "event").unwrap_or_else(|| "Event".into())
            })
            .sub(|e| display_field(&e.data, "durationMs").map(|ms| format!("{ms}ms")))
            .minor(),
        ),
        (
            "token_usage",
            spec("📊", Muted, |_| "Token Usage".into())
                .sub(|e| {
                    let input = display_field(&e.data, "inputTokens").unwrap_or_else(|| "0".into());
                    let output =
                        display_field(&e.data, "outputTokens").unwrap_or_else(|| "0".into());
                    Some(format!("{input} in / {output} out"))
                })
                .minor(),
        ),
        (
            "tool_input_full",
            spec("📥", Muted, tool_input_full_title)
                .sub(tool_input_full_subtitle)
                .minor(),
        ),
        (
            "tool_output_full",
            spec("📤", Muted, tool_output_title)
                .sub(tool_output_subtitle)
                .minor(),
        ),
        // Review / audit
        (
            "code_review_result",
            spec("📝", Primary, |e| {
                format!(
                    "Code Review: {}",
                    display_field(&e.data, "verdict").unwrap_or_else(|| "Complete".into())
                )
            }),
        ),
        (
            "audit_generated",
            spec("📊", Success, |_| "Audit Report Generated".into()).sub(audit_subtitle),
        ),
        // Errors
        (
            "error",
            spec("⚠", Error, |_| "Error".into())
                .sub(|e| text_field(&e.data, "error").or_else(|| text_field(&e.data, "message"))),
        ),
        (
            "budget_exceeded",
            spec("💰", Error, |_| "Budget Exceeded".into()),
        ),
    ])
});

// ─── Public API ──────────────────────────────────────────────────────────────

/// Classify an event without link extraction.
pub fn classify(event: &PipelineEvent) -> EventRenderModel {
    match EVENT_TABLE.get(event.event_type.as_str()) {
        Some(spec) => EventRenderModel {
            icon: spec.icon,
            color_class: spec.color,
            title: (spec.title)(event),
            subtitle: spec
                .subtitle
                .and_then(|f| f(event))
                .filter(|s| !s.is_empty()),
            is_minor: spec.minor,
            links: Vec::new(),
        },
        None => EventRenderModel {
            icon: FALLBACK_ICON,
            color_class: ColorClass::Muted,
            title: event.event_type.replace('_', " "),
            subtitle: None,
            is_minor: false,
            links: Vec::new(),
        },
    }
}

/// Classify an event and attach the navigable links found in its payload.
pub fn classify_event(event: &PipelineEvent, task_url: Option<&UrlFn>) -> EventRenderModel {
    let mut model = classify(event);
    model.links = extract_links(event, task_url);
    model
}

/// True iff the event's table entry is flagged minor. Unknown types are not minor.
pub fn is_minor_event(event: &PipelineEvent) -> bool {
    EVENT_TABLE
        .get(event.event_type.as_str())
        .is_some_and(|spec| spec.minor)
}

/// The single unconditional suppression rule: per-turn timing markers.
pub fn should_hide_event(event: &PipelineEvent) -> bool {
    event.event_type == "timing" && event.data_str("event") == Some("turn_complete")
}

// ─── Field access ────────────────────────────────────────────────────────────

/// Non-empty string field.
pub(crate) fn text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    str_field(map, key).map(str::to_string)
}

pub(crate) fn str_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn number_field(map: &Map<String, Value>, key: &str) -> Option<f64> {
    map.get(key).and_then(Value::as_f64)
}

/// Strings and scalars rendered as text; containers and null are absent.
fn display_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Summary-row clipping: first `max` characters followed by `...`.
fn clip(text: Option<&str>, max: usize) -> Option<String> {
    let text = text.filter(|t| !t.is_empty())?;
    if text.chars().count() > max {
        let mut out: String = text.chars().take(max).collect();
        out.push_str("...");
        Some(out)
    } else {
        Some(text.to_string())
    }
}

fn clip_str(text: &str, max: usize) -> String {
    clip(Some(text), max).unwrap_or_default()
}

// ─── Paths ───────────────────────────────────────────────────────────────────

/// Last `/`-separated segment of a path.
pub fn file_name(path: &str) -> &str {
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name,
        _ => path,
    }
}

/// Paths with more than three segments collapse to `.../` + the last three.
pub fn file_path(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() <= 3 {
        return path.to_string();
    }
    format!(".../{}", parts[parts.len() - 3..].join("/"))
}

// ─── Lifecycle / workflow extractors ─────────────────────────────────────────

fn init_subtitle(e: &PipelineEvent) -> Option<String> {
    let model = display_field(&e.data, "model");
    let tools = match e.data.get("tools") {
        Some(Value::Array(items)) => Some(items.len().to_string()),
        _ => display_field(&e.data, "tools"),
    };
    if model.is_none() && tools.is_none() {
        return None;
    }
    Some(format!(
        "{}, {} tools",
        model.as_deref().unwrap_or("?"),
        tools.as_deref().unwrap_or("?")
    ))
}

fn repos_title(e: &PipelineEvent) -> String {
    let repos: Vec<&str> = e
        .data
        .get("repos")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if repos.is_empty() {
        "Repositories Selected".to_string()
    } else {
        format!("Selected: {}", repos.join(", "))
    }
}

fn audit_subtitle(e: &PipelineEvent) -> Option<String> {
    let outcome = str_field(&e.data, "outcome")?;
    Some(match str_field(&e.data, "taskTitle") {
        Some(title) => format!("{outcome} - {title}"),
        None => outcome.to_string(),
    })
}

// ─── Tool invocations ────────────────────────────────────────────────────────

fn tool_input(e: &PipelineEvent) -> Option<&Map<String, Value>> {
    e.data_object("toolInput")
}

fn tool_name(e: &PipelineEvent) -> Option<&str> {
    str_field(&e.data, "toolName").or_else(|| str_field(&e.data, "name"))
}

fn tool_title(e: &PipelineEvent) -> String {
    let name = tool_name(e).unwrap_or("Tool");
    let input = tool_input(e);
    let field = |key: &str| input.and_then(|i| str_field(i, key));

    match name {
        "Bash" => {
            if let Some(desc) = field("description") {
                return desc.to_string();
            }
        }
        "Read" | "Write" | "Edit" => {
            if let Some(path) = field("file_path") {
                return format!("{name} {}", file_name(path));
            }
        }
        "Grep" => {
            if let Some(pattern) = field("pattern") {
                return format!("Search: {pattern}");
            }
        }
        "Glob" => {
            if let Some(pattern) = field("pattern") {
                return format!("Find: {pattern}");
            }
        }
        _ => {}
    }
    name.to_string()
}

fn tool_subtitle(e: &PipelineEvent) -> Option<String> {
    let name = tool_name(e)?;
    let input = tool_input(e)?;
    match name {
        "Read" | "Write" | "Edit" => str_field(input, "file_path").map(file_path),
        "Grep" | "Glob" => text_field(input, "path"),
        "Bash" => clip(str_field(input, "command"), 60),
        _ => None,
    }
}

fn mcp_title(e: &PipelineEvent) -> String {
    let tool = str_field(&e.data, "mcpTool")
        .or_else(|| str_field(&e.data, "toolName"))
        .unwrap_or("MCP");
    let has_task = tool_input(e).is_some_and(|i| truthy(i.get("taskId")));

    if tool.contains("view_task") && has_task {
        return "View Task".to_string();
    }
    if tool.contains("add_comment") {
        return "Add Comment".to_string();
    }
    if tool.contains("update_task") {
        return "Update Task".to_string();
    }
    if tool.contains("create_pull_request") {
        return "Create PR".to_string();
    }
    tool.replacen("shapeup_", "", 1)
        .replacen("admin_", "", 1)
        .replace('_', " ")
}

fn mcp_subtitle(e: &PipelineEvent) -> Option<String> {
    if let Some(input) = tool_input(e) {
        if truthy(input.get("taskId")) {
            return display_field(input, "taskId");
        }
        if let Some(repo) = text_field(input, "repoName") {
            return Some(repo);
        }
    }
    str_field(&e.data, "mcpServer").map(|server| format!("via {server}"))
}

fn tool_input_full_title(e: &PipelineEvent) -> String {
    let tool = str_field(&e.data, "toolName").unwrap_or("Tool");
    let input = e.data_object("input");
    let field = |key: &str| input.and_then(|i| str_field(i, key));

    if let Some(desc) = field("description") {
        return desc.to_string();
    }
    match tool {
        "Read" | "Write" | "Edit" => {
            if let Some(path) = field("file_path") {
                return format!("{tool} {}", file_name(path));
            }
        }
        "Grep" => {
            if let Some(pattern) = field("pattern") {
                return format!("Search: {}", clip_str(pattern, 40));
            }
        }
        "Glob" => {
            if let Some(pattern) = field("pattern") {
                return format!("Find: {}", clip_str(pattern, 40));
            }
        }
        _ => {}
    }
    format!("Input: {tool}")
}

fn tool_input_full_subtitle(e: &PipelineEvent) -> Option<String> {
    let tool = str_field(&e.data, "toolName")?;
    let input = e.data_object("input")?;
    match tool {
        "Read" | "Write" | "Edit" => str_field(input, "file_path").map(file_path),
        "Bash" => clip(str_field(input, "command"), 50),
        "Grep" | "Glob" => text_field(input, "path"),
        _ => None,
    }
}

/// `mcp__server__tool_name` → `tool name`.
fn mcp_tool_label(tool: &str) -> String {
    match tool.rsplit("__").next() {
        Some(last) if !last.is_empty() => last.replace('_', " "),
        _ => tool.to_string(),
    }
}

fn tool_output_title(e: &PipelineEvent) -> String {
    let tool = str_field(&e.data, "toolName").filter(|t| *t != "unknown");
    let output = e.data_str("output");

    let Some(tool) = tool else {
        if let Some(output) = output {
            if output.contains("lines read from") {
                return "✓ File read".into();
            }
            if output.contains("Successfully wrote") {
                return "✓ File written".into();
            }
            if output.contains("Successfully edited") {
                return "✓ File edited".into();
            }
            if output.contains("matches found") || output.contains("No matches") {
                return "✓ Search complete".into();
            }
            if output.contains("files matched") {
                return "✓ Files found".into();
            }
            if output.contains("exit code") || output.contains("stdout:") {
                return "✓ Command executed".into();
            }
        }
        return "✓ Tool complete".into();
    };

    match tool {
        "Read" => "✓ File read".into(),
        "Write" => "✓ File written".into(),
        "Edit" => "✓ File edited".into(),
        "Bash" => "✓ Command executed".into(),
        "Grep" => "✓ Search complete".into(),
        "Glob" => "✓ Files found".into(),
        "Task" => "✓ Task complete".into(),
        t if t.starts_with("mcp__") => format!("✓ {}", mcp_tool_label(t)),
        t => format!("✓ {t} complete"),
    }
}

static LINES_READ_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) lines? read").expect("valid regex"));
static MATCHES_FOUND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) matches? found").expect("valid regex"));
static FILES_MATCHED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) files? matched").expect("valid regex"));

fn tool_output_subtitle(e: &PipelineEvent) -> Option<String> {
    let output = str_field(&e.data, "output")?;

    let counters: [(&str, &Regex, &str); 3] = [
        ("lines read", &*LINES_READ_RE, "lines"),
        ("matches found", &*MATCHES_FOUND_RE, "matches"),
        ("files matched", &*FILES_MATCHED_RE, "files"),
    ];
    for (needle, re, unit) in counters {
        if output.contains(needle) {
            if let Some(caps) = re.captures(output) {
                return Some(format!("{} {unit}", &caps[1]));
            }
        }
    }
    clip(Some(output), 50)
}

// ─── Raw SDK messages ────────────────────────────────────────────────────────

fn content_blocks(value: Option<&Value>) -> &[Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn block_type(block: &Value) -> Option<&str> {
    block.get("type").and_then(Value::as_str)
}

fn sdk_message_title(e: &PipelineEvent) -> String {
    let Some(raw) = e.data_object("raw") else {
        return "SDK Message".into();
    };
    match raw.get("type").and_then(Value::as_str) {
        Some("system") => "System Init".into(),
        Some("assistant") => assistant_title(raw),
        Some("user") => user_result_title(raw),
        Some("result") => "Tool Result".into(),
        Some(other) if !other.is_empty() => other.to_string(),
        _ => "SDK Message".into(),
    }
}

fn sdk_message_subtitle(e: &PipelineEvent) -> Option<String> {
    let raw = e.data_object("raw")?;
    if raw.get("type").and_then(Value::as_str) == Some("system") {
        return display_field(raw, "model");
    }
    None
}

fn assistant_title(raw: &Map<String, Value>) -> String {
    let content = content_blocks(raw.get("message").and_then(|m| m.get("content")));

    if let Some(tool_use) = content.iter().find(|c| block_type(c) == Some("tool_use")) {
        if let Some(name) = tool_use.get("name").and_then(Value::as_str) {
            return next_action_title(name, tool_use.get("input").and_then(Value::as_object));
        }
    }
    content
        .iter()
        .filter(|c| block_type(c) == Some("text"))
        .find_map(|c| c.get("text").and_then(Value::as_str).filter(|t| !t.is_empty()))
        .and_then(|text| clip(Some(text), 80))
        .unwrap_or_else(|| "Claude".into())
}

fn user_result_title(raw: &Map<String, Value>) -> String {
    let content = match raw.get("content") {
        Some(Value::Array(items)) => items.as_slice(),
        _ => content_blocks(raw.get("message").and_then(|m| m.get("content"))),
    };
    let preview = content
        .iter()
        .find(|c| block_type(c) == Some("tool_result"))
        .and_then(|result| match result.get("content") {
            Some(Value::String(text)) if !text.is_empty() => result_preview(text),
            Some(Value::Array(parts)) => parts
                .iter()
                .find(|p| block_type(p) == Some("text"))
                .and_then(|p| p.get("text").and_then(Value::as_str))
                .filter(|t| !t.is_empty())
                .and_then(result_preview),
            _ => None,
        });
    preview.unwrap_or_else(|| "Tool Result".into())
}

/// Arrow-prefixed description of the tool call an assistant turn is about to make.
fn next_action_title(tool: &str, input: Option<&Map<String, Value>>) -> String {
    let field = |key: &str| input.and_then(|i| i.get(key)).and_then(Value::as_str);

    match tool {
        "Edit" | "Write" | "Read" => {
            if let Some(path) = field("file_path") {
                return format!("→ {tool} {}", file_name(path));
            }
        }
        "Bash" => {
            if let Some(desc) = field("description") {
                return format!("→ {desc}");
            }
            if let Some(cmd) = field("command") {
                return format!("→ Run: {}", clip_str(cmd, 50));
            }
        }
        "Grep" => {
            if let Some(pattern) = field("pattern") {
                return format!("→ Search: {}", clip_str(pattern, 40));
            }
        }
        "Glob" => {
            if let Some(pattern) = field("pattern") {
                return format!("→ Find: {}", clip_str(pattern, 40));
            }
        }
        "Task" => {
            if let Some(desc) = field("description") {
                return format!("→ {desc}");
            }
        }
        _ => {}
    }
    if tool.starts_with("mcp__") {
        return format!("→ {}", mcp_tool_label(tool));
    }
    format!("→ {tool}")
}

static SUCCESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Successfully[^.!]*").expect("valid regex"));
static ERROR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[Ee]rror:[^.!\n]*").expect("valid regex"));

/// Short preview of a tool result body.
fn result_preview(content: &str) -> Option<String> {
    if content.chars().count() < 100 {
        return Some(format!("Result: {}", clip_str(content, 60)));
    }
    if content.contains("Successfully") {
        if let Some(m) = SUCCESS_RE.find(content) {
            return clip(Some(m.as_str()), 60);
        }
    }
    if content.contains("Error:") || content.contains("error:") {
        if let Some(m) = ERROR_RE.find(content) {
            return clip(Some(m.as_str()), 60);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::event;
    use serde_json::json;

    #[test]
    fn unknown_type_falls_back_to_muted_bullet() {
        let model = classify(&event("custom_step_done", json!({ "foo": 1 })));
        assert_eq!(model.icon, "•");
        assert_eq!(model.color_class, ColorClass::Muted);
        assert_eq!(model.title, "custom step done");
        assert_eq!(model.subtitle, None);
        assert!(!model.is_minor);
    }

    #[test]
    fn minor_set_is_exact() {
        let minor = [
            "prefetch_start",
            "prefetch_complete",
            "tool_complete",
            "mcp_complete",
            "sdk_message",
            "sdk_thinking",
            "timing",
            "token_usage",
            "tool_input_full",
            "tool_output_full",
        ];
        for t in minor {
            assert!(is_minor_event(&event(t, json!({}))), "{t} should be minor");
        }
        for t in ["started", "tool_call", "mcp_call", "error", "not_a_type"] {
            assert!(!is_minor_event(&event(t, json!({}))), "{t} should not be minor");
        }
    }

    #[test]
    fn only_turn_complete_timing_is_hidden() {
        assert!(should_hide_event(&event(
            "timing",
            json!({ "event": "turn_complete" })
        )));
        assert!(!should_hide_event(&event(
            "timing",
            json!({ "event": "tool_latency" })
        )));
        assert!(!should_hide_event(&event("timing", json!({}))));
        assert!(!should_hide_event(&event(
            "started",
            json!({ "event": "turn_complete" })
        )));
    }

    #[test]
    fn file_path_shortening() {
        assert_eq!(file_path("a/b/c/d/e.ts"), ".../c/d/e.ts");
        assert_eq!(file_path("a/b.ts"), "a/b.ts");
        assert_eq!(file_path("a/b/c.ts"), "a/b/c.ts");
        assert_eq!(file_path("/a/b/c"), ".../a/b/c");
        assert_eq!(file_name("src/lib/main.rs"), "main.rs");
        assert_eq!(file_name("dir/"), "dir/");
    }

    #[test]
    fn read_tool_uses_basename_and_short_path() {
        let model = classify(&event(
            "tool_call",
            json!({ "toolName": "Read", "toolInput": { "file_path": "/repo/src/app/main.rs" } }),
        ));
        assert_eq!(model.icon, "🔧");
        assert_eq!(model.color_class, ColorClass::Tool);
        assert_eq!(model.title, "Read main.rs");
        assert_eq!(model.subtitle.as_deref(), Some(".../src/app/main.rs"));
    }

    #[test]
    fn bash_prefers_description_and_clips_command() {
        let long_cmd = "x".repeat(80);
        let model = classify(&event(
            "tool_start",
            json!({ "toolName": "Bash", "toolInput": { "description": "Run tests", "command": long_cmd } }),
        ));
        assert_eq!(model.title, "Run tests");
        let sub = model.subtitle.unwrap();
        assert_eq!(sub, format!("{}...", "x".repeat(60)));

        let model = classify(&event(
            "tool_call",
            json!({ "toolName": "Bash", "toolInput": { "command": "ls -la" } }),
        ));
        assert_eq!(model.title, "Bash");
        assert_eq!(model.subtitle.as_deref(), Some("ls -la"));
    }

    #[test]
    fn grep_and_glob_show_pattern_and_path() {
        let model = classify(&event(
            "tool_call",
            json!({ "toolName": "Grep", "toolInput": { "pattern": "fn main", "path": "src" } }),
        ));
        assert_eq!(model.title, "Search: fn main");
        assert_eq!(model.subtitle.as_deref(), Some("src"));

        let model = classify(&event(
            "tool_call",
            json!({ "name": "Glob", "toolInput": { "pattern": "**/*.rs" } }),
        ));
        assert_eq!(model.title, "Find: **/*.rs");
        assert_eq!(model.subtitle, None);
    }

    #[test]
    fn unknown_tool_and_malformed_input_degrade() {
        let model = classify(&event(
            "tool_call",
            json!({ "toolName": "WebFetch", "toolInput": { "url": "https://x" } }),
        ));
        assert_eq!(model.title, "WebFetch");
        assert_eq!(model.subtitle, None);

        let model = classify(&event(
            "tool_call",
            json!({ "toolName": "Read", "toolInput": "not an object" }),
        ));
        assert_eq!(model.title, "Read");
        assert_eq!(model.subtitle, None);

        let model = classify(&event("tool_call", json!({ "toolName": 42 })));
        assert_eq!(model.title, "Tool");
    }

    #[test]
    fn tool_complete_is_minor() {
        let model = classify(&event("tool_complete", json!({ "toolName": "Edit" })));
        assert_eq!(model.title, "Edit complete");
        assert!(model.is_minor);
        assert_eq!(classify(&event("tool_complete", json!({}))).title, "Tool complete");
    }

    #[test]
    fn mcp_titles_and_subtitles() {
        let model = classify(&event(
            "mcp_call",
            json!({ "mcpTool": "shapeup_view_task", "toolInput": { "taskId": "T-1" } }),
        ));
        assert_eq!(model.title, "View Task");
        assert_eq!(model.subtitle.as_deref(), Some("T-1"));

        let model = classify(&event(
            "mcp_start",
            json!({ "mcpTool": "shapeup_view_task", "mcpServer": "shapeup" }),
        ));
        assert_eq!(model.title, "view task");
        assert_eq!(model.subtitle.as_deref(), Some("via shapeup"));

        let model = classify(&event(
            "mcp_call",
            json!({ "mcpTool": "github_create_pull_request", "toolInput": { "repoName": "api" } }),
        ));
        assert_eq!(model.title, "Create PR");
        assert_eq!(model.subtitle.as_deref(), Some("api"));

        let model = classify(&event("mcp_call", json!({ "toolName": "admin_list_repos" })));
        assert_eq!(model.title, "list repos");
        assert_eq!(model.subtitle, None);
    }

    #[test]
    fn sdk_assistant_tool_use_gets_arrow_title() {
        let model = classify(&event(
            "sdk_message",
            json!({ "raw": { "type": "assistant", "message": { "content": [
                { "type": "text", "text": "Let me edit" },
                { "type": "tool_use", "name": "Edit", "input": { "file_path": "a/b/c.rs" } }
            ] } } }),
        ));
        assert_eq!(model.title, "→ Edit c.rs");
        assert!(model.is_minor);

        let model = classify(&event(
            "sdk_message",
            json!({ "raw": { "type": "assistant", "message": { "content": [
                { "type": "tool_use", "name": "mcp__shapeup__add_comment", "input": {} }
            ] } } }),
        ));
        assert_eq!(model.title, "→ add comment");
    }

    #[test]
    fn sdk_assistant_text_is_clipped_to_80() {
        let text = "a".repeat(120);
        let model = classify(&event(
            "sdk_message",
            json!({ "raw": { "type": "assistant", "message": { "content": [
                { "type": "text", "text": text }
            ] } } }),
        ));
        assert_eq!(model.title, format!("{}...", "a".repeat(80)));

        let model = classify(&event(
            "sdk_message",
            json!({ "raw": { "type": "assistant", "message": { "content": [] } } }),
        ));
        assert_eq!(model.title, "Claude");
    }

    #[test]
    fn sdk_user_tool_result_previews() {
        let short = classify(&event(
            "sdk_message",
            json!({ "raw": { "type": "user", "content": [
                { "type": "tool_result", "content": "ok" }
            ] } }),
        ));
        assert_eq!(short.title, "Result: ok");

        let long_success = format!("{} Successfully wrote 42 bytes. trailing", "x".repeat(120));
        let model = classify(&event(
            "sdk_message",
            json!({ "raw": { "type": "user", "content": [
                { "type": "tool_result", "content": [{ "type": "text", "text": long_success }] }
            ] } }),
        ));
        assert_eq!(model.title, "Successfully wrote 42 bytes");

        let long_error = format!("{}\nError: file not found\nmore", "y".repeat(120));
        let model = classify(&event(
            "sdk_message",
            json!({ "raw": { "type": "user", "content": [
                { "type": "tool_result", "content": long_error }
            ] } }),
        ));
        assert_eq!(model.title, "Error: file not found");

        let long_plain = "z".repeat(150);
        let model = classify(&event(
            "sdk_message",
            json!({ "raw": { "type": "user", "content": [
                { "type": "tool_result", "content": long_plain }
            ] } }),
        ));
        assert_eq!(model.title, "Tool Result");
    }

    #[test]
    fn sdk_system_and_other_types() {
        let model = classify(&event(
            "sdk_message",
            json!({ "raw": { "type": "system", "model": "claude-sonnet" } }),
        ));
        assert_eq!(model.title, "System Init");
        assert_eq!(model.subtitle.as_deref(), Some("claude-sonnet"));

        assert_eq!(
            classify(&event("sdk_message", json!({ "raw": { "type": "result" } }))).title,
            "Tool Result"
        );
        assert_eq!(
            classify(&event("sdk_message", json!({ "raw": { "type": "stream_event" } }))).title,
            "stream_event"
        );
        assert_eq!(classify(&event("sdk_message", json!({}))).title, "SDK Message");
    }

    #[test]
    fn tool_output_full_infers_from_output_text() {
        let model = classify(&event(
            "tool_output_full",
            json!({ "output": "12 matches found in 3 files" }),
        ));
        assert_eq!(model.title, "✓ Search complete");
        assert_eq!(model.subtitle.as_deref(), Some("12 matches"));

        let model = classify(&event(
            "tool_output_full",
            json!({ "toolName": "unknown", "output": "120 lines read from src/a.rs" }),
        ));
        assert_eq!(model.title, "✓ File read");
        assert_eq!(model.subtitle.as_deref(), Some("120 lines"));

        let model = classify(&event(
            "tool_output_full",
            json!({ "toolName": "mcp__github__list_prs", "output": "[]" }),
        ));
        assert_eq!(model.title, "✓ list prs");
        assert_eq!(model.subtitle.as_deref(), Some("[]"));

        assert_eq!(
            classify(&event("tool_output_full", json!({}))).title,
            "✓ Tool complete"
        );
    }

    #[test]
    fn tool_input_full_titles() {
        let model = classify(&event(
            "tool_input_full",
            json!({ "toolName": "Write", "input": { "file_path": "a/b/c/d.md" } }),
        ));
        assert_eq!(model.title, "Write d.md");
        assert_eq!(model.subtitle.as_deref(), Some(".../b/c/d.md"));

        let model = classify(&event("tool_input_full", json!({ "toolName": "Task" })));
        assert_eq!(model.title, "Input: Task");
        assert_eq!(model.subtitle, None);
    }

    #[test]
    fn review_and_audit() {
        let model = classify(&event("code_review_result", json!({ "verdict": "APPROVE" })));
        assert_eq!(model.title, "Code Review: APPROVE");
        assert_eq!(
            classify(&event("code_review_result", json!({}))).title,
            "Code Review: Complete"
        );

        let model = classify(&event(
            "audit_generated",
            json!({ "outcome": "success", "taskTitle": "Fix login" }),
        ));
        assert_eq!(model.subtitle.as_deref(), Some("success - Fix login"));
        let model = classify(&event("audit_generated", json!({ "taskTitle": "Fix login" })));
        assert_eq!(model.subtitle, None);
    }

    #[test]
    fn lifecycle_subtitles() {
        let model = classify(&event("completed", json!({ "cost": 0.5 })));
        assert_eq!(model.subtitle.as_deref(), Some("$0.5000"));
        assert_eq!(classify(&event("completed", json!({}))).subtitle, None);

        let model = classify(&event("started", json!({ "workflowType": "resolve-task" })));
        assert_eq!(model.subtitle.as_deref(), Some("resolve-task"));
        assert_eq!(classify(&event("started", json!({}))).subtitle, None);

        let model = classify(&event("init", json!({ "model": "opus", "tools": ["a", "b"] })));
        assert_eq!(model.subtitle.as_deref(), Some("opus, 2 tools"));

        let model = classify(&event("error", json!({ "message": "boom" })));
        assert_eq!(model.color_class, ColorClass::Error);
        assert_eq!(model.subtitle.as_deref(), Some("boom"));
    }

    #[test]
    fn workflow_titles() {
        let model = classify(&event("repos_selected", json!({ "repos": ["api", "web"] })));
        assert_eq!(model.title, "Selected: api, web");
        assert_eq!(
            classify(&event("repos_selected", json!({ "repos": [] }))).title,
            "Repositories Selected"
        );
        assert_eq!(
            classify(&event("evaluation_complete", json!({ "requiresCode": true }))).title,
            "Task requires code changes"
        );
        let model = classify(&event("agent_completed", json!({ "agentType": "planner" })));
        assert_eq!(model.title, "planner Complete");
        let model = classify(&event("token_usage", json!({ "inputTokens": 120 })));
        assert_eq!(model.subtitle.as_deref(), Some("120 in / 0 out"));
        let model = classify(&event("timing", json!({ "event": "llm_call", "durationMs": 250 })));
        assert_eq!(model.title, "llm_call");
        assert_eq!(model.subtitle.as_deref(), Some("250ms"));
    }

    #[test]
    fn classify_event_attaches_links() {
        let e = event("completed", json!({ "prUrl": "https://github.com/o/r/pull/9" }));
        let model = classify_event(&e, None);
        assert_eq!(model.links.len(), 2);
        assert_eq!(model.links[0].label, "PR #9");
        assert_eq!(model.links[1].label, "View PR");
    }
}
