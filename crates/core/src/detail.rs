//! Expanded view of a single event.

use pulldown_cmark::{Options, Parser, html};
use serde_json::Value;

use crate::classify::str_field;
use crate::pipeline::PipelineEvent;

const DIFF_MAX_CHARS: usize = 200;
const PROMPT_MAX_CHARS: usize = 500;
const TRUNCATED_MARKER: &str = "\n... (truncated)";

/// Markdown source together with its rendered HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownBlock {
    pub source: String,
    pub html: String,
}

impl MarkdownBlock {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let html = markdown_to_html(&source);
        Self { source, html }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDetail {
    Markdown(MarkdownBlock),
    Thinking(String),
    Diff {
        file_path: Option<String>,
        removed: Option<String>,
        added: Option<String>,
    },
    Shell {
        command: String,
    },
    Prompt(String),
    Review {
        verdict: Option<String>,
        verdict_label: Option<&'static str>,
        body: Option<MarkdownBlock>,
    },
    Audit {
        outcome: String,
        report: MarkdownBlock,
    },
    Json(String),
}

pub fn markdown_to_html(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    let parser = Parser::new_ext(source, options);
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Keep the first `max` characters and append a truncation marker.
pub fn truncate_code(code: &str, max: usize) -> String {
    if code.chars().count() <= max {
        return code.to_string();
    }
    let mut out: String = code.chars().take(max).collect();
    out.push_str(TRUNCATED_MARKER);
    out
}

pub fn verdict_label(verdict: &str) -> Option<&'static str> {
    match verdict {
        "APPROVE" => Some("✓ Approved"),
        "CHANGES_REQUESTED" => Some("⚠ Changes Requested"),
        "COMMENT" => Some("💬 Commented"),
        _ => None,
    }
}

/// Whether a row has anything to expand.
pub fn has_details(event: &PipelineEvent) -> bool {
    let present = |key: &str| event.data.get(key).is_some_and(|v| !is_falsy(v));
    match event.event_type.as_str() {
        "assistant_message" if present("text") => true,
        "plan_generated" if present("plan") => true,
        "sdk_thinking" if present("thinking") => true,
        "code_review_result" => true,
        "tool_call" | "agent_start" if present("toolInput") => true,
        "audit_generated" if present("markdownReport") => true,
        _ => !event.data.is_empty(),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

pub fn render_detail(event: &PipelineEvent) -> EventDetail {
    let data = &event.data;
    match event.event_type.as_str() {
        "assistant_message" => {
            if let Some(text) = str_field(data, "text") {
                return EventDetail::Markdown(MarkdownBlock::new(text));
            }
        }
        "plan_generated" => {
            if let Some(plan) = str_field(data, "plan") {
                return EventDetail::Markdown(MarkdownBlock::new(plan));
            }
        }
        "sdk_thinking" => {
            if let Some(thinking) = str_field(data, "thinking") {
                return EventDetail::Thinking(thinking.to_string());
            }
        }
        "tool_call" | "tool_start" => {
            if let Some(input) = data.get("toolInput").filter(|v| !is_falsy(v)) {
                return render_tool_input(event.data_str("toolName").unwrap_or_default(), input);
            }
        }
        "agent_start" | "agent_started" => {
            let prompt = event
                .data_object("toolInput")
                .and_then(|input| str_field(input, "prompt"));
            if let Some(prompt) = prompt {
                return EventDetail::Prompt(truncate_code(prompt, PROMPT_MAX_CHARS));
            }
        }
        "code_review_result" => {
            let verdict = str_field(data, "verdict");
            return EventDetail::Review {
                verdict: verdict.map(str::to_string),
                verdict_label: verdict.and_then(verdict_label),
                body: str_field(data, "body").map(MarkdownBlock::new),
            };
        }
        "audit_generated" => {
            if let Some(report) = str_field(data, "markdownReport") {
                return EventDetail::Audit {
                    outcome: str_field(data, "outcome").unwrap_or("Unknown").to_string(),
                    report: MarkdownBlock::new(report),
                };
            }
        }
        _ => {}
    }
    EventDetail::Json(pretty_json(&Value::Object(data.clone())))
}

fn render_tool_input(tool: &str, input: &Value) -> EventDetail {
    let field = |key: &str| input.get(key).and_then(Value::as_str);
    match tool {
        "Edit" => EventDetail::Diff {
            file_path: field("file_path").map(str::to_string),
            removed: field("old_string")
                .filter(|s| !s.is_empty())
                .map(|s| truncate_code(s, DIFF_MAX_CHARS)),
            added: field("new_string")
                .filter(|s| !s.is_empty())
                .map(|s| truncate_code(s, DIFF_MAX_CHARS)),
        },
        "Bash" if field("command").is_some_and(|c| !c.is_empty()) => EventDetail::Shell {
            command: field("command").unwrap_or_default().to_string(),
        },
        _ => EventDetail::Json(pretty_json(input)),
    }
}

fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::event;
    use serde_json::json;

    #[test]
    fn assistant_text_renders_markdown() {
        let detail = render_detail(&event(
            "assistant_message",
            json!({ "text": "# Plan\n\n- step **one**" }),
        ));
        let EventDetail::Markdown(block) = detail else {
            panic!("expected markdown");
        };
        assert!(block.html.contains("<h1>Plan</h1>"));
        assert!(block.html.contains("<strong>one</strong>"));
        assert_eq!(block.source, "# Plan\n\n- step **one**");
    }

    #[test]
    fn edit_renders_truncated_diff() {
        let long = "x".repeat(250);
        let detail = render_detail(&event(
            "tool_call",
            json!({ "toolName": "Edit", "toolInput": {
                "file_path": "src/main.rs", "old_string": long, "new_string": "y"
            } }),
        ));
        let EventDetail::Diff {
            file_path,
            removed,
            added,
        } = detail
        else {
            panic!("expected diff");
        };
        assert_eq!(file_path.as_deref(), Some("src/main.rs"));
        let removed = removed.unwrap();
        assert!(removed.starts_with(&"x".repeat(200)));
        assert!(removed.ends_with("\n... (truncated)"));
        assert_eq!(added.as_deref(), Some("y"));
    }

    #[test]
    fn bash_renders_shell_line_and_other_tools_json() {
        let detail = render_detail(&event(
            "tool_start",
            json!({ "toolName": "Bash", "toolInput": { "command": "cargo fmt" } }),
        ));
        assert_eq!(
            detail,
            EventDetail::Shell {
                command: "cargo fmt".into()
            }
        );

        let detail = render_detail(&event(
            "tool_call",
            json!({ "toolName": "Grep", "toolInput": { "pattern": "x" } }),
        ));
        assert_eq!(detail, EventDetail::Json("{\n  \"pattern\": \"x\"\n}".into()));
    }

    #[test]
    fn agent_prompt_is_truncated_to_500() {
        let prompt = "p".repeat(600);
        let detail = render_detail(&event(
            "agent_started",
            json!({ "toolInput": { "prompt": prompt } }),
        ));
        let EventDetail::Prompt(text) = detail else {
            panic!("expected prompt");
        };
        assert_eq!(text.chars().count(), 500 + "\n... (truncated)".chars().count());
    }

    #[test]
    fn review_and_audit() {
        let detail = render_detail(&event(
            "code_review_result",
            json!({ "verdict": "CHANGES_REQUESTED", "body": "fix it" }),
        ));
        let EventDetail::Review {
            verdict_label,
            body,
            ..
        } = detail
        else {
            panic!("expected review");
        };
        assert_eq!(verdict_label, Some("⚠ Changes Requested"));
        assert!(body.unwrap().html.contains("fix it"));

        let detail = render_detail(&event(
            "audit_generated",
            json!({ "markdownReport": "## Report" }),
        ));
        let EventDetail::Audit { outcome, report } = detail else {
            panic!("expected audit");
        };
        assert_eq!(outcome, "Unknown");
        assert!(report.html.contains("<h2>Report</h2>"));
    }

    #[test]
    fn fallback_is_pretty_json_of_data() {
        let detail = render_detail(&event("timing", json!({ "durationMs": 5 })));
        assert_eq!(detail, EventDetail::Json("{\n  \"durationMs\": 5\n}".into()));
    }

    #[test]
    fn has_details_rules() {
        assert!(has_details(&event("code_review_result", json!({}))));
        assert!(!has_details(&event("approved", json!({}))));
        assert!(has_details(&event("approved", json!({ "by": "me" }))));
        assert!(has_details(&event("assistant_message", json!({ "text": "hi" }))));
        assert!(!has_details(&event("plan_generated", json!({}))));
    }

    #[test]
    fn truncate_code_keeps_short_input() {
        assert_eq!(truncate_code("abc", 3), "abc");
        assert_eq!(truncate_code("abcd", 3), "abc\n... (truncated)");
    }
}
