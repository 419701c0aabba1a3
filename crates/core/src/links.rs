//! Navigable links discovered in an event payload.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::classify::str_field;
use crate::config::UrlFn;
use crate::pipeline::PipelineEvent;

/// Links shown inline on a timeline row; the rest collapse into `+N`.
pub const INLINE_LINK_LIMIT: usize = 2;

pub const DEFAULT_TASK_URL_PREFIX: &str = "https://shapeup.smartup.lat/v2/tasks/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkKind {
    TaskRef,
    VcsPr,
    VcsCommit,
}

impl LinkKind {
    pub fn icon(&self) -> &'static str {
        match self {
            Self::TaskRef => "📋",
            Self::VcsPr => "🔀",
            Self::VcsCommit => "📌",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub kind: LinkKind,
    pub url: String,
    pub label: String,
}

static PR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https://github\.com/([^/]+)/([^/]+)/pull/(\d+)").expect("valid regex")
});
static COMMIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https://github\.com/([^/]+)/([^/]+)/commit/([a-f0-9]+)").expect("valid regex")
});

/// Scan an event for PR / commit URLs and task references.
///
/// Order: PR matches, commit matches (both in text order over the compact JSON
/// of `data`), `toolInput.taskId`, top-level `taskId`, then `prUrl`. Duplicates
/// are kept.
pub fn extract_links(event: &PipelineEvent, task_url: Option<&UrlFn>) -> Vec<Link> {
    let mut links = Vec::new();
    let text = serde_json::to_string(&event.data).unwrap_or_default();

    for caps in PR_RE.captures_iter(&text) {
        links.push(Link {
            kind: LinkKind::VcsPr,
            url: caps[0].to_string(),
            label: format!("PR #{}", &caps[3]),
        });
    }
    for caps in COMMIT_RE.captures_iter(&text) {
        let short: String = caps[3].chars().take(7).collect();
        links.push(Link {
            kind: LinkKind::VcsCommit,
            url: caps[0].to_string(),
            label: format!("Commit {short}"),
        });
    }

    let nested_task = event
        .data_object("toolInput")
        .and_then(|input| str_field(input, "taskId"));
    let top_task = str_field(&event.data, "taskId");
    for task_id in [nested_task, top_task].into_iter().flatten() {
        links.push(Link {
            kind: LinkKind::TaskRef,
            url: task_link(task_id, task_url),
            label: "View Task".to_string(),
        });
    }

    if let Some(pr_url) = str_field(&event.data, "prUrl") {
        links.push(Link {
            kind: LinkKind::VcsPr,
            url: pr_url.to_string(),
            label: "View PR".to_string(),
        });
    }

    links
}

pub fn task_link(task_id: &str, builder: Option<&UrlFn>) -> String {
    match builder {
        Some(build) => build(task_id),
        None => format!("{DEFAULT_TASK_URL_PREFIX}{task_id}"),
    }
}

/// Links beyond [`INLINE_LINK_LIMIT`].
pub fn overflow_count(links: &[Link]) -> usize {
    links.len().saturating_sub(INLINE_LINK_LIMIT)
}
