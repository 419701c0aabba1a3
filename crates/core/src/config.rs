//! Library configuration: server location, link builders, feature toggles and labels.
//!
//! Built once by the host and passed by reference to every client and view.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::links::task_link;
use crate::pipeline::PipelineStatus;

/// Callback turning an identifier into a URL.
pub type UrlFn = dyn Fn(&str) -> String + Send + Sync;
pub type UrlBuilder = Arc<UrlFn>;

/// Builder from a template where `{id}` and `{url}` are replaced by the argument.
pub fn url_template(template: impl Into<String>) -> UrlBuilder {
    let template = template.into();
    Arc::new(move |value: &str| template.replace("{id}", value).replace("{url}", value))
}

#[derive(Clone, Default)]
pub struct LinkBuilders {
    pub task_url: Option<UrlBuilder>,
    pub pr_url: Option<UrlBuilder>,
    pub session_url: Option<UrlBuilder>,
}

impl fmt::Debug for LinkBuilders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkBuilders")
            .field("task_url", &self.task_url.is_some())
            .field("pr_url", &self.pr_url.is_some())
            .field("session_url", &self.session_url.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    pub allow_approval: bool,
    pub allow_delete: bool,
    pub allow_share_links: bool,
    pub enable_live_view: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            allow_approval: true,
            allow_delete: true,
            allow_share_links: true,
            enable_live_view: true,
        }
    }
}

/// User-facing strings. Missing keys in a partial override keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub live_view_title: String,
    pub history_view_title: String,
    pub no_sessions_found: String,
    pub loading_sessions: String,
    pub select_session_prompt: String,
    pub status_running: String,
    pub status_waiting_approval: String,
    pub status_completed: String,
    pub status_failed: String,
    pub approve: String,
    pub reject: String,
    pub delete: String,
    pub watch_live: String,
    pub copy_link: String,
    pub no_events: String,
    pub event_count: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            live_view_title: "Live Pipelines".into(),
            history_view_title: "Session History".into(),
            no_sessions_found: "No sessions found".into(),
            loading_sessions: "Loading sessions...".into(),
            select_session_prompt: "Select a session to view details".into(),
            status_running: "Running".into(),
            status_waiting_approval: "Waiting".into(),
            status_completed: "Completed".into(),
            status_failed: "Failed".into(),
            approve: "Approve".into(),
            reject: "Reject".into(),
            delete: "Delete".into(),
            watch_live: "Watch Live".into(),
            copy_link: "Share".into(),
            no_events: "No events".into(),
            event_count: "events".into(),
        }
    }
}

impl Labels {
    pub fn status<'a>(&'a self, status: &'a PipelineStatus) -> &'a str {
        match status {
            PipelineStatus::Running => &self.status_running,
            PipelineStatus::WaitingApproval => &self.status_waiting_approval,
            PipelineStatus::Completed => &self.status_completed,
            PipelineStatus::Failed => &self.status_failed,
            PipelineStatus::Other(raw) => raw,
        }
    }
}

#[derive(Clone, Default)]
pub struct PipelineUiConfig {
    /// Base URL without a trailing slash, e.g. `https://api.example.com`.
    pub api_base_url: String,
    /// Static headers attached to every REST request.
    pub headers: BTreeMap<String, String>,
    pub websocket_url: Option<UrlBuilder>,
    pub links: LinkBuilders,
    pub features: Features,
    pub labels: Labels,
}

impl fmt::Debug for PipelineUiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineUiConfig")
            .field("api_base_url", &self.api_base_url)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("websocket_url", &self.websocket_url.is_some())
            .field("links", &self.links)
            .field("features", &self.features)
            .finish_non_exhaustive()
    }
}

impl PipelineUiConfig {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        let mut base: String = api_base_url.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self {
            api_base_url: base,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_websocket_url(mut self, builder: UrlBuilder) -> Self {
        self.websocket_url = Some(builder);
        self
    }

    pub fn with_task_url(mut self, builder: UrlBuilder) -> Self {
        self.links.task_url = Some(builder);
        self
    }

    pub fn task_url(&self, task_id: &str) -> String {
        task_link(task_id, self.links.task_url.as_deref())
    }

    pub fn pr_url(&self, pr_url: &str) -> String {
        match &self.links.pr_url {
            Some(build) => build(pr_url),
            None => pr_url.to_string(),
        }
    }

    /// Shareable link to a session page.
    pub fn share_url(&self, pipeline_id: &str) -> String {
        match &self.links.session_url {
            Some(build) => build(pipeline_id),
            None => format!("{}/session/{pipeline_id}", self.api_base_url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_trailing_slash() {
        assert_eq!(
            PipelineUiConfig::new("http://localhost:3000//").api_base_url,
            "http://localhost:3000"
        );
    }

    #[test]
    fn templates_substitute_id_and_url() {
        let task = url_template("https://tasks.example.com/{id}");
        assert_eq!(task("T-1"), "https://tasks.example.com/T-1");
        let pr = url_template("https://redirect.example.com/?to={url}");
        assert_eq!(
            pr("https://github.com/o/r/pull/1"),
            "https://redirect.example.com/?to=https://github.com/o/r/pull/1"
        );
    }

    #[test]
    fn link_helpers_fall_back() {
        let config = PipelineUiConfig::new("https://api.example.com");
        assert_eq!(
            config.task_url("T-1"),
            "https://shapeup.smartup.lat/v2/tasks/T-1"
        );
        assert_eq!(config.pr_url("https://x/pull/1"), "https://x/pull/1");
        assert_eq!(
            config.share_url("p-1"),
            "https://api.example.com/session/p-1"
        );

        let config = config.with_task_url(url_template("https://t/{id}"));
        assert_eq!(config.task_url("T-1"), "https://t/T-1");
    }

    #[test]
    fn partial_labels_keep_defaults() {
        let labels: Labels = serde_json::from_str(r#"{"approve":"Aprobar"}"#).unwrap();
        assert_eq!(labels.approve, "Aprobar");
        assert_eq!(labels.reject, "Reject");
        assert_eq!(
            labels.status(&PipelineStatus::WaitingApproval),
            "Waiting"
        );
        let features: Features = serde_json::from_str(r#"{"allow_delete":false}"#).unwrap();
        assert!(!features.allow_delete);
        assert!(features.enable_live_view);
    }
}
