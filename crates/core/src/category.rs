//! Coarse event categories and the timeline filters built on them.

use crate::classify::should_hide_event;
use crate::pipeline::{PipelineEvent, PipelineStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    Lifecycle,
    Workflow,
    Agent,
    Tool,
    Mcp,
    Debug,
    Error,
}

impl EventCategory {
    pub fn of(event_type: &str) -> Option<Self> {
        use EventCategory::*;
        Some(match event_type {
            "started" | "completed" | "failed" | "waiting_approval" | "approved" | "rejected" => {
                Lifecycle
            }
            "workflow_started" | "workflow_step" | "plan_generated" | "task_fetched"
            | "prefetch_complete" | "repo_selected" | "code_review_result"
            | "audit_generated" => Workflow,
            "agent_started" | "agent_completed" | "subagent_start" | "subagent_stop" => Agent,
            "tool_start" | "tool_complete" | "tool_error" => Tool,
            "mcp_start" | "mcp_complete" | "mcp_error" => Mcp,
            "error" | "budget_exceeded" => Error,
            _ => return None,
        })
    }
}

/// Timeline filter chips, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(EventCategory),
}

impl CategoryFilter {
    pub const CHOICES: [CategoryFilter; 6] = [
        CategoryFilter::All,
        CategoryFilter::Only(EventCategory::Lifecycle),
        CategoryFilter::Only(EventCategory::Workflow),
        CategoryFilter::Only(EventCategory::Agent),
        CategoryFilter::Only(EventCategory::Tool),
        CategoryFilter::Only(EventCategory::Error),
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Only(EventCategory::Lifecycle) => "Lifecycle",
            Self::Only(EventCategory::Workflow) => "Workflow",
            Self::Only(EventCategory::Agent) => "Agent",
            Self::Only(EventCategory::Tool) => "Tool",
            Self::Only(EventCategory::Mcp) => "MCP",
            Self::Only(EventCategory::Debug) => "Debug",
            Self::Only(EventCategory::Error) => "Error",
        }
    }

    pub fn matches(&self, event: &PipelineEvent) -> bool {
        let category = EventCategory::of(&event.event_type);
        match self {
            Self::All => category != Some(EventCategory::Debug),
            Self::Only(want) => category == Some(*want),
        }
    }

    /// Next chip, wrapping.
    pub fn cycle(&self) -> Self {
        let idx = Self::CHOICES.iter().position(|c| c == self).unwrap_or(0);
        Self::CHOICES[(idx + 1) % Self::CHOICES.len()]
    }
}

/// Drop hidden events, then apply the category filter. Order is preserved.
pub fn filter_events<'a>(events: &'a [PipelineEvent], filter: CategoryFilter) -> Vec<&'a PipelineEvent> {
    events
        .iter()
        .filter(|e| !should_hide_event(e))
        .filter(|e| filter.matches(e))
        .collect()
}

/// Session-list status chips.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(PipelineStatus),
}

impl StatusFilter {
    pub fn choices() -> [StatusFilter; 5] {
        [
            StatusFilter::All,
            StatusFilter::Only(PipelineStatus::Running),
            StatusFilter::Only(PipelineStatus::WaitingApproval),
            StatusFilter::Only(PipelineStatus::Completed),
            StatusFilter::Only(PipelineStatus::Failed),
        ]
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => "All",
            Self::Only(PipelineStatus::Running) => "Running",
            Self::Only(PipelineStatus::WaitingApproval) => "Waiting",
            Self::Only(PipelineStatus::Completed) => "Completed",
            Self::Only(PipelineStatus::Failed) => "Failed",
            Self::Only(PipelineStatus::Other(s)) => s,
        }
    }

    /// Query-string value; `None` for All.
    pub fn status(&self) -> Option<&PipelineStatus> {
        match self {
            Self::All => None,
            Self::Only(status) => Some(status),
        }
    }

    pub fn cycle(&self) -> Self {
        let choices = Self::choices();
        let idx = choices.iter().position(|c| c == self).unwrap_or(0);
        choices[(idx + 1) % choices.len()].clone()
    }
}
