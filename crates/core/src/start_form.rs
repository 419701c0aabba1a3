//! State of the "start pipeline" form and its conversion into a request.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::format::extract_task_id;
use crate::pipeline::{
    AgentOverride, ModelType, StartPipelineRequest, VerbosityLevel, WorkflowType,
};

pub const DEFAULT_BUDGET_USD: f64 = 10.0;
const DEFAULT_BUDGET_TEXT: &str = "10.00";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Please enter a task ID or URL")]
    MissingTask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Wait for plan approval.
    #[default]
    Standard,
    /// Execute without approval.
    Yolo,
    /// Plan only.
    DryRun,
}

impl ExecutionMode {
    pub const ALL: [ExecutionMode; 3] = [Self::Standard, Self::Yolo, Self::DryRun];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Yolo => "YOLO",
            Self::DryRun => "Dry Run",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Standard => "Wait for approval",
            Self::Yolo => "Auto-execute",
            Self::DryRun => "Plan only",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub default_model: ModelType,
}

pub const AGENTS: [AgentSpec; 5] = [
    AgentSpec {
        id: "task-evaluator",
        label: "Task Evaluator",
        default_model: ModelType::Haiku,
    },
    AgentSpec {
        id: "repo-selector",
        label: "Repo Selector",
        default_model: ModelType::Sonnet,
    },
    AgentSpec {
        id: "plan-generator",
        label: "Plan Generator",
        default_model: ModelType::Sonnet,
    },
    AgentSpec {
        id: "code-executor",
        label: "Code Executor",
        default_model: ModelType::Opus,
    },
    AgentSpec {
        id: "code-reviewer",
        label: "Code Reviewer",
        default_model: ModelType::Opus,
    },
];

#[derive(Debug, Clone, PartialEq)]
pub struct StartForm {
    pub task_input: String,
    pub workflow_type: WorkflowType,
    pub execution_mode: ExecutionMode,
    pub auto_create_pr: bool,
    pub auto_review: bool,
    pub max_budget: String,
    pub verbosity: VerbosityLevel,
    /// Agent id → chosen model. Absent or `None` means "use the backend default".
    pub agent_models: BTreeMap<&'static str, Option<ModelType>>,
    pub show_advanced: bool,
}

impl Default for StartForm {
    fn default() -> Self {
        Self {
            task_input: String::new(),
            workflow_type: WorkflowType::ResolveTask,
            execution_mode: ExecutionMode::Standard,
            auto_create_pr: true,
            auto_review: true,
            max_budget: DEFAULT_BUDGET_TEXT.to_string(),
            verbosity: VerbosityLevel::Debug,
            agent_models: BTreeMap::new(),
            show_advanced: false,
        }
    }
}

impl StartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parsed budget; unparsable, non-finite or non-positive input falls back to the default.
    pub fn budget_usd(&self) -> f64 {
        match self.max_budget.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => v,
            _ => DEFAULT_BUDGET_USD,
        }
    }

    pub fn agent_model(&self, agent_id: &str) -> Option<ModelType> {
        self.agent_models.get(agent_id).copied().flatten()
    }

    pub fn set_agent_model(&mut self, agent: &AgentSpec, model: Option<ModelType>) {
        self.agent_models.insert(agent.id, model);
    }

    /// Default → Haiku → Sonnet → Opus → Default.
    pub fn cycle_agent_model(&mut self, agent: &AgentSpec) {
        let next = match self.agent_model(agent.id) {
            None => Some(ModelType::ALL[0]),
            Some(current) => {
                let idx = ModelType::ALL.iter().position(|m| *m == current).unwrap_or(0);
                ModelType::ALL.get(idx + 1).copied()
            }
        };
        self.set_agent_model(agent, next);
    }

    pub fn build_request(&self) -> Result<StartPipelineRequest, FormError> {
        let task_id = extract_task_id(self.task_input.trim());
        if task_id.is_empty() {
            return Err(FormError::MissingTask);
        }

        let overrides: HashMap<String, AgentOverride> = self
            .agent_models
            .iter()
            .filter_map(|(agent, model)| {
                model.map(|m| (agent.to_string(), AgentOverride { model: Some(m) }))
            })
            .collect();

        let mut request = StartPipelineRequest::for_task(task_id, self.workflow_type.clone());
        request.skip_approval = Some(self.execution_mode == ExecutionMode::Yolo);
        request.dry_run = Some(self.execution_mode == ExecutionMode::DryRun);
        request.auto_create_pr = Some(self.auto_create_pr);
        request.auto_review = Some(self.auto_review);
        request.max_budget_usd = Some(self.budget_usd());
        request.verbosity = Some(self.verbosity);
        request.agent_overrides = (!overrides.is_empty()).then_some(overrides);
        Ok(request)
    }

    /// After a successful start the task and mode are cleared; other choices persist.
    pub fn reset_after_start(&mut self) {
        self.task_input.clear();
        self.execution_mode = ExecutionMode::Standard;
    }
}
