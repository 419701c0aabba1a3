use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use dialoguer::{Confirm, Select};
use pipeline_ui_api_client::ApiClient;
use pipeline_ui_core::format::{format_date_time, status_label, truncate};
use pipeline_ui_core::start_form::{AGENTS, AgentSpec, ExecutionMode, StartForm};
use pipeline_ui_core::{ModelType, Session, VerbosityLevel, WorkflowType};
use std::io::IsTerminal;

use crate::output::{OutputFormat, print_json};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum WorkflowArg {
    ResolveTask,
    CodeReview,
    SpecAnalysis,
    MultiRepo,
}

impl From<WorkflowArg> for WorkflowType {
    fn from(value: WorkflowArg) -> Self {
        match value {
            WorkflowArg::ResolveTask => Self::ResolveTask,
            WorkflowArg::CodeReview => Self::CodeReview,
            WorkflowArg::SpecAnalysis => Self::SpecAnalysis,
            WorkflowArg::MultiRepo => Self::MultiRepo,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Stop for plan approval.
    Standard,
    /// Execute without approval.
    Yolo,
    /// Plan only.
    DryRun,
}

impl From<ModeArg> for ExecutionMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Standard => Self::Standard,
            ModeArg::Yolo => Self::Yolo,
            ModeArg::DryRun => Self::DryRun,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum VerbosityArg {
    Condensed,
    Normal,
    Debug,
}

impl From<VerbosityArg> for VerbosityLevel {
    fn from(value: VerbosityArg) -> Self {
        match value {
            VerbosityArg::Condensed => Self::Condensed,
            VerbosityArg::Normal => Self::Normal,
            VerbosityArg::Debug => Self::Debug,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct StartArgs {
    /// Task id or task URL.
    pub task: String,

    #[arg(long, value_enum, default_value = "resolve-task")]
    pub workflow: WorkflowArg,

    #[arg(long, value_enum, default_value = "standard")]
    pub mode: ModeArg,

    /// Do not open a pull request when execution finishes.
    #[arg(long)]
    pub no_pr: bool,

    /// Skip the automated code review step.
    #[arg(long)]
    pub no_review: bool,

    /// Spending cap in USD.
    #[arg(long)]
    pub budget: Option<String>,

    #[arg(long, value_enum, default_value = "debug")]
    pub verbosity: VerbosityArg,

    /// Per-agent model, e.g. `code-executor=sonnet`. Repeatable.
    #[arg(long = "agent", value_name = "AGENT=MODEL")]
    pub agents: Vec<String>,

    /// Follow the pipeline after it starts.
    #[arg(long)]
    pub watch: bool,

    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Parse `agent-id=model` against the known agents.
pub fn parse_agent_override(raw: &str) -> Result<(&'static AgentSpec, ModelType)> {
    let Some((agent, model)) = raw.split_once('=') else {
        bail!("expected AGENT=MODEL, got `{raw}`");
    };
    let agent = agent.trim();
    let Some(spec) = AGENTS.iter().find(|a| a.id == agent) else {
        let known: Vec<_> = AGENTS.iter().map(|a| a.id).collect();
        bail!("unknown agent `{agent}` (known: {})", known.join(", "));
    };
    let model = model.trim().to_ascii_lowercase();
    let Some(model) = ModelType::ALL.into_iter().find(|m| m.as_str() == model) else {
        bail!("unknown model `{model}` (known: haiku, sonnet, opus)");
    };
    Ok((spec, model))
}

pub fn build_form(args: &StartArgs) -> Result<StartForm> {
    let mut form = StartForm::new();
    form.task_input = args.task.clone();
    form.workflow_type = args.workflow.into();
    form.execution_mode = args.mode.into();
    form.auto_create_pr = !args.no_pr;
    form.auto_review = !args.no_review;
    form.verbosity = args.verbosity.into();
    if let Some(budget) = &args.budget {
        form.max_budget = budget.clone();
    }
    for raw in &args.agents {
        let (agent, model) = parse_agent_override(raw)?;
        form.set_agent_model(agent, Some(model));
    }
    Ok(form)
}

/// Start a pipeline and return its id.
pub async fn start(client: &ApiClient, args: &StartArgs) -> Result<String> {
    let request = build_form(args)?.build_request()?;
    tracing::debug!(?request, "starting pipeline");
    let resp = client
        .start_pipeline(&request)
        .await
        .context("start pipeline")?;
    match args.format {
        OutputFormat::Json => print_json(&resp)?,
        OutputFormat::Text => {
            println!("started {} ({})", resp.pipeline_id, resp.status);
            if !resp.message.is_empty() {
                println!("{}", resp.message);
            }
        }
    }
    Ok(resp.pipeline_id)
}

pub async fn approve(
    client: &ApiClient,
    pipeline_id: &str,
    reject: bool,
    feedback: Option<String>,
) -> Result<()> {
    let resp = client
        .approve_pipeline(pipeline_id, !reject, feedback)
        .await
        .with_context(|| format!("approve {pipeline_id}"))?;
    println!("{}: {}", resp.pipeline_id, resp.status);
    if !resp.message.is_empty() {
        println!("{}", resp.message);
    }
    Ok(())
}

/// Resume a session paused for approval. Without an id, pick one from the
/// resumable sessions.
pub async fn resume(
    client: &ApiClient,
    pipeline_id: Option<String>,
    reject: bool,
    feedback: Option<String>,
) -> Result<String> {
    let pipeline_id = match pipeline_id {
        Some(id) => id,
        None => {
            let resumable = client
                .resumable_sessions()
                .await
                .context("list resumable sessions")?;
            choose_session(&resumable.sessions)?
        }
    };
    let resp = client
        .resume_session(&pipeline_id, !reject, feedback)
        .await
        .with_context(|| format!("resume {pipeline_id}"))?;
    println!("{}: {}", resp.pipeline_id, resp.status);
    if !resp.message.is_empty() {
        println!("{}", resp.message);
    }
    Ok(resp.pipeline_id)
}

fn choose_session(sessions: &[Session]) -> Result<String> {
    if sessions.is_empty() {
        bail!("no sessions are waiting for approval");
    }
    if sessions.len() == 1 {
        return Ok(sessions[0].pipeline_id.clone());
    }
    if !(std::io::stdin().is_terminal() && std::io::stdout().is_terminal()) {
        bail!(
            "{} sessions are waiting for approval; pass a pipeline id",
            sessions.len()
        );
    }

    let items: Vec<String> = sessions.iter().map(session_choice_line).collect();
    let selection = Select::new()
        .with_prompt("Select a session to resume")
        .items(&items)
        .default(0)
        .interact()
        .context("failed to select session")?;
    Ok(sessions[selection].pipeline_id.clone())
}

fn session_choice_line(session: &Session) -> String {
    format!(
        "{}  {}  {}  {}",
        truncate(session.display_title(), 40),
        status_label(&session.status),
        format_date_time(session.created_at.as_deref()),
        session.pipeline_id
    )
}

pub async fn delete(client: &ApiClient, pipeline_id: &str, yes: bool) -> Result<()> {
    if !yes {
        if !std::io::stdin().is_terminal() {
            bail!("refusing to delete {pipeline_id} without --yes");
        }
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {pipeline_id} and all of its events?"))
            .default(false)
            .interact()
            .context("failed to read confirmation")?;
        if !confirmed {
            println!("cancelled");
            return Ok(());
        }
    }
    let resp = client
        .delete_session(pipeline_id)
        .await
        .with_context(|| format!("delete {pipeline_id}"))?;
    if resp.message.is_empty() {
        println!("deleted {}", resp.pipeline_id);
    } else {
        println!("{}", resp.message);
    }
    Ok(())
}

pub async fn active(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let resp = client
        .list_active_pipelines()
        .await
        .context("list active pipelines")?;
    if format == OutputFormat::Json {
        return print_json(&resp);
    }
    if resp.pipelines.is_empty() {
        println!("no active pipelines");
        return Ok(());
    }
    for p in &resp.pipelines {
        let title = p
            .task_title
            .as_deref()
            .or(p.task_id.as_deref())
            .unwrap_or("-");
        println!(
            "{:<24} {:<18} {:>6} events  {}",
            p.pipeline_id, p.status, p.event_count, title
        );
    }
    Ok(())
}

pub async fn health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let resp = client.health().await.context("health check")?;
    match format {
        OutputFormat::Json => print_json(&resp)?,
        OutputFormat::Text => {
            let version = if resp.version.is_empty() {
                "unknown"
            } else {
                resp.version.as_str()
            };
            println!(
                "{} {} (version {version}, {} active)",
                client.base_url(),
                resp.status,
                resp.active_pipelines
            );
            if let Some(provider) = &resp.model_provider {
                println!("model provider: {provider}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        start: StartArgs,
    }

    fn parse(args: &[&str]) -> StartArgs {
        let mut argv = vec!["start"];
        argv.extend_from_slice(args);
        Harness::try_parse_from(argv).expect("parse").start
    }

    #[test]
    fn agent_override_parses_known_pairs() {
        let (agent, model) = parse_agent_override("code-executor=Sonnet").expect("parse");
        assert_eq!(agent.label, "Code Executor");
        assert_eq!(model, ModelType::Sonnet);
    }

    #[test]
    fn agent_override_rejects_unknown_values() {
        let err = parse_agent_override("planner=opus").unwrap_err().to_string();
        assert!(err.contains("unknown agent `planner`"), "{err}");
        assert!(parse_agent_override("code-executor=gpt").is_err());
        assert!(parse_agent_override("code-executor").is_err());
    }

    #[test]
    fn defaults_build_a_standard_request() {
        let req = build_form(&parse(&["T-42"]))
            .expect("form")
            .build_request()
            .expect("request");
        assert_eq!(req.task_id.as_deref(), Some("T-42"));
        assert_eq!(req.workflow_type, WorkflowType::ResolveTask);
        assert_eq!(req.skip_approval, Some(false));
        assert_eq!(req.dry_run, Some(false));
        assert_eq!(req.auto_create_pr, Some(true));
        assert_eq!(req.max_budget_usd, Some(10.0));
        assert!(req.agent_overrides.is_none());
    }

    #[test]
    fn flags_map_onto_the_request() {
        let args = parse(&[
            "https://tasks.example.com/v2/tasks/T-9",
            "--workflow",
            "code-review",
            "--mode",
            "yolo",
            "--no-pr",
            "--budget",
            "2.5",
            "--verbosity",
            "normal",
            "--agent",
            "code-reviewer=haiku",
        ]);
        let req = build_form(&args)
            .expect("form")
            .build_request()
            .expect("request");
        assert_eq!(req.task_id.as_deref(), Some("T-9"));
        assert_eq!(req.workflow_type, WorkflowType::CodeReview);
        assert_eq!(req.skip_approval, Some(true));
        assert_eq!(req.auto_create_pr, Some(false));
        assert_eq!(req.auto_review, Some(true));
        assert_eq!(req.max_budget_usd, Some(2.5));
        assert_eq!(req.verbosity, Some(VerbosityLevel::Normal));
        let overrides = req.agent_overrides.expect("overrides");
        assert_eq!(overrides["code-reviewer"].model, Some(ModelType::Haiku));
    }

    #[test]
    fn single_resumable_session_needs_no_prompt() {
        let only = pipeline_ui_core::testing::session(
            "p-3",
            pipeline_ui_core::PipelineStatus::WaitingApproval,
            "",
        );
        assert_eq!(choose_session(&[only]).expect("choose"), "p-3");
        assert!(choose_session(&[]).is_err());
    }
}
