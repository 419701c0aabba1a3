use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use pipeline_ui_api_client::ApiClient;
use pipeline_ui_core::category::{CategoryFilter, EventCategory, filter_events};
use pipeline_ui_core::{
    ListSessionsParams, PipelineStatus, PipelineUiConfig, SessionSource, sort_newest_first,
};

use crate::output::{OutputFormat, event_line, print_json, session_summary, session_table};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Running,
    WaitingApproval,
    Completed,
    Failed,
}

impl From<StatusArg> for PipelineStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Running => Self::Running,
            StatusArg::WaitingApproval => Self::WaitingApproval,
            StatusArg::Completed => Self::Completed,
            StatusArg::Failed => Self::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SourceArg {
    Local,
    Merged,
}

impl From<SourceArg> for SessionSource {
    fn from(value: SourceArg) -> Self {
        match value {
            SourceArg::Local => Self::Local,
            SourceArg::Merged => Self::Merged,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CategoryArg {
    All,
    Lifecycle,
    Workflow,
    Agent,
    Tool,
    Mcp,
    Debug,
    Error,
}

impl From<CategoryArg> for CategoryFilter {
    fn from(value: CategoryArg) -> Self {
        let only = match value {
            CategoryArg::All => return Self::All,
            CategoryArg::Lifecycle => EventCategory::Lifecycle,
            CategoryArg::Workflow => EventCategory::Workflow,
            CategoryArg::Agent => EventCategory::Agent,
            CategoryArg::Tool => EventCategory::Tool,
            CategoryArg::Mcp => EventCategory::Mcp,
            CategoryArg::Debug => EventCategory::Debug,
            CategoryArg::Error => EventCategory::Error,
        };
        Self::Only(only)
    }
}

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Sessions per page; defaults to the configured page size.
    #[arg(long)]
    pub page_size: Option<u32>,

    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,

    #[arg(long, value_enum)]
    pub source: Option<SourceArg>,

    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Args)]
pub struct ShowArgs {
    pub pipeline_id: String,

    /// Only print events in this category.
    #[arg(long, value_enum, default_value = "all")]
    pub category: CategoryArg,

    /// Print the summary without the event timeline.
    #[arg(long)]
    pub no_events: bool,

    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

pub fn list_params(args: &ListArgs, default_page_size: u32) -> ListSessionsParams {
    let limit = args.page_size.unwrap_or(default_page_size).max(1);
    ListSessionsParams {
        status: args.status.map(Into::into),
        source: args.source.map(Into::into),
        limit,
        offset: args.page.saturating_sub(1) * limit,
    }
}

pub async fn list(client: &ApiClient, args: &ListArgs, default_page_size: u32) -> Result<()> {
    let params = list_params(args, default_page_size);
    let mut resp = client
        .list_sessions(&params)
        .await
        .context("list sessions")?;
    sort_newest_first(&mut resp.sessions);

    if args.format == OutputFormat::Json {
        return print_json(&resp);
    }
    if resp.sessions.is_empty() {
        println!("No sessions found");
        return Ok(());
    }
    print!("{}", session_table(&resp.sessions));
    let first = u64::from(params.offset) + 1;
    let last = u64::from(params.offset) + resp.sessions.len() as u64;
    println!("{first}-{last} of {}", resp.total);
    Ok(())
}

pub async fn show(client: &ApiClient, args: &ShowArgs, config: &PipelineUiConfig) -> Result<()> {
    let detail = client
        .get_session(&args.pipeline_id, !args.no_events)
        .await
        .with_context(|| format!("load session {}", args.pipeline_id))?;

    if args.format == OutputFormat::Json {
        return print_json(&detail);
    }
    println!("{}", session_summary(&detail));
    if let Some(turns) = detail
        .result
        .as_ref()
        .and_then(|r| r.metrics.as_ref())
        .and_then(|m| m.num_turns)
    {
        println!("  turns      {turns}");
    }
    if args.no_events {
        return Ok(());
    }
    println!();
    let events = filter_events(&detail.events, args.category.into());
    if events.is_empty() {
        println!("{}", config.labels.no_events);
    }
    for event in events {
        println!("{}", event_line(event, config));
    }
    Ok(())
}
