use anyhow::{Context, Result};
use pipeline_ui_core::format::{
    format_cost, format_date_time, format_duration, format_time, status_label, truncate,
};
use pipeline_ui_core::links::LinkKind;
use pipeline_ui_core::{PipelineEvent, PipelineUiConfig, Session, SessionDetail, classify_event};
use serde::Serialize;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{json}");
    Ok(())
}

const TITLE_WIDTH: usize = 48;

/// Fixed-width session table with a header row.
pub fn session_table(sessions: &[Session]) -> String {
    let mut out = format!(
        "{:<24} {:<18} {:<14} {:<22} {:>8}  {}\n",
        "PIPELINE", "STATUS", "WORKFLOW", "CREATED", "COST", "TITLE"
    );
    for s in sessions {
        let workflow = s.workflow_type.as_ref().map(|w| w.label()).unwrap_or("-");
        out.push_str(&format!(
            "{:<24} {:<18} {:<14} {:<22} {:>8}  {}\n",
            truncate(&s.pipeline_id, 24),
            status_label(&s.status),
            workflow,
            format_date_time(s.created_at.as_deref()),
            format_cost(s.cost),
            truncate(s.display_title(), TITLE_WIDTH),
        ));
    }
    out
}

/// Summary block for one session.
pub fn session_summary(detail: &SessionDetail) -> String {
    let s = &detail.session;
    let mut lines = vec![
        format!("{}  [{}]", s.display_title(), status_label(&s.status)),
        format!("  pipeline   {}", s.pipeline_id),
    ];
    if let Some(task) = &s.task_id {
        lines.push(format!("  task       {task}"));
    }
    if let Some(workflow) = &s.workflow_type {
        lines.push(format!("  workflow   {}", workflow.label()));
    }
    lines.push(format!("  started    {}", format_date_time(s.created_at.as_deref())));
    if s.duration.is_some() {
        lines.push(format!("  duration   {}", format_duration(s.duration)));
    }
    if s.cost.is_some() {
        lines.push(format!("  cost       {}", format_cost(s.cost)));
    }
    if let Some(pr) = &s.pr_url {
        lines.push(format!("  pr         {pr}"));
    }
    lines.push(format!("  events     {}", detail.events.len()));
    lines.join("\n")
}

/// One timeline line: time, icon, title, subtitle, turn and links.
pub fn event_line(event: &PipelineEvent, config: &PipelineUiConfig) -> String {
    let model = classify_event(event, config.links.task_url.as_deref());
    let mut line = format!(
        "{}  {} {}",
        format_time(Some(&event.timestamp)),
        model.icon,
        model.title
    );
    if let Some(subtitle) = &model.subtitle {
        line.push_str(&format!("  {subtitle}"));
    }
    if let Some(turn) = event.display_turn() {
        line.push_str(&format!("  T{turn}"));
    }
    for link in &model.links {
        let url = match link.kind {
            LinkKind::VcsPr => config.pr_url(&link.url),
            _ => link.url.clone(),
        };
        line.push_str(&format!("  {} {url}", link.kind.icon()));
    }
    line
}
