//! One timeline row per event: icon, title, subtitle, inline links, time and
//! turn, plus the expanded detail block when the row is open.

use crate::theme::{Theme, event_color};
use pipeline_ui_core::detail::{EventDetail, render_detail};
use pipeline_ui_core::format::format_time;
use pipeline_ui_core::links::{INLINE_LINK_LIMIT, LinkKind, overflow_count};
use pipeline_ui_core::{EventRenderModel, PipelineEvent, PipelineUiConfig, classify_event};
use ratatui::prelude::*;
use ratatui::widgets::ListItem;
use unicode_width::UnicodeWidthStr;

const DETAIL_INDENT: &str = "    ";
const DETAIL_MAX_LINES: usize = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowState {
    pub expanded: bool,
    pub selected: bool,
    pub has_details: bool,
}

pub fn event_item(
    event: &PipelineEvent,
    config: &PipelineUiConfig,
    row: RowState,
    width: u16,
) -> ListItem<'static> {
    let model = classify_event(event, config.links.task_url.as_deref());
    let mut lines = vec![header_line(event, &model, row, width)];
    if row.expanded {
        let detail = detail_lines(&render_detail(event));
        let clipped = detail.len() > DETAIL_MAX_LINES;
        lines.extend(detail.into_iter().take(DETAIL_MAX_LINES));
        if clipped {
            lines.push(Line::styled(
                format!("{DETAIL_INDENT}..."),
                Style::new().fg(Theme::TEXT_MUTED),
            ));
        }
    }
    ListItem::new(lines)
}

pub fn header_line(
    event: &PipelineEvent,
    model: &EventRenderModel,
    row: RowState,
    width: u16,
) -> Line<'static> {
    let color = event_color(model.color_class);
    let dim = model.is_minor;
    let title_style = if dim {
        Style::new().fg(Theme::TEXT_MUTED)
    } else {
        Style::new().fg(color).bold()
    };
    let sub_style = Style::new().fg(if dim {
        Theme::TEXT_DISABLED
    } else {
        Theme::TEXT_SECONDARY
    });

    let mut left = vec![
        Span::styled(
            if row.selected { "■ " } else { "  " },
            Style::new().fg(Theme::ACCENT_BLUE),
        ),
        Span::styled(format!("{} ", model.icon), Style::new().fg(color)),
        Span::styled(model.title.clone(), title_style),
    ];
    if let Some(subtitle) = &model.subtitle {
        left.push(Span::styled(format!("  {subtitle}"), sub_style));
    }
    for link in model.links.iter().take(INLINE_LINK_LIMIT) {
        let link_color = match link.kind {
            LinkKind::TaskRef => Theme::ACCENT_PURPLE,
            LinkKind::VcsPr | LinkKind::VcsCommit => Theme::ACCENT_BLUE,
        };
        left.push(Span::raw("  "));
        left.push(Span::styled(
            format!("{} {}", link.kind.icon(), link.label),
            Style::new().fg(link_color).underlined(),
        ));
    }
    let extra = overflow_count(&model.links);
    if extra > 0 {
        left.push(Span::styled(
            format!(" +{extra}"),
            Style::new().fg(Theme::TEXT_SECONDARY),
        ));
    }

    let mut right = format_time(Some(&event.timestamp));
    if let Some(turn) = event.display_turn() {
        right.push_str(&format!("  T{turn}"));
    }
    if row.has_details {
        right.push_str(if row.expanded { " ▾" } else { " ▸" });
    } else {
        right.push_str("  ");
    }

    let used: usize = left.iter().map(|s| s.content.width()).sum();
    let gap = usize::from(width).saturating_sub(used + right.width()).max(2);
    left.push(Span::raw(" ".repeat(gap)));
    left.push(Span::styled(right, Style::new().fg(Theme::TEXT_MUTED)));
    Line::from(left)
}

fn indented(text: &str, style: Style) -> Vec<Line<'static>> {
    text.lines()
        .map(|line| Line::styled(format!("{DETAIL_INDENT}{line}"), style))
        .collect()
}

fn prefixed(text: &str, prefix: &str, style: Style) -> Vec<Line<'static>> {
    text.lines()
        .map(|line| Line::styled(format!("{DETAIL_INDENT}{prefix}{line}"), style))
        .collect()
}

fn markdown(source: &str) -> Vec<Line<'static>> {
    let content = Style::new().fg(Theme::TEXT_CONTENT);
    source
        .lines()
        .map(|line| {
            let style = if line.trim_start().starts_with('#') {
                Style::new().fg(Theme::TEXT_PRIMARY).bold()
            } else {
                content
            };
            Line::styled(format!("{DETAIL_INDENT}{line}"), style)
        })
        .collect()
}

/// Terminal rendering of an expanded event body.
pub fn detail_lines(detail: &EventDetail) -> Vec<Line<'static>> {
    let content = Style::new().fg(Theme::TEXT_CONTENT);
    match detail {
        EventDetail::Markdown(block) => markdown(&block.source),
        EventDetail::Thinking(text) => {
            indented(text, Style::new().fg(Theme::ACCENT_PURPLE).italic())
        }
        EventDetail::Diff {
            file_path,
            removed,
            added,
        } => {
            let mut lines = Vec::new();
            if let Some(path) = file_path {
                lines.push(Line::styled(
                    format!("{DETAIL_INDENT}{path}"),
                    Style::new().fg(Theme::TEXT_SECONDARY).bold(),
                ));
            }
            if let Some(removed) = removed {
                lines.extend(prefixed(removed, "- ", Style::new().fg(Theme::DIFF_REMOVED)));
            }
            if let Some(added) = added {
                lines.extend(prefixed(added, "+ ", Style::new().fg(Theme::DIFF_ADDED)));
            }
            lines
        }
        EventDetail::Shell { command } => {
            prefixed(command, "$ ", Style::new().fg(Theme::ACCENT_GREEN))
        }
        EventDetail::Prompt(prompt) => indented(prompt, content),
        EventDetail::Review {
            verdict,
            verdict_label,
            body,
        } => {
            let mut lines = Vec::new();
            let label = verdict_label
                .map(str::to_string)
                .or_else(|| verdict.clone());
            if let Some(label) = label {
                lines.push(Line::styled(
                    format!("{DETAIL_INDENT}{label}"),
                    Style::new().fg(Theme::ACCENT_YELLOW).bold(),
                ));
            }
            if let Some(body) = body {
                lines.extend(markdown(&body.source));
            }
            lines
        }
        EventDetail::Audit { outcome, report } => {
            let mut lines = vec![Line::styled(
                format!("{DETAIL_INDENT}Outcome: {outcome}"),
                Style::new().fg(Theme::ACCENT_ORANGE).bold(),
            )];
            lines.extend(markdown(&report.source));
            lines
        }
        EventDetail::Json(json) => indented(json, Style::new().fg(Theme::TEXT_SECONDARY)),
    }
}
