//! Session history: session list on the left, the open session on the right.

use crate::app::{App, Focus};
use crate::theme::Theme;
use crate::views::badge::Badge;
use crate::views::button::{Button, ButtonVariant, button_row};
use crate::views::timeline::{RowState, event_item};
use pipeline_ui_core::category::{CategoryFilter, StatusFilter};
use pipeline_ui_core::detail::has_details;
use pipeline_ui_core::format::{format_cost, format_date, format_date_time, format_duration, truncate};
use pipeline_ui_core::{PipelineStatus, Session, SessionDetail};
use ratatui::prelude::*;
use ratatui::widgets::{List, ListItem, Paragraph, Wrap};

const SIDEBAR_WIDTH: u16 = 44;

pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    if app.sidebar_collapsed {
        render_detail(frame, app, area);
        return;
    }
    let [left, right] =
        Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Fill(1)]).areas(area);
    render_sessions(frame, app, left);
    render_detail(frame, app, right);
}

// ── Session list ──────────────────────────────────────────────────────

fn render_sessions(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Theme::pane(app.focus == Focus::Sessions)
        .title(format!(" {} ", app.config.labels.history_view_title))
        .title_bottom(Line::from(" b collapse ").right_aligned());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [chips_area, list_area, pager_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    frame.render_widget(
        Paragraph::new(status_chips(&app.status_filter)).wrap(Wrap { trim: true }),
        chips_area,
    );
    frame.render_widget(pager_line(app), pager_area);

    if app.list.sessions.is_empty() {
        let labels = &app.config.labels;
        let (msg, color) = if let Some(err) = &app.list.error {
            (format!("Error: {err}"), Theme::ACCENT_RED)
        } else if app.list.loading {
            (labels.loading_sessions.clone(), Theme::TEXT_SECONDARY)
        } else {
            (labels.no_sessions_found.clone(), Theme::TEXT_MUTED)
        };
        frame.render_widget(
            Paragraph::new(msg)
                .style(Style::new().fg(color))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            list_area,
        );
        return;
    }

    let open = app.detail.target.as_deref();
    let width = usize::from(list_area.width);
    let items: Vec<ListItem> = app
        .list
        .sessions
        .iter()
        .map(|s| session_item(s, open == Some(s.pipeline_id.as_str()), app, width))
        .collect();
    let list = List::new(items).highlight_style(Style::new().bg(Theme::BG_CURSOR));
    frame.render_stateful_widget(list, list_area, &mut app.session_list);
}

fn status_chips(current: &StatusFilter) -> Line<'static> {
    let mut spans = Vec::new();
    for choice in StatusFilter::choices() {
        let style = if &choice == current {
            Style::new().fg(Color::Black).bg(Theme::ACCENT_BLUE).bold()
        } else {
            Style::new().fg(Theme::TEXT_SECONDARY)
        };
        spans.push(Span::styled(format!(" {} ", choice.label()), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn session_item(session: &Session, open: bool, app: &App, width: usize) -> ListItem<'static> {
    let badge = Badge::status(&session.status, &app.config.labels, app.tick).span();
    let title_width = width.saturating_sub(badge.width() + 3);
    let marker = if open { "▌" } else { " " };
    let title_style = if open {
        Style::new().fg(Theme::TEXT_PRIMARY).bold()
    } else {
        Style::new().fg(Theme::TEXT_CONTENT)
    };
    let title = Line::from(vec![
        Span::styled(marker, Style::new().fg(Theme::ACCENT_BLUE)),
        Span::styled(truncate(session.display_title(), title_width), title_style),
        Span::raw(" "),
        badge,
    ]);

    let mut meta = Vec::new();
    if let Some(workflow) = &session.workflow_type {
        meta.push(workflow.label().to_string());
    }
    if session.created_at.is_some() {
        meta.push(format_date(session.created_at.as_deref()));
    }
    if session.cost.is_some() {
        meta.push(format_cost(session.cost));
    }
    let meta = Line::styled(
        format!(" {}", meta.join(" · ")),
        Style::new().fg(Theme::TEXT_MUTED),
    );
    ListItem::new(vec![title, meta])
}

fn pager_line(app: &App) -> Paragraph<'static> {
    let key_style = Style::new().fg(Theme::TEXT_KEY);
    let desc_style = Style::new().fg(Theme::TEXT_KEY_DESC);
    let prev = if app.list.page > 0 { key_style } else { desc_style };
    let next = if app.list.has_next_page() {
        key_style
    } else {
        desc_style
    };
    let mut spans = vec![
        Span::styled("[ ", prev),
        Span::styled(app.page_label(), Style::new().fg(Theme::TEXT_SECONDARY)),
        Span::styled(" ]", next),
    ];
    if app.list.loading && !app.list.sessions.is_empty() {
        spans.push(Span::styled("  loading…", desc_style));
    }
    Paragraph::new(Line::from(spans)).alignment(Alignment::Center)
}

// ── Session detail ────────────────────────────────────────────────────

fn render_detail(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Theme::pane(app.focus == Focus::Events || app.sidebar_collapsed);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let message = match (&app.detail.target, &app.detail.session, &app.detail.error) {
        (None, _, _) => Some((
            app.config.labels.select_session_prompt.clone(),
            Theme::TEXT_MUTED,
        )),
        (Some(_), None, Some(err)) => Some((format!("Error: {err}"), Theme::ACCENT_RED)),
        (Some(_), None, None) => Some(("Loading session...".to_string(), Theme::TEXT_SECONDARY)),
        _ => None,
    };
    if let Some((msg, color)) = message {
        let [_, centered, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .areas(inner);
        frame.render_widget(
            Paragraph::new(msg)
                .style(Style::new().fg(color))
                .alignment(Alignment::Center),
            centered,
        );
        return;
    }
    let Some(detail) = app.detail.session.as_ref() else {
        return;
    };

    let [
        header_area,
        meta_area,
        actions_area,
        stats_area,
        chips_area,
        toolbar_area,
        events_area,
    ] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(2),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Fill(1),
    ])
    .areas(inner);

    frame.render_widget(header_line(app, detail), header_area);
    frame.render_widget(meta_line(detail), meta_area);
    frame.render_widget(action_buttons(app, &detail.session), actions_area);
    render_stats(frame, detail, stats_area);
    frame.render_widget(chips_line(app, detail), chips_area);
    frame.render_widget(selection_toolbar(app), toolbar_area);
    render_events(frame, app, events_area);
}

fn header_line(app: &App, detail: &SessionDetail) -> Line<'static> {
    let session = &detail.session;
    let mut spans = vec![
        Badge::status(&session.status, &app.config.labels, app.tick).span(),
        Span::raw(" "),
        Span::styled(
            session.display_title().to_string(),
            Style::new().fg(Theme::TEXT_PRIMARY).bold(),
        ),
    ];
    if app.detail.loading {
        spans.push(Span::styled("  ↻", Style::new().fg(Theme::TEXT_MUTED)));
    }
    if let Some(err) = &app.detail.error {
        spans.push(Span::styled(
            format!("  {err}"),
            Style::new().fg(Theme::ACCENT_RED),
        ));
    }
    Line::from(spans)
}

fn meta_line(detail: &SessionDetail) -> Line<'static> {
    let session = &detail.session;
    let muted = Style::new().fg(Theme::TEXT_MUTED);
    let value = Style::new().fg(Theme::TEXT_SECONDARY);
    let mut spans = Vec::new();
    if let Some(workflow) = &session.workflow_type {
        spans.push(Span::styled(workflow.label().to_string(), value));
        spans.push(Span::styled("  ·  ", muted));
    }
    spans.push(Span::styled("Started ", muted));
    spans.push(Span::styled(
        format_date_time(session.created_at.as_deref()),
        value,
    ));
    if let Some(ms) = duration_ms(detail) {
        spans.push(Span::styled("  ·  ", muted));
        spans.push(Span::styled(format_duration(Some(ms)), value));
    }
    spans.push(Span::styled("  ·  ", muted));
    spans.push(Span::styled(session.pipeline_id.clone(), muted));
    Line::from(spans)
}

fn action_buttons(app: &App, session: &Session) -> Paragraph<'static> {
    let features = &app.config.features;
    let labels = &app.config.labels;
    let mut buttons = Vec::new();
    if features.allow_share_links {
        buttons.push(
            Button::new(&labels.copy_link)
                .variant(ButtonVariant::Ghost)
                .hotkey("s"),
        );
    }
    if features.enable_live_view && session.status == PipelineStatus::Running {
        buttons.push(
            Button::new(&labels.watch_live)
                .variant(ButtonVariant::Primary)
                .icon("◉")
                .hotkey("w"),
        );
    }
    if features.allow_approval && session.status == PipelineStatus::WaitingApproval {
        buttons.push(
            Button::new(&labels.approve)
                .variant(ButtonVariant::Success)
                .loading(app.busy, app.tick)
                .disabled(app.busy)
                .hotkey("a"),
        );
        buttons.push(
            Button::new(&labels.reject)
                .variant(ButtonVariant::Danger)
                .disabled(app.busy)
                .hotkey("x"),
        );
    }
    if features.allow_delete {
        buttons.push(
            Button::new(&labels.delete)
                .variant(ButtonVariant::Secondary)
                .disabled(app.busy)
                .hotkey("d"),
        );
    }
    Paragraph::new(button_row(&buttons))
}

fn duration_ms(detail: &SessionDetail) -> Option<u64> {
    detail.session.duration.or_else(|| {
        detail
            .result
            .as_ref()
            .and_then(|r| r.metrics.as_ref())
            .and_then(|m| m.duration_ms)
    })
}

fn render_stats(frame: &mut Frame, detail: &SessionDetail, area: Rect) {
    let metrics = detail.result.as_ref().and_then(|r| r.metrics.as_ref());
    let cost = detail
        .session
        .cost
        .or_else(|| metrics.and_then(|m| m.total_cost_usd));
    let events = detail
        .session
        .event_count
        .unwrap_or(detail.events.len() as u64);
    let turns = metrics
        .and_then(|m| m.num_turns)
        .map_or_else(|| "-".to_string(), |n| n.to_string());
    let cards = [
        ("Events", events.to_string(), Theme::ACCENT_BLUE),
        ("Cost", format_cost(cost), Theme::ACCENT_GREEN),
        ("Duration", format_duration(duration_ms(detail)), Theme::ACCENT_YELLOW),
        ("Turns", turns, Theme::ACCENT_PURPLE),
    ];

    let areas = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(area);
    for ((title, value, color), card_area) in cards.into_iter().zip(areas.iter()) {
        let block = Theme::block_dim().title(Span::styled(
            format!(" {title} "),
            Style::new().fg(Theme::TEXT_MUTED),
        ));
        frame.render_widget(
            Paragraph::new(Span::styled(value, Style::new().fg(color).bold()))
                .block(block)
                .alignment(Alignment::Center),
            *card_area,
        );
    }
}

fn chips_line(app: &App, detail: &SessionDetail) -> Line<'static> {
    let mut spans = Vec::new();
    for choice in CategoryFilter::CHOICES {
        let style = if choice == app.category_filter {
            Style::new().fg(Color::Black).bg(Theme::ACCENT_PURPLE).bold()
        } else {
            Style::new().fg(Theme::TEXT_SECONDARY)
        };
        spans.push(Span::styled(format!(" {} ", choice.label()), style));
    }
    let pr_url = detail.session.pr_url.clone().or_else(|| {
        detail
            .result
            .as_ref()
            .and_then(|r| r.execution.as_ref())
            .and_then(|e| e.pr_url.clone())
    });
    if let Some(url) = pr_url {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(
            format!("🔀 {}", app.config.pr_url(&url)),
            Style::new().fg(Theme::ACCENT_BLUE).underlined(),
        ));
    }
    Line::from(spans)
}

fn selection_toolbar(app: &App) -> Line<'static> {
    let key_style = Style::new().fg(Theme::TEXT_KEY);
    let desc_style = Style::new().fg(Theme::TEXT_KEY_DESC);
    if app.selection.is_empty() {
        return Line::from(vec![
            Span::styled("Space ", key_style),
            Span::styled("select  ", desc_style),
            Span::styled("Enter ", key_style),
            Span::styled("expand  ", desc_style),
            Span::styled("c ", key_style),
            Span::styled("category", desc_style),
        ]);
    }
    Line::from(vec![
        Span::styled(
            format!(" {} selected ", app.selection.len()),
            Style::new().fg(Color::Black).bg(Theme::ACCENT_BLUE).bold(),
        ),
        Span::raw("  "),
        Span::styled("y ", key_style),
        Span::styled("copy JSON  ", desc_style),
        Span::styled("A ", key_style),
        Span::styled("all  ", desc_style),
        Span::styled("Esc ", key_style),
        Span::styled("clear", desc_style),
    ])
}

fn render_events(frame: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem> = app
        .visible_events()
        .into_iter()
        .enumerate()
        .map(|(i, event)| {
            let row = RowState {
                expanded: app.expanded.contains(&i),
                selected: app.selection.is_selected(i),
                has_details: has_details(event),
            };
            event_item(event, &app.config, row, area.width)
        })
        .collect();

    if items.is_empty() {
        frame.render_widget(
            Paragraph::new(app.config.labels.no_events.clone())
                .style(Style::new().fg(Theme::TEXT_MUTED))
                .alignment(Alignment::Center),
            area,
        );
        return;
    }

    let highlight = if app.focus == Focus::Events || app.sidebar_collapsed {
        Style::new().bg(Theme::BG_CURSOR)
    } else {
        Style::new().bg(Theme::BG_SELECTED)
    };
    let list = List::new(items).highlight_style(highlight);
    frame.render_stateful_widget(list, area, &mut app.event_list);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::test_support::buffer_to_string;
    use pipeline_ui_api_client::{SessionDetailState, SessionListState};
    use pipeline_ui_core::PipelineUiConfig;
    use pipeline_ui_core::testing::{event, session, session_detail};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use serde_json::json;

    fn draw(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("terminal");
        terminal
            .draw(|frame| {
                let area = frame.area();
                render(frame, app, area);
            })
            .expect("draw");
        buffer_to_string(terminal.backend().buffer())
    }

    fn app_with(config: PipelineUiConfig, status: PipelineStatus) -> App {
        let mut app = App::new(config);
        let mut first = session("p-1", status.clone(), "2026-01-05T10:00:00Z");
        first.task_title = Some("Fix login redirect".into());
        first.cost = Some(1.5);
        let mut list = SessionListState::default();
        list.sessions = vec![first, session("p-0", PipelineStatus::Completed, "2026-01-04T10:00:00Z")];
        list.total = 2;
        list.loading = false;
        app.sync_list(list);

        let mut detail = session_detail(
            "p-1",
            status,
            vec![
                event("started", json!({})),
                event("tool_start", json!({ "toolName": "Read" })),
            ],
        );
        detail.session.task_title = Some("Fix login redirect".into());
        app.sync_detail(SessionDetailState {
            target: Some("p-1".into()),
            session: Some(detail),
            loading: false,
            error: None,
        });
        app
    }

    #[test]
    fn lists_sessions_with_pagination() {
        let mut app = app_with(
            PipelineUiConfig::new("http://localhost:3000"),
            PipelineStatus::Completed,
        );
        let text = draw(&mut app, 140, 30);
        assert!(text.contains("Session History"));
        assert!(text.contains("Fix login redirect"));
        assert!(text.contains("p-0"));
        assert!(text.contains("1-2 of 2"));
        assert!(text.contains("Running"), "status chip row");
    }

    #[test]
    fn waiting_session_shows_approval_actions() {
        let mut app = app_with(
            PipelineUiConfig::new("http://localhost:3000"),
            PipelineStatus::WaitingApproval,
        );
        let text = draw(&mut app, 140, 30);
        assert!(text.contains("Approve"));
        assert!(text.contains("Reject"));
        assert!(text.contains("Delete"));
        assert!(!text.contains("Watch Live"));
        assert!(text.contains("Events"));
    }

    #[test]
    fn feature_flags_hide_actions() {
        let mut config = PipelineUiConfig::new("http://localhost:3000");
        config.features.allow_approval = false;
        config.features.allow_delete = false;
        let mut app = app_with(config, PipelineStatus::WaitingApproval);
        let text = draw(&mut app, 140, 30);
        assert!(!text.contains("Approve"));
        assert!(!text.contains("Delete"));
        assert!(text.contains("Share"));
    }

    #[test]
    fn running_session_offers_watch() {
        let mut app = app_with(
            PipelineUiConfig::new("http://localhost:3000"),
            PipelineStatus::Running,
        );
        assert!(draw(&mut app, 140, 30).contains("Watch Live"));
    }

    #[test]
    fn empty_states() {
        let mut app = App::new(PipelineUiConfig::new("http://localhost:3000"));
        let text = draw(&mut app, 120, 20);
        assert!(text.contains("Loading sessions..."));
        assert!(text.contains("Select a session to view details"));

        let mut list = SessionListState::default();
        list.loading = false;
        app.sync_list(list);
        assert!(draw(&mut app, 120, 20).contains("No sessions found"));
    }

    #[test]
    fn selection_toolbar_counts_selected_events() {
        let mut app = app_with(
            PipelineUiConfig::new("http://localhost:3000"),
            PipelineStatus::Completed,
        );
        app.selection.select_all(2);
        assert!(draw(&mut app, 140, 30).contains("2 selected"));
    }

    #[test]
    fn collapsed_sidebar_gives_detail_full_width() {
        let mut app = app_with(
            PipelineUiConfig::new("http://localhost:3000"),
            PipelineStatus::Completed,
        );
        app.sidebar_collapsed = true;
        let text = draw(&mut app, 140, 30);
        assert!(!text.contains("Session History"));
        assert!(text.contains("Fix login redirect"));
    }
}
