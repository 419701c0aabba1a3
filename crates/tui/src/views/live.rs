use crate::app::App;
use crate::theme::{Theme, connection_color};
use crate::views::badge::{Badge, BadgeVariant};
use crate::views::timeline::{RowState, event_item};
use pipeline_ui_api_client::ConnectionStatus;
use pipeline_ui_core::PipelineStatus;
use pipeline_ui_core::detail::has_details;
use ratatui::prelude::*;
use ratatui::widgets::{List, ListItem, Paragraph};

pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Theme::block_accent().title(format!(" {} ", app.config.labels.live_view_title));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [status_area, events_area] =
        Layout::vertical([Constraint::Length(2), Constraint::Fill(1)]).areas(inner);
    frame.render_widget(Paragraph::new(status_lines(app)), status_area);

    if app.live.target.is_none() {
        frame.render_widget(
            Paragraph::new("No pipeline selected")
                .style(Style::new().fg(Theme::TEXT_MUTED))
                .alignment(Alignment::Center),
            events_area,
        );
        return;
    }

    let items: Vec<ListItem> = app
        .live_events()
        .into_iter()
        .map(|event| {
            let row = RowState {
                has_details: has_details(event),
                ..RowState::default()
            };
            event_item(event, &app.config, row, events_area.width)
        })
        .collect();
    if items.is_empty() {
        let msg = match app.live.status {
            ConnectionStatus::Connecting => "Connecting...".to_string(),
            _ => app.config.labels.no_events.clone(),
        };
        frame.render_widget(
            Paragraph::new(msg)
                .style(Style::new().fg(Theme::TEXT_MUTED))
                .alignment(Alignment::Center),
            events_area,
        );
        return;
    }

    let list = List::new(items).highlight_style(Style::new().bg(Theme::BG_CURSOR));
    frame.render_stateful_widget(list, events_area, &mut app.live_list);
}

fn status_lines(app: &App) -> Vec<Line<'static>> {
    let live = &app.live;
    let connection = Badge::new(live.status.as_str())
        .variant(match live.status {
            ConnectionStatus::Connected => BadgeVariant::Success,
            ConnectionStatus::Connecting => BadgeVariant::Warning,
            ConnectionStatus::Error => BadgeVariant::Error,
            ConnectionStatus::Disconnected => BadgeVariant::Muted,
        })
        .dot(true)
        .pulse(live.status == ConnectionStatus::Connecting, app.tick)
        .span();

    let mut first = vec![connection];
    if let Some(target) = &live.target {
        first.push(Span::raw("  "));
        first.push(Span::styled(
            target.clone(),
            Style::new().fg(Theme::TEXT_PRIMARY).bold(),
        ));
    }
    if let Some(status) = &live.pipeline_status {
        let status = PipelineStatus::from(status.clone());
        first.push(Span::raw("  "));
        first.push(Badge::status(&status, &app.config.labels, app.tick).span());
    }
    first.push(Span::styled(
        format!("  {} {}", app.live_events().len(), app.config.labels.event_count),
        Style::new().fg(Theme::TEXT_SECONDARY),
    ));

    let key_style = Style::new().fg(Theme::TEXT_KEY);
    let desc_style = Style::new().fg(Theme::TEXT_KEY_DESC);
    let follow = if app.live_follow { "on" } else { "off" };
    let second = Line::from(vec![
        Span::styled("follow ", desc_style),
        Span::styled(follow, Style::new().fg(connection_color(live.status))),
        Span::styled("   c ", key_style),
        Span::styled("connect  ", desc_style),
        Span::styled("D ", key_style),
        Span::styled("disconnect  ", desc_style),
        Span::styled("x ", key_style),
        Span::styled("clear  ", desc_style),
        Span::styled("Esc ", key_style),
        Span::styled("back", desc_style),
    ]);
    vec![Line::from(first), second]
}
