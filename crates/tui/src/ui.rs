use crate::app::{App, FlashLevel, Focus, Overlay, View};
use crate::theme::{Theme, connection_color};
use crate::views::{help, history, live, modal, start_modal};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

pub fn render(frame: &mut Frame, app: &mut App) {
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(frame, app, header_area);

    match app.view {
        View::History => history::render(frame, app, body_area),
        View::Live => live::render(frame, app, body_area),
    }

    render_footer(frame, app, footer_area);

    match &app.overlay {
        Some(Overlay::Help) => help::render(frame, frame.area()),
        Some(Overlay::ConfirmDelete { pipeline_id }) => modal::render_confirm(
            frame,
            "Delete session",
            &format!("Delete {pipeline_id} and all of its events?"),
            &app.config.labels.delete,
        ),
        Some(Overlay::StartPipeline) => start_modal::render(frame, app),
        None => {}
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Theme::block();
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let tab = |label: &str, active: bool| {
        if active {
            Span::styled(
                format!(" {label} "),
                Style::new().fg(Color::Black).bg(Theme::ACCENT_BLUE).bold(),
            )
        } else {
            Span::styled(format!(" {label} "), Style::new().fg(Theme::TEXT_SECONDARY))
        }
    };

    let labels = &app.config.labels;
    let mut spans = vec![
        Span::styled(" pipeline-ui ", Style::new().fg(Theme::ACCENT_ORANGE).bold()),
        Span::raw(" "),
        tab(&labels.history_view_title, app.view == View::History),
        tab(&labels.live_view_title, app.view == View::Live),
        Span::raw("  "),
    ];
    if app.list.loading && app.list.sessions.is_empty() {
        spans.push(Span::styled(
            "Loading...",
            Style::new().fg(Theme::ACCENT_YELLOW).italic(),
        ));
    } else {
        spans.push(Span::styled(
            format!("{} sessions", app.list.total),
            Style::new().fg(Theme::TEXT_SECONDARY),
        ));
    }
    if let Some(target) = &app.live.target {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("◉ ", Style::new().fg(connection_color(app.live.status))));
        spans.push(Span::styled(
            target.clone(),
            Style::new().fg(Theme::TEXT_CONTENT),
        ));
    }

    let url = Span::styled(
        app.config.api_base_url.clone(),
        Style::new().fg(Theme::TEXT_MUTED),
    );
    let [left, right] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(url.width() as u16 + 1),
    ])
    .areas(inner);
    frame.render_widget(Paragraph::new(Line::from(spans)), left);
    frame.render_widget(Paragraph::new(Line::from(url)).alignment(Alignment::Right), right);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let key_style = Style::new().fg(Theme::TEXT_KEY);
    let desc_style = Style::new().fg(Theme::TEXT_KEY_DESC);
    let hint = |spans: &mut Vec<Span<'static>>, key: &'static str, desc: &'static str| {
        spans.push(Span::styled(key, key_style));
        spans.push(Span::styled(desc, desc_style));
    };

    let mut spans = Vec::new();
    match (app.view, app.focus) {
        (View::Live, _) => {
            hint(&mut spans, " j/k ", "scroll  ");
            hint(&mut spans, "G ", "follow  ");
            hint(&mut spans, "c/D ", "connect  ");
            hint(&mut spans, "Esc ", "back  ");
        }
        (View::History, Focus::Sessions) if !app.sidebar_collapsed => {
            hint(&mut spans, " j/k ", "navigate  ");
            hint(&mut spans, "Enter ", "open  ");
            hint(&mut spans, "f ", "status  ");
            if app.list.total_pages() > 1 {
                hint(&mut spans, "[/] ", "page  ");
            }
            hint(&mut spans, "Tab ", "events  ");
        }
        (View::History, _) => {
            hint(&mut spans, " j/k ", "navigate  ");
            hint(&mut spans, "Enter ", "expand  ");
            hint(&mut spans, "Space ", "select  ");
            hint(&mut spans, "y ", "copy  ");
            hint(&mut spans, "Tab ", "sessions  ");
        }
    }
    hint(&mut spans, "n ", "new  ");
    hint(&mut spans, "? ", "help  ");
    hint(&mut spans, "q ", "quit");

    if let Some(flash) = &app.flash {
        let color = match flash.level {
            FlashLevel::Success => Theme::ACCENT_GREEN,
            FlashLevel::Error => Theme::ACCENT_RED,
            FlashLevel::Info => Theme::ACCENT_BLUE,
        };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(flash.message.clone(), Style::new().fg(color)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::test_support::buffer_to_string;
    use pipeline_ui_core::PipelineUiConfig;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 30)).expect("terminal");
        terminal.draw(|frame| render(frame, app)).expect("draw");
        buffer_to_string(terminal.backend().buffer())
    }

    #[test]
    fn header_footer_and_flash() {
        let mut app = App::new(PipelineUiConfig::new("http://localhost:3000"));
        app.set_flash("Copied link to clipboard", FlashLevel::Success);
        let text = draw(&mut app);
        assert!(text.contains("pipeline-ui"));
        assert!(text.contains("http://localhost:3000"));
        assert!(text.contains("Enter open"));
        assert!(text.contains("Copied link to clipboard"));
    }

    #[test]
    fn overlays_draw_on_top() {
        let mut app = App::new(PipelineUiConfig::new("http://localhost:3000"));
        app.overlay = Some(Overlay::ConfirmDelete {
            pipeline_id: "p-1".into(),
        });
        let text = draw(&mut app);
        assert!(text.contains("Delete p-1 and all of its events?"));

        app.overlay = Some(Overlay::Help);
        assert!(draw(&mut app).contains("Keyboard Shortcuts"));
    }

    #[test]
    fn live_view_footer() {
        let mut app = App::new(PipelineUiConfig::new("http://localhost:3000"));
        app.view = View::Live;
        let text = draw(&mut app);
        assert!(text.contains("Live Pipelines"));
        assert!(text.contains("c/D connect"));
    }
}
