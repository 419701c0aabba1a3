use crate::app::{App, StartField};
use crate::theme::Theme;
use crate::views::button::{Button, ButtonSize, ButtonVariant};
use crate::views::modal::{ModalSize, render_frame};
use pipeline_ui_core::start_form::{AGENTS, StartForm};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

const LABEL_WIDTH: usize = 16;

pub fn render(frame: &mut Frame, app: &App) {
    let form = &app.start_form;
    let focused = app.current_start_field();
    let fields = StartField::visible(form);
    // Field rows, a blank line and the hint, plus the error line when present.
    let height = fields.len() as u16 + 6 + u16::from(app.start_error.is_some());
    let inner = render_frame(
        frame,
        frame.area(),
        "Start Pipeline",
        ModalSize::Lg,
        height,
        Theme::BORDER_ACCENT,
    );

    let mut lines: Vec<Line> = fields
        .iter()
        .map(|field| field_line(*field, form, *field == focused, app))
        .collect();
    if let Some(err) = &app.start_error {
        lines.push(Line::styled(
            format!("  ✗ {err}"),
            Style::new().fg(Theme::ACCENT_RED),
        ));
    }
    lines.push(Line::raw(""));
    let key_style = Style::new().fg(Theme::TEXT_KEY);
    let desc_style = Style::new().fg(Theme::TEXT_KEY_DESC);
    lines.push(Line::from(vec![
        Span::styled("Tab/↑↓ ", key_style),
        Span::styled("field  ", desc_style),
        Span::styled("←/→/Space ", key_style),
        Span::styled("change  ", desc_style),
        Span::styled("Enter ", key_style),
        Span::styled("start", desc_style),
    ]));

    frame.render_widget(Paragraph::new(lines), inner);
}

fn field_line(field: StartField, form: &StartForm, focused: bool, app: &App) -> Line<'static> {
    let marker = if focused { "› " } else { "  " };
    let marker_style = Style::new().fg(Theme::ACCENT_BLUE).bold();
    let label_style = if focused {
        Style::new().fg(Theme::TEXT_PRIMARY).bold()
    } else {
        Style::new().fg(Theme::TEXT_SECONDARY)
    };
    let value_style = Style::new().fg(Theme::TEXT_CONTENT);
    let hint_style = Style::new().fg(Theme::TEXT_MUTED);

    let labelled = |label: &str, value: Vec<Span<'static>>| {
        let mut spans = vec![
            Span::styled(marker, marker_style),
            Span::styled(format!("{label:<LABEL_WIDTH$}"), label_style),
        ];
        spans.extend(value);
        Line::from(spans)
    };

    match field {
        StartField::Task => {
            let mut value = if form.task_input.is_empty() && !focused {
                vec![Span::styled("Task ID or URL", hint_style)]
            } else {
                vec![Span::styled(form.task_input.clone(), value_style)]
            };
            if focused {
                value.push(Span::styled("_", Style::new().fg(Theme::ACCENT_YELLOW)));
            }
            labelled("Task", value)
        }
        StartField::Workflow => labelled(
            "Workflow",
            choice(
                form.workflow_type.label(),
                form.workflow_type.description(),
                focused,
            ),
        ),
        StartField::Mode => labelled(
            "Mode",
            choice(
                form.execution_mode.label(),
                form.execution_mode.description(),
                focused,
            ),
        ),
        StartField::AutoCreatePr => labelled("Create PR", checkbox(form.auto_create_pr)),
        StartField::AutoReview => labelled("Auto review", checkbox(form.auto_review)),
        StartField::Budget => {
            let mut value = vec![Span::styled(format!("$ {}", form.max_budget), value_style)];
            if focused {
                value.push(Span::styled("_", Style::new().fg(Theme::ACCENT_YELLOW)));
            }
            labelled("Max budget", value)
        }
        StartField::Verbosity => {
            labelled("Verbosity", choice(form.verbosity.label(), "", focused))
        }
        StartField::Advanced => {
            let chevron = if form.show_advanced { "▾" } else { "▸" };
            Line::from(vec![
                Span::styled(marker, marker_style),
                Span::styled(format!("{chevron} Agent models"), label_style),
            ])
        }
        StartField::Agent(i) => {
            let agent = &AGENTS[i];
            let model = match form.agent_model(agent.id) {
                Some(model) => Span::styled(model.label(), value_style),
                None => Span::styled(
                    format!("Default ({})", agent.default_model.label()),
                    hint_style,
                ),
            };
            labelled(&format!("  {}", agent.label), vec![model])
        }
        StartField::Submit => {
            let button = Button::new("Start Pipeline")
                .variant(ButtonVariant::Primary)
                .size(ButtonSize::Md)
                .icon("▶")
                .loading(app.submitting, app.tick)
                .disabled(app.submitting);
            let mut spans = vec![Span::styled(marker, marker_style)];
            spans.extend(button.spans());
            Line::from(spans)
        }
    }
}

fn choice(label: &str, description: &str, focused: bool) -> Vec<Span<'static>> {
    let arrows = Style::new().fg(if focused {
        Theme::ACCENT_YELLOW
    } else {
        Theme::TEXT_DISABLED
    });
    let mut spans = vec![
        Span::styled("‹ ", arrows),
        Span::styled(label.to_string(), Style::new().fg(Theme::TEXT_CONTENT)),
        Span::styled(" ›", arrows),
    ];
    if !description.is_empty() {
        spans.push(Span::styled(
            format!("  {description}"),
            Style::new().fg(Theme::TEXT_MUTED),
        ));
    }
    spans
}

fn checkbox(checked: bool) -> Vec<Span<'static>> {
    let (mark, color) = if checked {
        ("[x]", Theme::ACCENT_GREEN)
    } else {
        ("[ ]", Theme::TEXT_SECONDARY)
    };
    vec![Span::styled(mark, Style::new().fg(color))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Overlay;
    use crate::views::test_support::buffer_to_string;
    use pipeline_ui_core::PipelineUiConfig;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(110, 40)).expect("terminal");
        terminal.draw(|frame| render(frame, app)).expect("draw");
        buffer_to_string(terminal.backend().buffer())
    }

    fn open_app() -> App {
        let mut app = App::new(PipelineUiConfig::new("http://localhost:3000"));
        app.overlay = Some(Overlay::StartPipeline);
        app
    }

    #[test]
    fn shows_form_fields_and_defaults() {
        let app = open_app();
        let text = draw(&app);
        assert!(text.contains("Start Pipeline"));
        assert!(text.contains("Task"));
        assert!(text.contains("Resolve Task"));
        assert!(text.contains("$ 10.00"));
        assert!(text.contains("[x]"));
        assert!(text.contains("▸ Agent models"));
        assert!(!text.contains("Code Executor"));
    }

    #[test]
    fn advanced_section_lists_agents() {
        let mut app = open_app();
        app.start_form.show_advanced = true;
        app.start_form.set_agent_model(&AGENTS[3], Some(pipeline_ui_core::ModelType::Haiku));
        let text = draw(&app);
        assert!(text.contains("Code Executor"));
        assert!(text.contains("Default (Haiku)"), "task evaluator default");
        assert!(text.contains("Haiku"));
    }

    #[test]
    fn error_line_is_rendered() {
        let mut app = open_app();
        app.start_error = Some("Please enter a task ID or URL".into());
        assert!(draw(&app).contains("✗ Please enter a task ID or URL"));
    }
}
