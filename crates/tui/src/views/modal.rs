use crate::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Clear, Paragraph, Wrap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalSize {
    Sm,
    #[default]
    Md,
    Lg,
}

impl ModalSize {
    fn width(self) -> u16 {
        match self {
            Self::Sm => 48,
            Self::Md => 68,
            Self::Lg => 96,
        }
    }
}

/// Centered rectangle for a popup, clamped to leave a two-cell margin.
pub fn popup_area(area: Rect, size: ModalSize, height: u16) -> Rect {
    let width = size.width().min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Clear the popup area, draw its frame and return the inner area.
pub fn render_frame(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    size: ModalSize,
    height: u16,
    accent: Color,
) -> Rect {
    let popup = popup_area(area, size, height);
    frame.render_widget(Clear, popup);

    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .title(format!(" {title} "))
        .title_bottom(Line::from(" Esc close ").right_aligned())
        .border_style(Style::new().fg(accent))
        .padding(Theme::PADDING_COMPACT);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);
    inner
}

/// Yes/no confirmation dialog.
pub fn render_confirm(frame: &mut Frame, title: &str, message: &str, confirm_label: &str) {
    let inner = render_frame(
        frame,
        frame.area(),
        title,
        ModalSize::Sm,
        8,
        Theme::ACCENT_YELLOW,
    );

    let key_style = Style::new().fg(Theme::TEXT_KEY);
    let desc_style = Style::new().fg(Theme::TEXT_KEY_DESC);
    let lines = vec![
        Line::raw(""),
        Line::from(Span::styled(
            message.to_string(),
            Style::new().fg(Theme::TEXT_PRIMARY),
        )),
        Line::raw(""),
        Line::from(vec![
            Span::styled("y/Enter ", key_style),
            Span::styled(format!("{}  ", confirm_label.to_lowercase()), desc_style),
            Span::styled("n/Esc ", key_style),
            Span::styled("cancel", desc_style),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
