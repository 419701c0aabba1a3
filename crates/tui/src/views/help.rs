use crate::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph};

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Global",
        &[
            ("n", "Start a pipeline"),
            ("?", "Toggle this help"),
            ("q", "Quit"),
        ],
    ),
    (
        "Sessions",
        &[
            ("j/k", "Navigate up/down"),
            ("g/G", "Jump to first/last"),
            ("Enter", "Open session"),
            ("f", "Cycle status filter"),
            ("[/]", "Previous/next page"),
            ("r", "Refresh"),
            ("Tab", "Switch pane"),
            ("b", "Collapse session list"),
        ],
    ),
    (
        "Session",
        &[
            ("a/x", "Approve/reject (waiting only)"),
            ("w", "Watch live (running only)"),
            ("L", "Back to live view"),
            ("s", "Copy share link"),
            ("d", "Delete session"),
        ],
    ),
    (
        "Events",
        &[
            ("Enter", "Expand/collapse details"),
            ("c", "Cycle category filter"),
            ("Space", "Toggle selection"),
            ("v", "Select range from anchor"),
            ("A", "Select all"),
            ("y", "Copy selected as JSON"),
            ("l", "Copy first link"),
            ("Esc", "Clear selection"),
        ],
    ),
    (
        "Live",
        &[
            ("c/D", "Connect/disconnect"),
            ("x", "Clear events"),
            ("G", "Follow newest"),
            ("Esc/h", "Back to history"),
        ],
    ),
];

pub fn render(frame: &mut Frame, area: Rect) {
    let popup_width = 60u16.min(area.width.saturating_sub(4));
    let popup_height = 36u16.min(area.height.saturating_sub(4));
    let x = (area.width.saturating_sub(popup_width)) / 2;
    let y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(x, y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let block = Theme::block_accent()
        .title(" Keyboard Shortcuts ")
        .padding(Theme::PADDING_CARD);
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let key_style = Style::new().fg(Theme::ACCENT_YELLOW).bold();
    let desc_style = Style::new().fg(Theme::TEXT_CONTENT);
    let header_style = Style::new().fg(Theme::ACCENT_BLUE).bold();
    let close_hint_line = Line::from(Span::styled(
        "Press any key to close",
        Style::new().fg(Color::DarkGray),
    ));

    let mut lines = Vec::new();
    for (title, keys) in SECTIONS {
        lines.push(Line::from(Span::styled(format!("── {title} ──"), header_style)));
        for (key, desc) in *keys {
            lines.push(Line::from(vec![
                Span::styled(format!("  {key:<10}"), key_style),
                Span::styled(*desc, desc_style),
            ]));
        }
        lines.push(Line::raw(""));
    }
    lines.push(close_hint_line.clone());

    // Keep close hint visible even when the help body exceeds the popup height.
    let max_lines = inner.height as usize;
    if max_lines == 0 {
        return;
    }
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            *last = close_hint_line;
        }
    }

    frame.render_widget(Paragraph::new(lines), inner);
}
