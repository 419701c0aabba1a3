use crate::theme::Theme;
use ratatui::prelude::*;

const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonVariant {
    #[default]
    Primary,
    Secondary,
    Ghost,
    Danger,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonSize {
    Sm,
    #[default]
    Md,
    Lg,
}

impl ButtonSize {
    fn padding(self) -> usize {
        match self {
            Self::Sm => 0,
            Self::Md => 1,
            Self::Lg => 2,
        }
    }
}

/// Inline action button with an optional hotkey hint, e.g. `a [ ✓ Approve ]`.
#[derive(Debug, Clone)]
pub struct Button<'a> {
    label: &'a str,
    variant: ButtonVariant,
    size: ButtonSize,
    icon: Option<&'a str>,
    hotkey: Option<&'a str>,
    loading: bool,
    disabled: bool,
    tick: u64,
}

impl<'a> Button<'a> {
    pub fn new(label: &'a str) -> Self {
        Self {
            label,
            variant: ButtonVariant::default(),
            size: ButtonSize::default(),
            icon: None,
            hotkey: None,
            loading: false,
            disabled: false,
            tick: 0,
        }
    }

    pub fn variant(mut self, variant: ButtonVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn size(mut self, size: ButtonSize) -> Self {
        self.size = size;
        self
    }

    pub fn icon(mut self, icon: &'a str) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn hotkey(mut self, key: &'a str) -> Self {
        self.hotkey = Some(key);
        self
    }

    /// Spinner replaces the icon; `tick` advances it.
    pub fn loading(mut self, loading: bool, tick: u64) -> Self {
        self.loading = loading;
        self.tick = tick;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    fn face_style(&self) -> Style {
        if self.disabled {
            return Style::new().fg(Theme::TEXT_DISABLED);
        }
        match self.variant {
            ButtonVariant::Primary => Style::new().fg(Color::Black).bg(Theme::ACCENT_BLUE).bold(),
            ButtonVariant::Secondary => Style::new().fg(Theme::TEXT_PRIMARY).bg(Theme::BORDER_NORMAL),
            ButtonVariant::Ghost => Style::new().fg(Theme::TEXT_SECONDARY).underlined(),
            ButtonVariant::Danger => Style::new().fg(Color::Black).bg(Theme::ACCENT_RED).bold(),
            ButtonVariant::Success => Style::new().fg(Color::Black).bg(Theme::ACCENT_GREEN).bold(),
        }
    }

    pub fn spans(&self) -> Vec<Span<'static>> {
        let mut spans = Vec::with_capacity(3);
        if let Some(key) = self.hotkey {
            let key_style = if self.disabled {
                Style::new().fg(Theme::TEXT_DISABLED)
            } else {
                Style::new().fg(Theme::ACCENT_YELLOW).bold()
            };
            spans.push(Span::styled(format!("{key} "), key_style));
        }

        let pad = " ".repeat(self.size.padding());
        let glyph = if self.loading {
            Some(SPINNER[(self.tick as usize) % SPINNER.len()])
        } else {
            self.icon
        };
        let face = match glyph {
            Some(glyph) => format!("{pad}{glyph} {}{pad}", self.label),
            None => format!("{pad}{}{pad}", self.label),
        };
        spans.push(Span::styled(face, self.face_style()));
        spans
    }

    pub fn width(&self) -> usize {
        self.spans().iter().map(Span::width).sum()
    }
}

impl Widget for Button<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Line::from(self.spans()).render(area, buf);
    }
}

/// Lay buttons out on one line separated by two spaces.
pub fn button_row(buttons: &[Button<'_>]) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, button) in buttons.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.extend(button.spans());
    }
    Line::from(spans)
}
