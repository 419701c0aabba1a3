use pipeline_ui_core::ColorClass;
use pipeline_ui_core::format::{StatusTone, status_tone};
use pipeline_ui_core::PipelineStatus;
use pipeline_ui_api_client::ConnectionStatus;
use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Padding};

pub struct Theme;

impl Theme {
    // ── Background ───────────────────────────────────────────────────
    pub const BG_SURFACE: Color = Color::Rgb(30, 35, 50);
    pub const BG_SELECTED: Color = Color::Rgb(40, 48, 68);
    pub const BG_CURSOR: Color = Color::Rgb(50, 58, 80);

    // ── Border ───────────────────────────────────────────────────────
    pub const BORDER_DIM: Color = Color::DarkGray;
    pub const BORDER_NORMAL: Color = Color::Rgb(60, 65, 80);
    pub const BORDER_ACCENT: Color = Color::Rgb(100, 180, 240);

    // ── Text hierarchy ───────────────────────────────────────────────
    pub const TEXT_PRIMARY: Color = Color::White;
    pub const TEXT_SECONDARY: Color = Color::Rgb(140, 145, 160);
    pub const TEXT_MUTED: Color = Color::Rgb(80, 85, 100);
    pub const TEXT_DISABLED: Color = Color::Rgb(60, 65, 80);
    pub const TEXT_CONTENT: Color = Color::Rgb(170, 175, 190);

    // ── Key style (for footer hints) ─────────────────────────────────
    pub const TEXT_KEY: Color = Color::Rgb(140, 145, 160);
    pub const TEXT_KEY_DESC: Color = Color::DarkGray;

    // ── Accent ───────────────────────────────────────────────────────
    pub const ACCENT_BLUE: Color = Color::Rgb(100, 180, 240);
    pub const ACCENT_GREEN: Color = Color::Rgb(80, 200, 120);
    pub const ACCENT_RED: Color = Color::Rgb(220, 80, 80);
    pub const ACCENT_YELLOW: Color = Color::Rgb(220, 180, 60);
    pub const ACCENT_PURPLE: Color = Color::Rgb(180, 140, 220);
    pub const ACCENT_ORANGE: Color = Color::Rgb(217, 119, 80);
    pub const ACCENT_CYAN: Color = Color::Rgb(80, 200, 200);

    // ── Diff ─────────────────────────────────────────────────────────
    pub const DIFF_REMOVED: Color = Color::Rgb(220, 100, 100);
    pub const DIFF_ADDED: Color = Color::Rgb(100, 200, 130);

    // ── Padding ──────────────────────────────────────────────────────
    pub const PADDING_CARD: Padding = Padding::new(2, 2, 1, 1);
    pub const PADDING_COMPACT: Padding = Padding::new(1, 1, 0, 0);

    // ── Block helpers ────────────────────────────────────────────────

    pub fn block() -> Block<'static> {
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(Self::BORDER_NORMAL))
    }

    pub fn block_dim() -> Block<'static> {
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(Self::BORDER_DIM))
    }

    pub fn block_accent() -> Block<'static> {
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(Self::BORDER_ACCENT))
    }

    /// Focused panes get the accent border.
    pub fn pane(focused: bool) -> Block<'static> {
        if focused {
            Self::block_accent()
        } else {
            Self::block()
        }
    }
}

/// Timeline row tint.
pub fn event_color(class: ColorClass) -> Color {
    match class {
        ColorClass::Success => Theme::ACCENT_GREEN,
        ColorClass::Error => Theme::ACCENT_RED,
        ColorClass::Warning => Theme::ACCENT_YELLOW,
        ColorClass::Muted => Theme::TEXT_SECONDARY,
        ColorClass::Primary => Theme::ACCENT_BLUE,
        ColorClass::Purple => Theme::ACCENT_PURPLE,
        ColorClass::Tool => Theme::ACCENT_CYAN,
        ColorClass::Orange => Theme::ACCENT_ORANGE,
    }
}

pub fn status_color(status: &PipelineStatus) -> Color {
    match status_tone(status) {
        StatusTone::Running => Theme::ACCENT_BLUE,
        StatusTone::Waiting => Theme::ACCENT_YELLOW,
        StatusTone::Success => Theme::ACCENT_GREEN,
        StatusTone::Failed => Theme::ACCENT_RED,
        StatusTone::Muted => Theme::TEXT_SECONDARY,
    }
}

pub fn connection_color(status: ConnectionStatus) -> Color {
    match status {
        ConnectionStatus::Connecting => Theme::ACCENT_YELLOW,
        ConnectionStatus::Connected => Theme::ACCENT_GREEN,
        ConnectionStatus::Disconnected => Theme::TEXT_SECONDARY,
        ConnectionStatus::Error => Theme::ACCENT_RED,
    }
}
