use crate::theme::Theme;
use pipeline_ui_core::{Labels, PipelineStatus};
use ratatui::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BadgeVariant {
    #[default]
    Default,
    Success,
    Warning,
    Error,
    Info,
    Muted,
}

impl BadgeVariant {
    pub fn for_status(status: &PipelineStatus) -> Self {
        match status {
            PipelineStatus::Running => Self::Info,
            PipelineStatus::WaitingApproval => Self::Warning,
            PipelineStatus::Completed => Self::Success,
            PipelineStatus::Failed => Self::Error,
            PipelineStatus::Other(_) => Self::Muted,
        }
    }

    fn color(self) -> Color {
        match self {
            Self::Default => Theme::TEXT_CONTENT,
            Self::Success => Theme::ACCENT_GREEN,
            Self::Warning => Theme::ACCENT_YELLOW,
            Self::Error => Theme::ACCENT_RED,
            Self::Info => Theme::ACCENT_BLUE,
            Self::Muted => Theme::TEXT_SECONDARY,
        }
    }
}

/// Small colored tag. A pulsing badge blinks its dot between ticks.
#[derive(Debug, Clone)]
pub struct Badge {
    text: String,
    variant: BadgeVariant,
    dot: bool,
    pulse: bool,
    tick: u64,
}

impl Badge {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            variant: BadgeVariant::Default,
            dot: false,
            pulse: false,
            tick: 0,
        }
    }

    /// Status badge using the configured label; running pipelines pulse.
    pub fn status(status: &PipelineStatus, labels: &Labels, tick: u64) -> Self {
        Self::new(labels.status(status))
            .variant(BadgeVariant::for_status(status))
            .dot(true)
            .pulse(matches!(status, PipelineStatus::Running), tick)
    }

    pub fn variant(mut self, variant: BadgeVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn dot(mut self, dot: bool) -> Self {
        self.dot = dot;
        self
    }

    pub fn pulse(mut self, pulse: bool, tick: u64) -> Self {
        self.pulse = pulse;
        self.tick = tick;
        self
    }

    pub fn span(&self) -> Span<'static> {
        let color = self.variant.color();
        let dot = match (self.dot, self.pulse && (self.tick / 5) % 2 == 1) {
            (false, _) => "",
            (true, false) => "● ",
            (true, true) => "○ ",
        };
        Span::styled(
            format!(" {dot}{} ", self.text),
            Style::new().fg(color).bg(Theme::BG_SURFACE).bold(),
        )
    }
}

impl Widget for Badge {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.span().render(area, buf);
    }
}
