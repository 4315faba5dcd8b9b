//! Animated "someone is typing" indicator

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};
use std::time::{Duration, Instant};

/// Time each dot stays raised
pub const FRAME_DURATION: Duration = Duration::from_millis(200);

const DOT_COUNT: usize = 3;

/// Index of the raised dot after `elapsed`
pub fn frame_at(elapsed: Duration) -> usize {
    (elapsed.as_millis() / FRAME_DURATION.as_millis()) as usize % DOT_COUNT
}

/// Three dots, one raised at a time
pub fn dots(frame: usize) -> String {
    (0..DOT_COUNT)
        .map(|i| if i == frame % DOT_COUNT { "●" } else { "·" })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Three-dot typing indicator with an optional label
pub struct TypingIndicator<'a> {
    label: Option<&'a str>,
    theme: &'a Theme,
    start_time: Instant,
}

impl<'a> TypingIndicator<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            label: None,
            theme,
            start_time: Instant::now(),
        }
    }

    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    /// Animate relative to a fixed start so redraws stay in phase
    pub fn with_start_time(mut self, start: Instant) -> Self {
        self.start_time = start;
        self
    }

    pub fn line(&self) -> Line<'static> {
        let mut spans = vec![Span::styled(
            dots(frame_at(self.start_time.elapsed())),
            self.theme.accent_style(),
        )];
        if let Some(label) = self.label {
            spans.push(Span::styled(format!(" {}", label), self.theme.dim_style()));
        }
        Line::from(spans)
    }
}

impl Widget for TypingIndicator<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 5 {
            return;
        }
        buf.set_line(area.x, area.y, &self.line(), area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_cycle_through_dots() {
        assert_eq!(frame_at(Duration::ZERO), 0);
        assert_eq!(frame_at(FRAME_DURATION), 1);
        assert_eq!(frame_at(FRAME_DURATION * 2), 2);
        assert_eq!(frame_at(FRAME_DURATION * 3), 0);
    }

    #[test]
    fn test_dots_raise_one_at_a_time() {
        assert_eq!(dots(0), "● · ·");
        assert_eq!(dots(1), "· ● ·");
        assert_eq!(dots(5), "· · ●");
    }

    #[test]
    fn test_line_includes_label() {
        let theme = Theme::dark();
        let line = TypingIndicator::new(&theme).with_label("Thinking...").line();
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.ends_with(" Thinking..."), "got: {}", text);
    }
}
