//! Message list widget for displaying the conversation

use crate::theme::Theme;
use crate::widgets::typing::TypingIndicator;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use rill_ai::{Message, Role};
use std::time::Instant;

/// Widget for displaying chat messages as labelled bubbles.
///
/// User messages hug the right edge, assistant messages the left. While a
/// reply is streaming a typing indicator follows the last message.
pub struct MessageList<'a> {
    messages: &'a [Message],
    theme: &'a Theme,
    scroll: usize,
    streaming: bool,
    indicator_start: Instant,
}

impl<'a> MessageList<'a> {
    pub fn new(messages: &'a [Message], theme: &'a Theme) -> Self {
        Self {
            messages,
            theme,
            scroll: 0,
            streaming: false,
            indicator_start: Instant::now(),
        }
    }

    /// Set scroll offset in lines
    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    /// Show the typing indicator, animated from `since`
    pub fn streaming(mut self, streaming: bool, since: Instant) -> Self {
        self.streaming = streaming;
        self.indicator_start = since;
        self
    }

    /// Total number of lines at the given width
    pub fn height(&self, width: usize) -> usize {
        self.lines(width).len()
    }

    /// Largest useful scroll offset for a viewport of `height` lines
    pub fn max_scroll(&self, width: usize, height: usize) -> usize {
        self.height(width).saturating_sub(height)
    }

    /// Lay out every message at the given width
    pub fn lines(&self, width: usize) -> Vec<Line<'static>> {
        let bubble_width = (width * 4 / 5).max(12).min(width);
        let text_width = bubble_width.saturating_sub(2).max(1);
        let mut lines = Vec::new();

        for (i, msg) in self.messages.iter().enumerate() {
            let is_pending = self.streaming
                && i + 1 == self.messages.len()
                && msg.is_assistant()
                && msg.content.is_empty();
            lines.extend(self.message_lines(msg, text_width, is_pending));
        }

        if self.streaming {
            let indicator = TypingIndicator::new(self.theme).with_start_time(self.indicator_start);
            lines.push(indicator.line());
            lines.push(Line::from(""));
        }

        lines
    }

    fn message_lines(&self, msg: &Message, text_width: usize, is_pending: bool) -> Vec<Line<'static>> {
        let align = match msg.role {
            Role::User => Alignment::Right,
            Role::Assistant => Alignment::Left,
        };
        let bubble = Style::default().fg(self.theme.role_color(msg.role));

        let mut lines = vec![
            Line::from(Span::styled(msg.role.label(), self.theme.role_header(msg.role)))
                .alignment(align),
        ];

        // the typing indicator stands in for an empty reply
        if !is_pending && (!msg.content.is_empty() || msg.attachment_name.is_none()) {
            for row in textwrap::wrap(&msg.content, text_width) {
                let row = row.into_owned();
                let line = match msg.role {
                    Role::User => Line::from(vec![
                        Span::styled(row, self.theme.base_style()),
                        Span::styled(" │", bubble),
                    ]),
                    Role::Assistant => Line::from(vec![
                        Span::styled("│ ", bubble),
                        Span::styled(row, self.theme.base_style()),
                    ]),
                };
                lines.push(line.alignment(align));
            }
        }

        if let Some(ref name) = msg.attachment_name {
            lines.push(
                Line::from(Span::styled(format!("File: {}", name), self.theme.dim_style()))
                    .alignment(align),
            );
        }

        lines.push(Line::from(""));
        lines
    }
}

impl Widget for MessageList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let visible: Vec<Line> = self
            .lines(area.width as usize)
            .into_iter()
            .skip(self.scroll)
            .take(area.height as usize)
            .collect();

        Paragraph::new(visible).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_user_and_assistant_alignment() {
        let theme = Theme::dark();
        let messages = vec![Message::user("Hello"), Message::assistant("Hi there")];
        let lines = MessageList::new(&messages, &theme).lines(40);

        assert_eq!(text(&lines[0]), "You");
        assert_eq!(lines[0].alignment, Some(Alignment::Right));
        assert_eq!(text(&lines[1]), "Hello │");
        assert_eq!(text(&lines[3]), "Assistant");
        assert_eq!(lines[3].alignment, Some(Alignment::Left));
        assert_eq!(text(&lines[4]), "│ Hi there");
    }

    #[test]
    fn test_attachment_line_under_user_message() {
        let theme = Theme::dark();
        let messages = vec![Message::user_with_attachment("Summarize", "report.pdf")];
        let lines = MessageList::new(&messages, &theme).lines(40);
        let rendered: Vec<String> = lines.iter().map(text).collect();
        assert_eq!(rendered, vec!["You", "Summarize │", "File: report.pdf", ""]);
    }

    #[test]
    fn test_newlines_are_preserved() {
        let theme = Theme::dark();
        let messages = vec![Message::assistant("one\n\nthree")];
        let lines = MessageList::new(&messages, &theme).lines(40);
        let rendered: Vec<String> = lines.iter().map(text).collect();
        assert_eq!(rendered, vec!["Assistant", "│ one", "│ ", "│ three", ""]);
    }

    #[test]
    fn test_long_content_wraps_within_bubble() {
        let theme = Theme::dark();
        let messages = vec![Message::assistant("word ".repeat(20))];
        let list = MessageList::new(&messages, &theme);
        // bubble is 4/5 of 40 columns, minus the bar
        for line in list.lines(40).iter().skip(1) {
            assert!(text(line).chars().count() <= 32);
        }
        assert!(list.height(40) > 4);
    }

    #[test]
    fn test_streaming_placeholder_shows_indicator() {
        let theme = Theme::dark();
        let messages = vec![Message::user("Hello"), Message::assistant_placeholder()];
        let lines = MessageList::new(&messages, &theme)
            .streaming(true, Instant::now())
            .lines(40);
        let rendered: Vec<String> = lines.iter().map(text).collect();

        assert_eq!(&rendered[3..], &["Assistant", "", "● · ·", ""]);
    }

    #[test]
    fn test_max_scroll() {
        let theme = Theme::dark();
        let messages = vec![Message::user("a"), Message::assistant("b")];
        let list = MessageList::new(&messages, &theme);
        assert_eq!(list.height(40), 6);
        assert_eq!(list.max_scroll(40, 4), 2);
        assert_eq!(list.max_scroll(40, 10), 0);
    }
}
