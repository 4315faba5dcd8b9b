//! Single-line prompt editor

use crate::input::Action;
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

/// Single-line text input widget
#[derive(Debug, Default)]
pub struct InputBox {
    chars: Vec<char>,
    /// Cursor position as a char index
    cursor: usize,
    /// Horizontal scroll offset in display columns
    scroll: usize,
    placeholder: String,
    title: Option<String>,
    focused: bool,
    disabled: bool,
}

impl InputBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Dim the box and ignore edits (while a reply streams in)
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Title drawn in the top border, e.g. the pending attachment
    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn content(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_content(&mut self, content: &str) {
        self.chars = content.chars().collect();
        self.cursor = self.chars.len();
        self.scroll = 0;
    }

    pub fn clear(&mut self) {
        self.chars.clear();
        self.cursor = 0;
        self.scroll = 0;
    }

    /// Return the current text and clear the box
    pub fn take(&mut self) -> String {
        let content = self.content();
        self.clear();
        content
    }

    /// Apply an editing action. Returns true if the action was consumed.
    pub fn handle_action(&mut self, action: &Action, width: u16) -> bool {
        if self.disabled {
            return false;
        }

        let handled = match action {
            Action::Char(c) => {
                self.insert(*c);
                true
            }
            Action::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                self.chars.remove(self.cursor);
                true
            }
            Action::Delete if self.cursor < self.chars.len() => {
                self.chars.remove(self.cursor);
                true
            }
            Action::Left if self.cursor > 0 => {
                self.cursor -= 1;
                true
            }
            Action::Right if self.cursor < self.chars.len() => {
                self.cursor += 1;
                true
            }
            Action::Home => {
                self.cursor = 0;
                true
            }
            Action::End => {
                self.cursor = self.chars.len();
                true
            }
            Action::ClearLine => {
                self.clear();
                true
            }
            Action::DeleteWord => {
                let end = self.cursor;
                let mut start = end;
                while start > 0 && self.chars[start - 1] == ' ' {
                    start -= 1;
                }
                while start > 0 && self.chars[start - 1] != ' ' {
                    start -= 1;
                }
                self.chars.drain(start..end);
                self.cursor = start;
                true
            }
            Action::Paste(text) => {
                // newlines collapse into single spaces
                for c in text.chars() {
                    if c == '\n' || c == '\r' {
                        if self.cursor > 0 && self.chars[self.cursor - 1] != ' ' {
                            self.insert(' ');
                        }
                    } else {
                        self.insert(c);
                    }
                }
                true
            }
            _ => false,
        };

        if handled {
            self.update_scroll(width as usize);
        }
        handled
    }

    fn insert(&mut self, c: char) {
        self.chars.insert(self.cursor, c);
        self.cursor += 1;
    }

    fn columns(chars: &[char]) -> usize {
        chars.iter().map(|c| c.width().unwrap_or(0)).sum()
    }

    fn update_scroll(&mut self, width: usize) {
        let visible = width.saturating_sub(2).max(1);
        let cursor_col = Self::columns(&self.chars[..self.cursor]);

        if cursor_col < self.scroll {
            self.scroll = cursor_col;
        } else if cursor_col >= self.scroll + visible {
            self.scroll = cursor_col + 1 - visible;
        }
    }

    /// Render the input box
    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let border = if self.focused && !self.disabled {
            theme.accent_style()
        } else {
            theme.border_style()
        };
        let mut block = Block::default().borders(Borders::ALL).border_style(border);
        if let Some(ref title) = self.title {
            block = block.title(format!(" {} ", title));
        }

        let inner = block.inner(area);
        block.render(area, buf);

        let (text, style) = if self.chars.is_empty() {
            (self.placeholder.clone(), theme.dim_style())
        } else {
            let mut col = 0;
            let mut visible = String::new();
            for c in &self.chars {
                let w = c.width().unwrap_or(0);
                if col >= self.scroll && col + w <= self.scroll + inner.width as usize {
                    visible.push(*c);
                }
                col += w;
            }
            let style = if self.disabled {
                theme.dim_style()
            } else {
                theme.base_style()
            };
            (visible, style)
        };
        Paragraph::new(text).style(style).render(inner, buf);

        if self.focused && !self.disabled && inner.width > 0 {
            let cursor_x = Self::columns(&self.chars[..self.cursor]).saturating_sub(self.scroll);
            if cursor_x < inner.width as usize {
                if let Some(cell) = buf.cell_mut((inner.x + cursor_x as u16, inner.y)) {
                    cell.set_style(Style::default().bg(theme.accent));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> InputBox {
        let mut input = InputBox::new();
        for c in text.chars() {
            input.handle_action(&Action::Char(c), 40);
        }
        input
    }

    #[test]
    fn test_typing_and_take() {
        let mut input = typed("héllo");
        assert_eq!(input.content(), "héllo");
        assert_eq!(input.cursor(), 5);
        assert_eq!(input.take(), "héllo");
        assert!(input.is_empty());
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn test_backspace_and_delete_at_cursor() {
        let mut input = typed("abcd");
        input.handle_action(&Action::Left, 40);
        input.handle_action(&Action::Backspace, 40);
        assert_eq!(input.content(), "abd");
        input.handle_action(&Action::Delete, 40);
        assert_eq!(input.content(), "ab");
        assert!(!input.handle_action(&Action::Delete, 40));
    }

    #[test]
    fn test_delete_word() {
        let mut input = typed("attach notes.txt  ");
        input.handle_action(&Action::DeleteWord, 40);
        assert_eq!(input.content(), "attach ");
    }

    #[test]
    fn test_paste_collapses_newlines() {
        let mut input = InputBox::new();
        input.handle_action(&Action::Paste("one\r\ntwo\nthree".into()), 40);
        assert_eq!(input.content(), "one two three");
    }

    #[test]
    fn test_disabled_ignores_edits() {
        let mut input = typed("hi");
        input.set_disabled(true);
        assert!(!input.handle_action(&Action::Char('!'), 40));
        assert_eq!(input.content(), "hi");
    }

    #[test]
    fn test_scroll_follows_cursor() {
        let mut input = InputBox::new();
        for _ in 0..30 {
            input.handle_action(&Action::Char('x'), 12);
        }
        // 10 visible columns, cursor after 30 chars
        assert_eq!(input.scroll, 21);
        input.handle_action(&Action::Home, 12);
        assert_eq!(input.scroll, 0);
    }
}
