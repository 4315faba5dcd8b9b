//! Color theme support

use ratatui::style::{Color, Modifier, Style};
use rill_ai::Role;

/// Color theme for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    /// Background color
    pub bg: Color,
    /// Primary text color
    pub fg: Color,
    /// Dimmed/secondary text
    pub dim: Color,
    /// Accent color (highlights, prompts)
    pub accent: Color,
    /// Error color
    pub error: Color,
    /// User bubble color
    pub user: Color,
    /// Assistant bubble color
    pub assistant: Color,
    /// Border color
    pub border: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Dark theme (default)
    pub fn dark() -> Self {
        Self {
            bg: Color::Reset,
            fg: Color::White,
            dim: Color::DarkGray,
            accent: Color::Cyan,
            error: Color::Red,
            user: Color::Blue,
            assistant: Color::Green,
            border: Color::DarkGray,
        }
    }

    /// Light theme
    pub fn light() -> Self {
        Self {
            bg: Color::White,
            fg: Color::Black,
            dim: Color::Gray,
            accent: Color::Blue,
            error: Color::Red,
            user: Color::Blue,
            assistant: Color::Rgb(0, 120, 60),
            border: Color::Gray,
        }
    }

    /// Look up a theme by name
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "dark" => Some(Self::dark()),
            "light" => Some(Self::light()),
            _ => None,
        }
    }

    pub fn base_style(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.dim)
    }

    pub fn accent_style(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn accent_bold(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    /// Bubble color for a message author
    pub fn role_color(&self, role: Role) -> Color {
        match role {
            Role::User => self.user,
            Role::Assistant => self.assistant,
        }
    }

    /// Bold header style for a message author
    pub fn role_header(&self, role: Role) -> Style {
        Style::default()
            .fg(self.role_color(role))
            .add_modifier(Modifier::BOLD)
    }
}
