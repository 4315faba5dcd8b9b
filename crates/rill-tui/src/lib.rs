//! rill-tui: Terminal UI components
//!
//! Widgets for a chat screen built on ratatui and crossterm: message list,
//! input box, typing indicator and model selector popup.

pub mod input;
pub mod theme;
pub mod widgets;

pub use input::{Action, key_to_action};
pub use theme::Theme;
