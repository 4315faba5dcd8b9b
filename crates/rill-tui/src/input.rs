//! Input handling

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

/// Processed input action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Regular character input
    Char(char),
    /// Enter: send the prompt (or confirm a popup)
    Submit,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    /// Escape: cancel the in-flight reply or close a popup
    Escape,
    /// Ctrl+C: cancel while streaming, quit otherwise
    Interrupt,
    /// Ctrl+L: clear the conversation
    Clear,
    /// Ctrl+U: clear the input line
    ClearLine,
    /// Ctrl+W: delete the word before the cursor
    DeleteWord,
    /// Bracketed paste
    Paste(String),
    /// Ctrl+Q
    Quit,
    /// Ctrl+K: open the model selector
    ModelSelect,
    /// Ctrl+O: attach a file (path taken from the input line)
    Attach,
    /// Ctrl+X: drop the pending attachment
    Detach,
    Unknown,
}

/// Convert a crossterm key event to an action
pub fn key_to_action(event: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Action::Interrupt,
            KeyCode::Char('l') => Action::Clear,
            KeyCode::Char('u') => Action::ClearLine,
            KeyCode::Char('w') => Action::DeleteWord,
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('k') => Action::ModelSelect,
            KeyCode::Char('o') => Action::Attach,
            KeyCode::Char('x') => Action::Detach,
            _ => Action::Unknown,
        };
    }

    if modifiers.contains(KeyModifiers::ALT) {
        return Action::Unknown;
    }

    match code {
        KeyCode::Char(c) => Action::Char(c),
        KeyCode::Enter => Action::Submit,
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Delete => Action::Delete,
        KeyCode::Left => Action::Left,
        KeyCode::Right => Action::Right,
        KeyCode::Up => Action::Up,
        KeyCode::Down => Action::Down,
        KeyCode::Home => Action::Home,
        KeyCode::End => Action::End,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::Esc => Action::Escape,
        _ => Action::Unknown,
    }
}

/// Convert a crossterm event to an action
pub fn event_to_action(event: Event) -> Option<Action> {
    match event {
        Event::Key(key_event) => Some(key_to_action(key_event)),
        Event::Paste(text) => Some(Action::Paste(text)),
        _ => None,
    }
}
