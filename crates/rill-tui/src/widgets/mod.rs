//! Custom widgets for the TUI

pub mod input_box;
pub mod message_list;
pub mod selector;
pub mod typing;

pub use input_box::InputBox;
pub use message_list::MessageList;
pub use selector::{Selector, SelectorItem, SelectorState};
pub use typing::TypingIndicator;
