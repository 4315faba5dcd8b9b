//! Session event types

use rill_ai::Message;
use serde::{Deserialize, Serialize};

/// How an accepted submit ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Completed,
    Cancelled,
    Failed,
}

/// Events emitted while a session runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A submit was accepted and its request is about to open
    SubmitStart { request_id: u64 },

    /// A message was added to the conversation
    MessageAppended { index: usize, message: Message },

    /// The in-progress assistant message was replaced
    MessageReplaced { index: usize, message: Message },

    /// The conversation was emptied
    Cleared,

    /// A submit finished
    SubmitEnd { request_id: u64, outcome: EndReason },
}

impl SessionEvent {
    /// Check if this event changes what the conversation shows
    pub fn changes_conversation(&self) -> bool {
        matches!(
            self,
            SessionEvent::MessageAppended { .. }
                | SessionEvent::MessageReplaced { .. }
                | SessionEvent::Cleared
        )
    }
}
