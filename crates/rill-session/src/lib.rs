//! rill-session: Streaming chat session
//!
//! This crate provides the submit/cancel loop that turns one prompt into one
//! progressively replaced assistant message, plus the events and handle that
//! let a front end observe and interrupt it.

pub mod conversation;
pub mod events;
pub mod handle;
pub mod session;

pub use conversation::Conversation;
pub use events::{EndReason, SessionEvent};
pub use handle::SessionHandle;
pub use session::{RejectReason, SessionConfig, SessionStatus, StreamingChatSession, SubmitOutcome};
