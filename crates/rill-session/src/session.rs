//! Streaming chat session: submit, stream, cancel

use futures::StreamExt;
use parking_lot::Mutex;
use rill_ai::{
    ChatRequest, EndpointKind, Error as AiError, InferenceEndpoint, Message, stream::decode_frames,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::{
    conversation::Conversation,
    events::{EndReason, SessionEvent},
    handle::SessionHandle,
};

/// Text shown in place of the reply when a request fails
pub const DEFAULT_ERROR_TEXT: &str = "Sorry, there was an error processing your request.";

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Assistant message shown when the endpoint fails
    pub error_text: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            error_text: DEFAULT_ERROR_TEXT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Streaming,
}

/// Why a submit was turned away without touching the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Blank prompt and nothing attached
    Empty,
    /// Another request is still in flight
    Busy,
}

/// Result of one call to [`StreamingChatSession::submit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Rejected(RejectReason),
    /// Stream ended; `content` is the full reply
    Completed { content: String },
    /// Stopped by `cancel()` (or `clear()`); nothing is reported to the user
    Cancelled,
    /// Transport failure; the reply was replaced by the error text
    Failed { error: String },
}

impl SubmitOutcome {
    /// End reason for accepted submits, `None` when rejected
    pub fn end_reason(&self) -> Option<EndReason> {
        match self {
            SubmitOutcome::Rejected(_) => None,
            SubmitOutcome::Completed { .. } => Some(EndReason::Completed),
            SubmitOutcome::Cancelled => Some(EndReason::Cancelled),
            SubmitOutcome::Failed { .. } => Some(EndReason::Failed),
        }
    }
}

struct InFlight {
    id: u64,
    token: CancellationToken,
}

#[derive(Default)]
struct SessionState {
    conversation: Conversation,
    in_flight: Option<InFlight>,
    next_request_id: u64,
}

impl SessionState {
    fn is_current(&self, id: u64) -> bool {
        matches!(&self.in_flight, Some(f) if f.id == id)
    }
}

/// State shared between the session, its clones and its handles
pub(crate) struct Shared {
    state: Mutex<SessionState>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl Shared {
    fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }

    pub(crate) fn cancel(&self) -> bool {
        let in_flight = self.state.lock().in_flight.take();
        match in_flight {
            Some(f) => {
                f.token.cancel();
                tracing::info!("Request {} cancelled", f.id);
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_streaming(&self) -> bool {
        self.state.lock().in_flight.is_some()
    }

    /// Swap in the latest accumulated reply, unless `id` is no longer the
    /// live request.
    fn replace_current(&self, id: u64, index: usize, message: Message) -> bool {
        let mut state = self.state.lock();
        if !state.is_current(id) {
            return false;
        }
        state.conversation.replace(index, message.clone());
        self.emit(SessionEvent::MessageReplaced { index, message });
        true
    }

    /// Release the in-flight slot held by `id`, optionally writing a final
    /// message first. Returns false if the request was already cancelled.
    fn finish(&self, id: u64, last: Option<(usize, Message)>) -> bool {
        let mut state = self.state.lock();
        if !state.is_current(id) {
            return false;
        }
        if let Some((index, message)) = last {
            state.conversation.replace(index, message.clone());
            self.emit(SessionEvent::MessageReplaced { index, message });
        }
        state.in_flight = None;
        true
    }
}

/// Releases the in-flight slot if the submit future exits early or is dropped.
struct InFlightGuard {
    shared: Arc<Shared>,
    id: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        if state.is_current(self.id) {
            if let Some(f) = state.in_flight.take() {
                f.token.cancel();
            }
            tracing::debug!("Request {} released before completion", self.id);
        }
    }
}

/// One conversation with at most one in-flight request.
///
/// Cloning is cheap and every clone drives the same conversation, so a front
/// end can run `submit` on a spawned task while keeping a copy for reads.
#[derive(Clone)]
pub struct StreamingChatSession {
    config: SessionConfig,
    endpoint: Arc<dyn InferenceEndpoint>,
    shared: Arc<Shared>,
}

impl StreamingChatSession {
    /// Create a new session
    pub fn new(config: SessionConfig, endpoint: Arc<dyn InferenceEndpoint>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            config,
            endpoint,
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::default()),
                event_tx,
            }),
        }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.event_tx.subscribe()
    }

    /// Get a cloneable handle for cancelling from another task
    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(Arc::clone(&self.shared))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Request encoding of the underlying endpoint
    pub fn endpoint_kind(&self) -> EndpointKind {
        self.endpoint.kind()
    }

    /// Snapshot of all messages
    pub fn messages(&self) -> Vec<Message> {
        self.shared.state.lock().conversation.messages().to_vec()
    }

    pub fn last_message(&self) -> Option<Message> {
        self.shared.state.lock().conversation.last().cloned()
    }

    pub fn status(&self) -> SessionStatus {
        if self.is_streaming() {
            SessionStatus::Streaming
        } else {
            SessionStatus::Idle
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.shared.is_streaming()
    }

    /// Cancel the in-flight request.
    ///
    /// The session is Idle as soon as this returns; bytes the request still
    /// delivers are discarded. Returns whether a request was in flight.
    pub fn cancel(&self) -> bool {
        self.shared.cancel()
    }

    /// Cancel any in-flight request and empty the conversation
    pub fn clear(&self) {
        let mut state = self.shared.state.lock();
        if let Some(f) = state.in_flight.take() {
            f.token.cancel();
            tracing::info!("Request {} cancelled by clear", f.id);
        }
        state.conversation.clear();
        self.shared.emit(SessionEvent::Cleared);
    }

    /// Send a prompt and stream the reply into the conversation.
    ///
    /// Appends the user message and an empty assistant placeholder, then
    /// replaces the placeholder with the full accumulated text on every
    /// frame. Resolves once the stream ends, fails or is cancelled.
    pub async fn submit(&self, request: ChatRequest) -> SubmitOutcome {
        let kind = self.endpoint.kind();

        let (id, index, token) = {
            let mut state = self.shared.state.lock();

            let empty = if kind.supports_attachments() {
                request.is_empty()
            } else {
                request.prompt.trim().is_empty()
            };
            if empty {
                tracing::debug!("Ignoring empty submit");
                return SubmitOutcome::Rejected(RejectReason::Empty);
            }
            if state.in_flight.is_some() {
                tracing::debug!("Ignoring submit while a request is in flight");
                return SubmitOutcome::Rejected(RejectReason::Busy);
            }

            let user = match request.attachment_name() {
                Some(name) if kind.supports_attachments() => {
                    Message::user_with_attachment(&request.prompt, name)
                }
                _ => Message::user(&request.prompt),
            };

            state.next_request_id += 1;
            let id = state.next_request_id;
            let token = CancellationToken::new();
            state.in_flight = Some(InFlight {
                id,
                token: token.clone(),
            });

            self.shared.emit(SessionEvent::SubmitStart { request_id: id });
            let user_index = state.conversation.push(user.clone());
            self.shared.emit(SessionEvent::MessageAppended {
                index: user_index,
                message: user,
            });
            let placeholder = Message::assistant_placeholder();
            let index = state.conversation.push(placeholder.clone());
            self.shared.emit(SessionEvent::MessageAppended {
                index,
                message: placeholder,
            });

            (id, index, token)
        };

        tracing::info!(
            "Request {} submitted to {} endpoint (model {})",
            id,
            kind.name(),
            request.model
        );

        let guard = InFlightGuard {
            shared: Arc::clone(&self.shared),
            id,
        };
        let outcome = self.stream_reply(&request, id, index, &token).await;
        drop(guard);

        if let Some(reason) = outcome.end_reason() {
            tracing::info!("Request {} ended: {:?}", id, reason);
            self.shared.emit(SessionEvent::SubmitEnd {
                request_id: id,
                outcome: reason,
            });
        }
        outcome
    }

    async fn stream_reply(
        &self,
        request: &ChatRequest,
        id: u64,
        index: usize,
        token: &CancellationToken,
    ) -> SubmitOutcome {
        let opened = tokio::select! {
            biased;
            _ = token.cancelled() => return SubmitOutcome::Cancelled,
            result = self.endpoint.open(request, token.clone()) => result,
        };
        let bytes = match opened {
            Ok(bytes) => bytes,
            Err(e) => return self.fail(id, index, token, e),
        };

        let mut frames = decode_frames(bytes);
        let mut accumulator = String::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => return SubmitOutcome::Cancelled,
                next = frames.next() => next,
            };

            match next {
                Some(Ok(frame)) if frame.done => {
                    tracing::debug!("Request {} received done frame", id);
                    break;
                }
                Some(Ok(frame)) => {
                    accumulator.push_str(&frame.content);
                    let message = Message::assistant(accumulator.clone());
                    if !self.shared.replace_current(id, index, message) {
                        return SubmitOutcome::Cancelled;
                    }
                }
                Some(Err(e)) => return self.fail(id, index, token, e),
                None => {
                    tracing::debug!("Request {} stream ended", id);
                    break;
                }
            }
        }

        if self.shared.finish(id, None) {
            SubmitOutcome::Completed {
                content: accumulator,
            }
        } else {
            SubmitOutcome::Cancelled
        }
    }

    fn fail(&self, id: u64, index: usize, token: &CancellationToken, error: AiError) -> SubmitOutcome {
        if error.is_cancellation() || token.is_cancelled() {
            tracing::debug!("Request {} aborted: {}", id, error);
            return SubmitOutcome::Cancelled;
        }

        tracing::warn!("Request {} failed: {}", id, error);
        let message = Message::assistant(self.config.error_text.clone());
        if self.shared.finish(id, Some((index, message))) {
            SubmitOutcome::Failed {
                error: error.to_string(),
            }
        } else {
            SubmitOutcome::Cancelled
        }
    }
}
