//! A cloneable handle for interrupting the session from another task.

use std::sync::Arc;

use crate::session::Shared;

/// A cloneable handle for poking the session from external code.
///
/// Holds the same shared state as the session, so cloning is cheap.
#[derive(Clone)]
pub struct SessionHandle {
    pub(crate) shared: Arc<Shared>,
}

impl SessionHandle {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Cancel the in-flight request. Returns whether one was running.
    pub fn cancel(&self) -> bool {
        self.shared.cancel()
    }

    /// Whether a request is currently in flight.
    pub fn is_streaming(&self) -> bool {
        self.shared.is_streaming()
    }
}
