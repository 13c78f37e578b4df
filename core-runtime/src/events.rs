//! # Event Bus
//!
//! Typed notifications from the auth controller and the service facade,
//! fanned out to any number of observers over `tokio::sync::broadcast`.
//!
//! ```rust
//! use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
//!
//! let bus = EventBus::default();
//! let mut auth = bus.stream().filter(|event| matches!(event, CoreEvent::Auth(_)));
//!
//! let _ = bus.emit(CoreEvent::Auth(AuthEvent::SignedOut));
//! assert!(matches!(auth.try_recv(), Some(Ok(CoreEvent::Auth(AuthEvent::SignedOut)))));
//! ```
//!
//! Emitting with no subscribers is not an error worth handling; emitters
//! discard the result. A receiver that falls more than the buffer size
//! behind gets `RecvError::Lagged(n)` once and then resumes with the oldest
//! retained event. `RecvError::Closed` means every bus handle was dropped.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that fall further behind receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Authentication-related events
    Auth(AuthEvent),
    /// File-processing events
    Processing(ProcessingEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Auth(e) => e.description(),
            CoreEvent::Processing(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    ///
    /// A cancelled sign-in is informational; it never counts as an error.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Auth(AuthEvent::AuthError { .. }) => EventSeverity::Error,
            CoreEvent::Processing(ProcessingEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Processing(ProcessingEvent::Completed {
                soft_error: Some(_),
                ..
            }) => EventSeverity::Warning,
            CoreEvent::Auth(AuthEvent::SignedIn { .. })
            | CoreEvent::Auth(AuthEvent::SignedOut)
            | CoreEvent::Auth(AuthEvent::Cancelled)
            | CoreEvent::Processing(ProcessingEvent::Completed { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Authentication Events
// ============================================================================

/// How a sign-in was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignInMethod {
    /// The callback carried a `token` parameter.
    Token,
    /// The callback only reported `status=success`.
    Session,
}

/// Events related to the browser sign-in flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AuthEvent {
    /// Browser session opened against the backend.
    SigningIn {
        /// Authorization URL (carries no secrets).
        auth_url: String,
    },
    /// Sign-in accepted and persisted.
    SignedIn { method: SignInMethod },
    /// Stored credential restored at startup.
    SessionRestored,
    /// Credential cleared.
    SignedOut,
    /// User dismissed the browser session.
    Cancelled,
    /// Sign-in failed.
    AuthError {
        message: String,
        /// Whether trying again could succeed.
        recoverable: bool,
    },
}

impl AuthEvent {
    fn description(&self) -> &str {
        match self {
            AuthEvent::SigningIn { .. } => "Authentication in progress",
            AuthEvent::SignedIn { .. } => "User signed in successfully",
            AuthEvent::SessionRestored => "Stored session restored",
            AuthEvent::SignedOut => "User signed out",
            AuthEvent::Cancelled => "Authentication cancelled by user",
            AuthEvent::AuthError { .. } => "Authentication error",
        }
    }
}

// ============================================================================
// Processing Events
// ============================================================================

/// Events emitted around a single `process-file` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ProcessingEvent {
    Started {
        file_id: String,
    },
    Completed {
        file_id: String,
        /// Length of the backend's progress log.
        status_update_count: usize,
        /// Backend-reported soft failure, if any.
        soft_error: Option<String>,
    },
    Failed {
        file_id: String,
        message: String,
        /// HTTP status when the backend answered.
        status_code: Option<u16>,
    },
}

impl ProcessingEvent {
    fn description(&self) -> &str {
        match self {
            ProcessingEvent::Started { .. } => "File processing started",
            ProcessingEvent::Completed {
                soft_error: Some(_),
                ..
            } => "File processing completed with a backend error",
            ProcessingEvent::Completed { .. } => "File processing completed",
            ProcessingEvent::Failed { .. } => "File processing failed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Cloneable handle to the broadcast channel. Clones share subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// `capacity` is the number of events retained for slow receivers.
    pub fn new(capacity: usize) -> Self {
        Self {
            sender: broadcast::channel(capacity).0,
        }
    }

    /// Bus with [`DEFAULT_EVENT_BUFFER_SIZE`].
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Number of receivers reached, or `SendError` when there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Receiver for events emitted from now on.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn stream(&self) -> EventStream {
        EventStream::new(self.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventPredicate = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// Receiver that silently drops events failing an optional predicate.
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    predicate: Option<EventPredicate>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            predicate: None,
        }
    }

    /// Keep only events for which `predicate` holds. Replaces any earlier
    /// predicate.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Box::new(predicate));
        self
    }

    fn wants(&self, event: &CoreEvent) -> bool {
        match &self.predicate {
            Some(predicate) => predicate(event),
            None => true,
        }
    }

    /// Next matching event. Lag and closure are reported as `RecvError`.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.wants(&event) {
                return Ok(event);
            }
        }
    }

    /// Next matching event already buffered, or `None` when the buffer holds
    /// nothing that matches.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        use broadcast::error::TryRecvError;

        loop {
            let event = match self.receiver.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Lagged(skipped)) => return Some(Err(RecvError::Lagged(skipped))),
                Err(TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            };
            if self.wants(&event) {
                return Some(Ok(event));
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("filtered", &self.predicate.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
