//! # Event Bus System
//!
//! Typed broadcast of playback lifecycle events using `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! Observable state (`watch` channels in `core-playback`) tells a UI *what the
//! player looks like now*. The event bus complements it with *what just
//! happened*: format fallbacks, recoveries, replays, terminal errors. Hosts
//! use it for analytics, diagnostics overlays or toasts.
//!
//! ```text
//! ┌───────────────┐   emit    ┌──────────┐  subscribe  ┌────────────┐
//! │ PlayerManager ├──────────>│ EventBus ├────────────>│ Subscriber │
//! └───────────────┘           └──────────┘             └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(32);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Playback(PlaybackEvent::Released { engine_id: 1 })).ok();
//! assert!(matches!(rx.recv().await, Ok(CoreEvent::Playback(_))));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber fell behind and missed `n` events.
//! - **`RecvError::Closed`**: every sender was dropped.
//!
//! `emit` fails when nobody is subscribed; publishers ignore that error.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Playback(PlaybackEvent),
    Preferences(PreferencesEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Preferences(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::FormatFallback { .. })
            | CoreEvent::Playback(PlaybackEvent::Recovered { .. }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::Started { .. })
            | CoreEvent::Playback(PlaybackEvent::Replaying { .. }) => EventSeverity::Info,
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
// Playback Events
// ============================================================================

/// Player lifecycle events.
///
/// URLs carried here are already redacted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// A new engine instance was built.
    EngineCreated { engine_id: u64 },
    /// A URL was handed to the engine and preparation began.
    Started { engine_id: u64, url: String },
    /// The source was rebuilt with the next container format.
    FormatFallback {
        engine_id: u64,
        /// Format hint that just failed.
        from: String,
        /// Format hint now being tried.
        to: String,
        /// Engine error code that triggered the fallback.
        error_code: i32,
    },
    /// The engine was re-prepared in place without changing format.
    Recovered {
        engine_id: u64,
        reason: RecoveryReason,
    },
    /// The whole engine is being torn down and rebuilt for the current URL.
    Replaying { reason: String },
    /// A terminal error was published to observers.
    Error {
        engine_id: Option<u64>,
        /// Error kind, e.g. `EngineUnavailable` or `FallbackExhausted`.
        kind: String,
        code: Option<i32>,
        message: String,
    },
    /// The engine was released and state reset.
    Released { engine_id: u64 },
}

/// Why an engine was re-prepared in place.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RecoveryReason {
    /// Playback fell behind the live window.
    BehindLiveWindow,
    /// The stream ended and reconnect mode is on.
    Reconnect,
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::EngineCreated { .. } => "Engine created",
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::FormatFallback { .. } => "Retrying with next container format",
            PlaybackEvent::Recovered {
                reason: RecoveryReason::BehindLiveWindow,
                ..
            } => "Rejoined live window",
            PlaybackEvent::Recovered {
                reason: RecoveryReason::Reconnect,
                ..
            } => "Reconnected ended stream",
            PlaybackEvent::Replaying { .. } => "Replaying current stream",
            PlaybackEvent::Error { .. } => "Playback error",
            PlaybackEvent::Released { .. } => "Player released",
        }
    }
}

// ============================================================================
// Preference Events
// ============================================================================

/// Preference changes observed by the player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PreferencesEvent {
    /// An engine-affecting preference changed while playing.
    EngineSettingsChanged {
        connect_timeout_ms: u64,
        tunneling: bool,
    },
}

impl PreferencesEvent {
    fn description(&self) -> &str {
        match self {
            PreferencesEvent::EngineSettingsChanged { .. } => "Engine settings changed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus.
///
/// Clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a bus buffering at most `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received it, or an error if
    /// there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Receiver for all future events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
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

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// `broadcast::Receiver` with an optional filter.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventSeverity, EventStream};
///
/// let bus = EventBus::new(16);
/// let errors = EventStream::new(bus.subscribe())
///     .filter(|event| event.severity() >= EventSeverity::Warning);
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next matching event.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking receive. `None` when no matching event is queued.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback_event() -> CoreEvent {
        CoreEvent::Playback(PlaybackEvent::FormatFallback {
            engine_id: 1,
            from: "None".to_string(),
            to: "Hls".to_string(),
            error_code: 3001,
        })
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_fails() {
        let bus = EventBus::new(10);
        assert!(bus.emit(fallback_event()).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let event = fallback_event();
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| event.severity() >= EventSeverity::Warning);

        bus.emit(CoreEvent::Playback(PlaybackEvent::EngineCreated { engine_id: 1 }))
            .ok();
        bus.emit(fallback_event()).ok();

        assert_eq!(stream.recv().await.unwrap(), fallback_event());
        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut stream = EventStream::new(bus.subscribe());

        for engine_id in 0..5 {
            bus.emit(CoreEvent::Playback(PlaybackEvent::Released { engine_id }))
                .ok();
        }

        assert!(matches!(stream.recv().await, Err(RecvError::Lagged(3))));
        assert_eq!(
            stream.recv().await.unwrap(),
            CoreEvent::Playback(PlaybackEvent::Released { engine_id: 3 })
        );
    }

    #[test]
    fn test_severity_and_description() {
        let error = CoreEvent::Playback(PlaybackEvent::Error {
            engine_id: Some(2),
            kind: "FallbackExhausted".to_string(),
            code: Some(3001),
            message: "malformed".to_string(),
        });
        assert_eq!(error.severity(), EventSeverity::Error);
        assert_eq!(error.description(), "Playback error");

        let recovered = CoreEvent::Playback(PlaybackEvent::Recovered {
            engine_id: 2,
            reason: RecoveryReason::BehindLiveWindow,
        });
        assert_eq!(recovered.severity(), EventSeverity::Warning);
        assert_eq!(recovered.description(), "Rejoined live window");

        let prefs = CoreEvent::Preferences(PreferencesEvent::EngineSettingsChanged {
            connect_timeout_ms: 8000,
            tunneling: true,
        });
        assert_eq!(prefs.severity(), EventSeverity::Debug);
    }

    #[test]
    fn test_event_serialization() {
        let event = CoreEvent::Playback(PlaybackEvent::Started {
            engine_id: 4,
            url: "http://x/live.ts".to_string(),
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Playback\""));
        assert!(json.contains("\"event\":\"Started\""));

        let back: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
