//! # Player Event Router
//!
//! Engine callbacks arrive on engine threads. An [`EventForwarder`] tags each
//! one with the id of the engine that emitted it and pushes it onto an
//! unbounded channel; a single dispatcher task drains the channel and hands
//! every event to [`PlayerEventRouter::route`] under the player lock.
//!
//! ```text
//! engine thread ──> EventForwarder ──mpsc──> dispatcher ──lock──> route()
//!                                                               │
//!                        session (fallback, reseek) <───────────┤
//!                        observables (StatePublisher) <─────────┘
//! ```
//!
//! Events from an engine that is no longer current are discarded.

use crate::error::PlayerError;
use crate::fallback::{FallbackDecision, FormatFallbackPolicy, FormatHint};
use crate::session::PlaybackSession;
use crate::state::StatePublisher;
use crate::tracks::TrackSelectionTable;
use bridge_traits::{
    EngineError, EngineId, EngineState, PlayerListener, ReconnectMode, TrackGroup, VideoSize,
};
use core_runtime::events::RecoveryReason;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// One engine callback.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EngineEvent {
    VideoSizeChanged(VideoSize),
    PlaybackStateChanged(EngineState),
    ErrorChanged(Option<EngineError>),
    TracksChanged(Vec<TrackGroup>),
}

pub(crate) type TaggedEvent = (EngineId, EngineEvent);

/// Listener handed to an engine at creation.
pub(crate) struct EventForwarder {
    engine_id: EngineId,
    tx: mpsc::UnboundedSender<TaggedEvent>,
    attached: AtomicBool,
}

impl EventForwarder {
    pub(crate) fn new(engine_id: EngineId, tx: mpsc::UnboundedSender<TaggedEvent>) -> Self {
        Self {
            engine_id,
            tx,
            attached: AtomicBool::new(true),
        }
    }

    /// Stops forwarding. Callbacks after this point are dropped.
    pub(crate) fn detach(&self) {
        self.attached.store(false, Ordering::Release);
    }

    fn forward(&self, event: EngineEvent) {
        if !self.attached.load(Ordering::Acquire) {
            trace!(engine = %self.engine_id, ?event, "Dropping callback from detached engine");
            return;
        }
        if self.tx.send((self.engine_id, event)).is_err() {
            trace!(engine = %self.engine_id, "Dispatcher gone, dropping callback");
        }
    }
}

impl PlayerListener for EventForwarder {
    fn on_video_size_changed(&self, size: VideoSize) {
        self.forward(EngineEvent::VideoSizeChanged(size));
    }

    fn on_playback_state_changed(&self, state: EngineState) {
        self.forward(EngineEvent::PlaybackStateChanged(state));
    }

    fn on_player_error_changed(&self, error: Option<EngineError>) {
        self.forward(EngineEvent::ErrorChanged(error));
    }

    fn on_tracks_changed(&self, groups: Vec<TrackGroup>) {
        self.forward(EngineEvent::TracksChanged(groups));
    }
}

/// What routing an event did, for logging and event emission.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RouteOutcome {
    /// Event came from a released engine.
    Discarded,
    /// Observable state updated, nothing else.
    Applied,
    /// Engine re-prepared in place.
    Recovered(RecoveryReason),
    /// Source rebuilt with the next format.
    FormatFallback {
        from: FormatHint,
        to: FormatHint,
        error_code: i32,
    },
    /// Terminal error published.
    Surfaced(PlayerError),
}

/// Mutable player pieces the router writes to.
pub(crate) struct RouteTarget<'a> {
    pub session: &'a mut PlaybackSession,
    pub tracks: &'a mut TrackSelectionTable,
    pub state: &'a StatePublisher,
}

/// Applies engine callbacks to the session and observable state.
#[derive(Debug, Default)]
pub struct PlayerEventRouter {
    policy: FormatFallbackPolicy,
}

impl PlayerEventRouter {
    pub fn new(policy: FormatFallbackPolicy) -> Self {
        Self { policy }
    }

    pub(crate) fn route(
        &self,
        target: RouteTarget<'_>,
        engine_id: EngineId,
        event: EngineEvent,
        reconnect_mode: ReconnectMode,
    ) -> RouteOutcome {
        let RouteTarget {
            session,
            tracks,
            state,
        } = target;

        if !session.is_current(engine_id) {
            debug!(engine = %engine_id, ?event, "Discarding callback from stale engine");
            return RouteOutcome::Discarded;
        }

        match event {
            EngineEvent::VideoSizeChanged(size) => {
                state.update(|s| s.video_size = size);
                RouteOutcome::Applied
            }
            EngineEvent::PlaybackStateChanged(playback_state) => {
                // Observers keep the previous state while the stream reconnects.
                if playback_state == EngineState::Ended && reconnect_mode == ReconnectMode::Reconnect
                {
                    session.reseek();
                    return RouteOutcome::Recovered(RecoveryReason::Reconnect);
                }

                state.update(|s| {
                    s.playback_state = playback_state;
                    if playback_state == EngineState::Ready {
                        s.playback_error = None;
                    }
                });
                RouteOutcome::Applied
            }
            EngineEvent::ErrorChanged(None) => {
                trace!(engine = %engine_id, "Engine error cleared");
                RouteOutcome::Applied
            }
            EngineEvent::ErrorChanged(Some(error)) => self.route_error(session, state, error),
            EngineEvent::TracksChanged(groups) => {
                tracks.update(groups);
                state.update(|s| {
                    s.groups = tracks.groups().to_vec();
                    s.selected = tracks.selected().clone();
                });
                RouteOutcome::Applied
            }
        }
    }

    fn route_error(
        &self,
        session: &mut PlaybackSession,
        state: &StatePublisher,
        error: EngineError,
    ) -> RouteOutcome {
        let surfaced = state.current().playback_error.is_some();
        let from = session.format_hint();

        match self.policy.decide(from, &error, surfaced) {
            FallbackDecision::Reseek => {
                session.reseek();
                RouteOutcome::Recovered(RecoveryReason::BehindLiveWindow)
            }
            FallbackDecision::Advance(to) => {
                session.apply_hint(to);
                state.update(|s| s.format_hint = to);
                RouteOutcome::FormatFallback {
                    from,
                    to,
                    error_code: error.code.code(),
                }
            }
            FallbackDecision::Exhausted => {
                session.reset_hint();
                let published = PlayerError::fallback_exhausted(&error);
                state.update(|s| {
                    s.format_hint = FormatHint::None;
                    s.playback_error = Some(published.clone());
                });
                RouteOutcome::Surfaced(published)
            }
            FallbackDecision::Surface => {
                if surfaced {
                    warn!(%error, "Engine error while another error is surfaced");
                }
                let published = PlayerError::engine(&error);
                state.update(|s| s.playback_error = Some(published.clone()));
                RouteOutcome::Surfaced(published)
            }
        }
    }
}
