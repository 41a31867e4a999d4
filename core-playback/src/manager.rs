//! # Player Manager
//!
//! The object hosts construct and keep for as long as they show video. It
//! ties the pieces of this crate together:
//!
//! - [`PlaybackSession`](crate::session::PlaybackSession) owns the engine
//! - [`PlayerEventRouter`](crate::PlayerEventRouter) applies engine callbacks
//! - [`TrackSelectionTable`](crate::TrackSelectionTable) tracks groups and selection
//! - [`PreferenceWatcher`](crate::PreferenceWatcher) rebuilds the engine when
//!   engine-level preferences change
//!
//! All of them sit behind one lock. Commands take the lock on the caller's
//! thread and return once the engine has been told what to do. Engine
//! callbacks go through a channel to a dispatcher task that takes the same
//! lock, so callbacks and commands never interleave.
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::{PlayerConfig, PlayerManager};
//!
//! let manager = PlayerManager::new(factory, preferences, PlayerConfig::default())?;
//! let mut state = manager.observers().playback_state;
//!
//! manager.play("http://provider.example/live/42.ts");
//! state.changed().await?;
//! ```

use crate::config::PlayerConfig;
use crate::error::{PlaybackError, PlayerError, Result};
use crate::fallback::FormatHint;
use crate::media_session::MediaSessionAdapter;
use crate::preferences::{PreferenceWatcher, WatchControl};
use crate::router::{
    EngineEvent, EventForwarder, PlayerEventRouter, RouteOutcome, RouteTarget, TaggedEvent,
};
use crate::session::{ActiveEngine, PlaybackSession};
use crate::state::{PlaybackObservers, PlaybackSnapshot, StatePublisher};
use crate::tracks::TrackSelectionTable;
use bridge_traits::{
    EngineId, EngineState, MediaEngineFactory, MediaSessionCallback, PlaybackPreferences,
    PlayerListener, PreferenceSource, TrackFormat, TrackGroup, TrackType, VideoSurface,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, PreferencesEvent};
use core_runtime::logging::redact_url;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Everything guarded by the player lock.
struct PlayerCore {
    session: PlaybackSession,
    tracks: TrackSelectionTable,
    state: StatePublisher,
    router: PlayerEventRouter,
    watcher: Option<PreferenceWatcher>,
}

/// State shared between the manager, the dispatcher, the preference watcher
/// and the media session adapter.
pub(crate) struct Shared {
    this: Weak<Shared>,
    core: Mutex<PlayerCore>,
    factory: Arc<dyn MediaEngineFactory>,
    preferences: Arc<dyn PreferenceSource>,
    config: PlayerConfig,
    events: Option<EventBus>,
    runtime: Handle,
    event_tx: mpsc::UnboundedSender<TaggedEvent>,
}

/// IPTV player: one engine at a time, observable state, format fallback.
pub struct PlayerManager {
    shared: Arc<Shared>,
    dispatcher: JoinHandle<()>,
}

impl PlayerManager {
    /// Creates a player.
    ///
    /// Must be called from within a Tokio runtime; the dispatcher and
    /// preference watcher run on it.
    pub fn new(
        factory: Arc<dyn MediaEngineFactory>,
        preferences: Arc<dyn PreferenceSource>,
        config: PlayerConfig,
    ) -> Result<Self> {
        Self::with_event_bus(factory, preferences, config, None)
    }

    /// Creates a player from the core capability configuration.
    ///
    /// Lifecycle events are published when `emit_events` is on.
    pub fn from_config(core: &CoreConfig, config: PlayerConfig) -> Result<Self> {
        core.validate()?;
        Self::with_event_bus(
            core.engine_factory.clone(),
            core.preference_source.clone(),
            config,
            core.active_event_bus().cloned(),
        )
    }

    fn with_event_bus(
        factory: Arc<dyn MediaEngineFactory>,
        preferences: Arc<dyn PreferenceSource>,
        config: PlayerConfig,
        events: Option<EventBus>,
    ) -> Result<Self> {
        config.validate().map_err(PlaybackError::InvalidConfig)?;
        let runtime = Handle::try_current().map_err(|e| PlaybackError::NoRuntime(e.to_string()))?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let shared = Arc::new_cyclic(|this| Shared {
            this: this.clone(),
            core: Mutex::new(PlayerCore {
                session: PlaybackSession::new(),
                tracks: TrackSelectionTable::new(),
                state: StatePublisher::new(),
                router: PlayerEventRouter::default(),
                watcher: None,
            }),
            factory,
            preferences,
            config,
            events,
            runtime: runtime.clone(),
            event_tx,
        });

        let dispatcher = runtime.spawn(run_dispatcher(Arc::downgrade(&shared), event_rx));
        debug!(target: "player", "Player manager created");

        Ok(Self { shared, dispatcher })
    }

    /// Starts `url`, creating an engine if none exists.
    ///
    /// With an engine already present the source is replaced on it. Failures
    /// are published on `playback_error`, never returned.
    #[instrument(target = "player", skip(self, url), fields(url = %redact_url(url)))]
    pub fn play(&self, url: &str) {
        self.shared.play(url);
    }

    /// Tears down the engine and resets every observable.
    ///
    /// No-op without an engine.
    #[instrument(target = "player", skip(self))]
    pub fn release(&self) {
        self.shared.release();
    }

    /// Releases and plays the current URL again on a fresh engine.
    ///
    /// No-op when nothing was played.
    #[instrument(target = "player", skip(self))]
    pub fn replay(&self) {
        self.shared.replay("requested");
    }

    /// Forces track `track_index` of `group`.
    ///
    /// Ignored without an engine. An out-of-range index is logged and ignored.
    #[instrument(target = "player", skip(self, group), fields(group = %group.id.0))]
    pub fn choose_track(&self, group: &TrackGroup, track_index: usize) {
        self.shared.choose_track(group, track_index);
    }

    /// Sets the surface video is rendered to. Kept across engine rebuilds.
    pub fn attach_surface(&self, surface: Option<VideoSurface>) {
        self.shared.core.lock().session.attach_surface(surface);
    }

    /// Pauses the engine. Returns `false` when there is none.
    pub fn pause(&self) -> bool {
        self.shared.pause()
    }

    /// Resumes the engine, preparing it again if it was stopped.
    /// Returns `false` when there is none.
    pub fn resume(&self) -> bool {
        self.shared.resume()
    }

    /// Jumps to the live edge. Returns `false` when there is no engine.
    pub fn seek_to_default_position(&self) -> bool {
        self.shared.seek_to_default_position()
    }

    /// Receivers for every observable field.
    pub fn observers(&self) -> PlaybackObservers {
        self.shared.core.lock().state.observers()
    }

    /// Current value of every observable field.
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.shared.core.lock().state.current()
    }

    /// Selected track format per track type.
    pub fn selected_by_type(&self) -> BTreeMap<TrackType, TrackFormat> {
        self.shared.core.lock().tracks.selected().clone()
    }

    pub fn format_hint(&self) -> FormatHint {
        self.shared.core.lock().session.format_hint()
    }

    /// Handler for system media controls.
    ///
    /// The adapter does not keep the player alive; once the manager is
    /// dropped it rejects every command.
    pub fn session_callback(&self) -> Arc<dyn MediaSessionCallback> {
        Arc::new(MediaSessionAdapter::new(Arc::downgrade(&self.shared)))
    }
}

impl Drop for PlayerManager {
    fn drop(&mut self) {
        self.shared.release();
        self.dispatcher.abort();
    }
}

impl std::fmt::Debug for PlayerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.shared.core.lock();
        f.debug_struct("PlayerManager")
            .field("session", &core.session)
            .field("config", &self.shared.config)
            .finish()
    }
}

async fn run_dispatcher(shared: Weak<Shared>, mut rx: mpsc::UnboundedReceiver<TaggedEvent>) {
    while let Some((engine_id, event)) = rx.recv().await {
        let Some(shared) = shared.upgrade() else {
            break;
        };
        shared.dispatch(engine_id, event);
    }
    debug!(target: "player", "Event dispatcher stopped");
}

impl Shared {
    fn emit(&self, event: CoreEvent) {
        if let Some(bus) = &self.events {
            // No subscribers is fine.
            let _ = bus.emit(event);
        }
    }

    fn emit_playback(&self, event: PlaybackEvent) {
        self.emit(CoreEvent::Playback(event));
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    pub(crate) fn play(&self, url: &str) {
        let mut core = self.core.lock();
        self.play_locked(&mut core, url);
    }

    pub(crate) fn release(&self) {
        let mut core = self.core.lock();
        self.release_locked(&mut core);
    }

    pub(crate) fn replay(&self, reason: &str) {
        let mut core = self.core.lock();
        self.replay_locked(&mut core, reason);
    }

    fn choose_track(&self, group: &TrackGroup, track_index: usize) {
        let mut core = self.core.lock();
        let Some(engine) = core.session.engine_mut() else {
            debug!(target: "player", "No engine, ignoring track selection");
            return;
        };

        let current = engine.track_selection_parameters();
        match TrackSelectionTable::override_parameters(current, group, track_index) {
            Ok(parameters) => {
                engine.set_track_selection_parameters(parameters);
                debug!(
                    target: "player",
                    track_type = ?group.track_type,
                    track_index,
                    "Track override applied"
                );
            }
            Err(err) => warn!(
                target: "player",
                index = err.index,
                len = err.len,
                "Track index out of range, ignoring selection"
            ),
        }
    }

    pub(crate) fn pause(&self) -> bool {
        let mut core = self.core.lock();
        match core.session.engine_mut() {
            Some(engine) => {
                engine.set_play_when_ready(false);
                true
            }
            None => false,
        }
    }

    pub(crate) fn resume(&self) -> bool {
        let mut core = self.core.lock();
        let stopped = core.state.current().playback_state == EngineState::Idle;
        match core.session.engine_mut() {
            Some(engine) => {
                if stopped {
                    engine.prepare();
                }
                engine.set_play_when_ready(true);
                true
            }
            None => false,
        }
    }

    pub(crate) fn seek_to_default_position(&self) -> bool {
        let mut core = self.core.lock();
        match core.session.engine_mut() {
            Some(engine) => {
                engine.seek_to_default_position();
                true
            }
            None => false,
        }
    }

    pub(crate) fn has_engine(&self) -> bool {
        self.core.lock().session.has_engine()
    }

    // ------------------------------------------------------------------
    // Locked operations
    // ------------------------------------------------------------------

    fn play_locked(&self, core: &mut PlayerCore, url: &str) {
        if !core.session.has_engine() && !self.create_engine(core, url) {
            return;
        }

        core.session.start(url);
        let engine_id = core.session.engine_id();
        core.state.update(|s| {
            s.player = engine_id;
            s.url = Some(url.to_string());
            s.format_hint = FormatHint::None;
            s.playback_error = None;
        });

        if let Some(id) = engine_id {
            self.restart_watcher(core, id);
            info!(target: "player", engine = %id, url = %redact_url(url), "Playback started");
            self.emit_playback(PlaybackEvent::Started {
                engine_id: id.0,
                url: redact_url(url),
            });
        }
    }

    /// Builds and installs a new engine. On failure the error is published
    /// and `false` returned.
    fn create_engine(&self, core: &mut PlayerCore, url: &str) -> bool {
        let baseline = self.preferences.current();
        let id = core.session.allocate_id();
        let forwarder = Arc::new(EventForwarder::new(id, self.event_tx.clone()));
        let listener: Arc<dyn PlayerListener> = forwarder.clone();

        match self
            .factory
            .create(self.config.engine_options(&baseline), listener)
        {
            Ok(engine) => {
                core.session.install(ActiveEngine {
                    id,
                    engine,
                    forwarder,
                    baseline,
                });
                debug!(
                    target: "player",
                    engine = %id,
                    connect_timeout_ms = baseline.connect_timeout.as_millis() as u64,
                    tunneling = baseline.tunneling,
                    "Engine created"
                );
                self.emit_playback(PlaybackEvent::EngineCreated { engine_id: id.0 });
                true
            }
            Err(err) => {
                forwarder.detach();
                error!(target: "player", error = %err, "Failed to create engine");

                // Keep the URL so a later replay can try again.
                core.session.set_url(url);
                let published = PlayerError::engine_unavailable(&err);
                core.state.update(|s| {
                    s.url = Some(url.to_string());
                    s.playback_error = Some(published.clone());
                });
                self.emit_playback(PlaybackEvent::Error {
                    engine_id: None,
                    kind: published.kind.as_str().to_string(),
                    code: None,
                    message: published.message,
                });
                false
            }
        }
    }

    fn release_locked(&self, core: &mut PlayerCore) {
        if let Some(watcher) = core.watcher.take() {
            watcher.cancel();
        }

        let released = core.session.release();
        core.tracks.clear();
        core.state.reset();

        if let Some(id) = released {
            info!(target: "player", engine = %id, "Player released");
            self.emit_playback(PlaybackEvent::Released { engine_id: id.0 });
        }
    }

    fn replay_locked(&self, core: &mut PlayerCore, reason: &str) {
        let Some(url) = core.session.current_url().map(str::to_string) else {
            debug!(target: "player", "Nothing to replay");
            return;
        };

        info!(target: "player", reason, "Replaying current stream");
        self.emit_playback(PlaybackEvent::Replaying {
            reason: reason.to_string(),
        });
        self.release_locked(core);
        self.play_locked(core, &url);
    }

    // ------------------------------------------------------------------
    // Preferences
    // ------------------------------------------------------------------

    fn restart_watcher(&self, core: &mut PlayerCore, engine_id: EngineId) {
        let this = self.this.clone();
        let watcher = PreferenceWatcher::spawn(
            &self.runtime,
            self.preferences.subscribe(),
            move |prefs| match this.upgrade() {
                Some(shared) => shared.on_preferences_changed(engine_id, prefs),
                None => WatchControl::Stop,
            },
        );

        if let Some(previous) = core.watcher.replace(watcher) {
            previous.cancel();
        }
    }

    fn on_preferences_changed(
        &self,
        engine_id: EngineId,
        prefs: PlaybackPreferences,
    ) -> WatchControl {
        let mut core = self.core.lock();
        if !core.session.is_current(engine_id) {
            return WatchControl::Stop;
        }

        let Some(baseline) = core.session.baseline() else {
            return WatchControl::Stop;
        };
        if !baseline.requires_rebuild(&prefs) {
            return WatchControl::Continue;
        }

        info!(
            target: "player",
            connect_timeout_ms = prefs.connect_timeout.as_millis() as u64,
            tunneling = prefs.tunneling,
            "Engine settings changed, rebuilding player"
        );
        self.emit(CoreEvent::Preferences(PreferencesEvent::EngineSettingsChanged {
            connect_timeout_ms: prefs.connect_timeout.as_millis() as u64,
            tunneling: prefs.tunneling,
        }));
        self.replay_locked(&mut core, "preferences changed");

        // The rebuilt engine has its own watcher.
        WatchControl::Stop
    }

    // ------------------------------------------------------------------
    // Engine callbacks
    // ------------------------------------------------------------------

    fn dispatch(&self, engine_id: EngineId, event: EngineEvent) {
        let reconnect_mode = self.preferences.current().reconnect_mode;
        let mut guard = self.core.lock();
        let core = &mut *guard;

        let outcome = core.router.route(
            RouteTarget {
                session: &mut core.session,
                tracks: &mut core.tracks,
                state: &core.state,
            },
            engine_id,
            event,
            reconnect_mode,
        );

        match outcome {
            RouteOutcome::Discarded | RouteOutcome::Applied => {}
            RouteOutcome::Recovered(reason) => {
                info!(target: "player", engine = %engine_id, ?reason, "Re-preparing engine");
                self.emit_playback(PlaybackEvent::Recovered {
                    engine_id: engine_id.0,
                    reason,
                });
            }
            RouteOutcome::FormatFallback {
                from,
                to,
                error_code,
            } => {
                warn!(
                    target: "player",
                    engine = %engine_id,
                    %from,
                    %to,
                    error_code,
                    "Source failed, retrying with next container format"
                );
                self.emit_playback(PlaybackEvent::FormatFallback {
                    engine_id: engine_id.0,
                    from: from.to_string(),
                    to: to.to_string(),
                    error_code,
                });
            }
            RouteOutcome::Surfaced(published) => {
                error!(target: "player", engine = %engine_id, error = %published, "Playback error");
                self.emit_playback(PlaybackEvent::Error {
                    engine_id: Some(engine_id.0),
                    kind: published.kind.as_str().to_string(),
                    code: published.error_code(),
                    message: published.message,
                });
            }
        }
    }
}
