//! # Playback Session
//!
//! Owns the current engine, the URL it plays and the container format hint.
//!
//! The session never creates engines itself; [`PlayerManager`](crate::PlayerManager)
//! does that through the host factory and then [`install`](PlaybackSession::install)s
//! the result. Everything after that (source replacement, prepare, reseek,
//! teardown) goes through here so the engine is only touched in one place.

use crate::fallback::FormatHint;
use crate::router::EventForwarder;
use bridge_traits::{EngineId, MediaEngine, PlaybackPreferences, VideoSurface};
use std::sync::Arc;
use tracing::debug;

/// An engine together with the bookkeeping that belongs to it.
pub(crate) struct ActiveEngine {
    pub id: EngineId,
    pub engine: Box<dyn MediaEngine>,
    pub forwarder: Arc<EventForwarder>,
    /// Preferences the engine was built with.
    pub baseline: PlaybackPreferences,
}

/// Engine handle, URL and format hint of the player.
pub struct PlaybackSession {
    active: Option<ActiveEngine>,
    current_url: Option<String>,
    format_hint: FormatHint,
    surface: Option<VideoSurface>,
    next_id: u64,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self {
            active: None,
            current_url: None,
            format_hint: FormatHint::None,
            surface: None,
            next_id: 1,
        }
    }

    pub fn engine_id(&self) -> Option<EngineId> {
        self.active.as_ref().map(|active| active.id)
    }

    pub fn has_engine(&self) -> bool {
        self.active.is_some()
    }

    /// Whether `id` names the engine currently installed.
    pub fn is_current(&self, id: EngineId) -> bool {
        self.engine_id() == Some(id)
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub fn format_hint(&self) -> FormatHint {
        self.format_hint
    }

    /// Preferences the current engine was built with.
    pub fn baseline(&self) -> Option<PlaybackPreferences> {
        self.active.as_ref().map(|active| active.baseline)
    }

    /// Reserves the id for the next engine.
    pub(crate) fn allocate_id(&mut self) -> EngineId {
        let id = EngineId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Takes ownership of a freshly created engine.
    pub(crate) fn install(&mut self, mut active: ActiveEngine) {
        if self.surface.is_some() {
            active.engine.set_video_surface(self.surface);
        }
        debug!(engine = %active.id, "Engine installed");
        self.active = Some(active);
    }

    pub(crate) fn engine_mut(&mut self) -> Option<&mut (dyn MediaEngine + 'static)> {
        self.active.as_mut().map(|active| active.engine.as_mut())
    }

    /// Remembers `url` without touching the engine.
    pub(crate) fn set_url(&mut self, url: &str) {
        self.current_url = Some(url.to_string());
    }

    /// Points the engine at `url` with container inference and prepares it.
    ///
    /// Returns `false` when there is no engine.
    pub(crate) fn start(&mut self, url: &str) -> bool {
        self.set_url(url);
        self.format_hint = FormatHint::None;

        let Some(active) = self.active.as_mut() else {
            return false;
        };
        active
            .engine
            .set_media_source(FormatHint::None.media_source(url));
        active.engine.prepare();
        true
    }

    /// Rebuilds the source on the current engine with `hint` and prepares again.
    pub(crate) fn apply_hint(&mut self, hint: FormatHint) {
        self.format_hint = hint;

        let (Some(active), Some(url)) = (self.active.as_mut(), self.current_url.as_deref()) else {
            return;
        };
        active.engine.set_media_source(hint.media_source(url));
        active.engine.prepare();
    }

    pub(crate) fn reset_hint(&mut self) {
        self.format_hint = FormatHint::None;
    }

    /// Seeks to the live edge and prepares again without touching the source.
    pub(crate) fn reseek(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.engine.seek_to_default_position();
            active.engine.prepare();
        }
    }

    /// Sets the render surface, applying it to the current engine if any.
    pub(crate) fn attach_surface(&mut self, surface: Option<VideoSurface>) {
        self.surface = surface;
        if let Some(active) = self.active.as_mut() {
            active.engine.set_video_surface(surface);
        }
    }

    /// Detaches, stops and releases the engine and forgets URL and hint.
    ///
    /// The render surface is kept for the next engine. Returns the id of the
    /// released engine.
    pub(crate) fn release(&mut self) -> Option<EngineId> {
        self.current_url = None;
        self.format_hint = FormatHint::None;

        let mut active = self.active.take()?;
        active.forwarder.detach();
        active.engine.stop();
        active.engine.release();
        Some(active.id)
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("engine", &self.engine_id())
            .field("current_url", &self.current_url)
            .field("format_hint", &self.format_hint)
            .field("surface", &self.surface)
            .finish()
    }
}
