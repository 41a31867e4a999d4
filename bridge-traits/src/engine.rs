//! Media engine bridge traits.
//!
//! The playback core owns exactly one [`MediaEngine`] at a time and drives it
//! through this interface. Engines report back through a [`PlayerListener`]
//! handed to them at creation; callbacks may arrive on any engine thread.

use crate::error::Result;
use crate::playback::{
    EngineError, EngineState, TrackGroup, TrackSelectionParameters, VideoSize,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Identity of one engine instance created by the core.
///
/// Ids increase monotonically for the lifetime of a player manager, so a
/// callback tagged with an old id can always be told apart from the current
/// engine's callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EngineId(pub u64);

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "engine-{}", self.0)
    }
}

/// Opaque handle of a host rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoSurface(pub u64);

// ============================================================================
// Media sources
// ============================================================================

/// Which source implementation the engine should build for a URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFactory {
    /// Engine infers the container (optionally guided by the MIME hint).
    Default,
    /// Dedicated HLS source.
    Hls {
        /// Whether the engine may prepare without downloading segments.
        allow_chunkless_preparation: bool,
    },
    /// Plain progressive download.
    Progressive,
    /// RTSP session.
    Rtsp,
}

/// Media source description handed to [`MediaEngine::set_media_source`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSource {
    pub uri: String,
    /// Explicit container MIME type, `None` for inference.
    pub mime_type: Option<String>,
    pub factory: SourceFactory,
}

impl MediaSource {
    /// Source built with default container inference.
    pub fn inferred(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            mime_type: None,
            factory: SourceFactory::Default,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_factory(mut self, factory: SourceFactory) -> Self {
        self.factory = factory;
        self
    }
}

// ============================================================================
// Engine options
// ============================================================================

/// Buffering thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadControl {
    /// Stop buffering on time thresholds even when the byte target is not reached.
    pub prioritize_time_over_size_thresholds: bool,
    /// Byte target for the buffer; `None` lets the engine decide.
    pub target_buffer_bytes: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioUsage {
    Media,
    Alarm,
    Notification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioContentType {
    Unknown,
    Music,
    Movie,
    Speech,
}

/// Audio routing attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioAttributes {
    pub usage: AudioUsage,
    pub content_type: AudioContentType,
    /// Let the engine request and react to audio focus.
    pub handle_audio_focus: bool,
}

/// Cookie handling of the HTTP data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CookiePolicy {
    AcceptAll,
    AcceptNone,
    AcceptOriginalServer,
}

/// HTTP data source settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpDataSourceOptions {
    pub connect_timeout: Duration,
    pub cookie_policy: CookiePolicy,
    /// Skip certificate and hostname verification.
    pub accept_invalid_certs: bool,
}

/// Everything a factory needs to build an engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOptions {
    pub load_control: LoadControl,
    pub audio_attributes: AudioAttributes,
    pub http: HttpDataSourceOptions,
    /// Initial selection parameters (tunneling, bitrate policy).
    pub track_selection: TrackSelectionParameters,
    /// Fall back to a lower-priority decoder when initialisation fails.
    pub enable_decoder_fallback: bool,
    /// Pause when headphones are unplugged.
    pub handle_audio_becoming_noisy: bool,
    pub play_when_ready: bool,
    /// Attach the engine's own diagnostic event logger.
    pub attach_event_logger: bool,
}

// ============================================================================
// Traits
// ============================================================================

/// Callbacks delivered by an engine.
///
/// Implementations must not block: engines may invoke these from their
/// internal playback thread.
pub trait PlayerListener: Send + Sync {
    fn on_video_size_changed(&self, size: VideoSize);

    fn on_playback_state_changed(&self, state: EngineState);

    /// `None` means the previous error was cleared.
    fn on_player_error_changed(&self, error: Option<EngineError>);

    fn on_tracks_changed(&self, groups: Vec<TrackGroup>);
}

/// A live media engine instance.
///
/// None of the control methods fail synchronously; engine-side failures are
/// reported through [`PlayerListener::on_player_error_changed`].
pub trait MediaEngine: Send {
    /// Replaces the current source. Takes effect on the next [`prepare`](Self::prepare).
    fn set_media_source(&mut self, source: MediaSource);

    fn prepare(&mut self);

    fn seek_to_default_position(&mut self);

    fn set_play_when_ready(&mut self, play_when_ready: bool);

    fn track_selection_parameters(&self) -> TrackSelectionParameters;

    fn set_track_selection_parameters(&mut self, parameters: TrackSelectionParameters);

    fn set_video_surface(&mut self, surface: Option<VideoSurface>);

    fn stop(&mut self);

    /// Frees all engine resources. No callbacks may follow.
    fn release(&mut self);
}

/// Builds engines.
pub trait MediaEngineFactory: Send + Sync {
    /// Creates an engine configured with `options` that reports to `listener`.
    fn create(
        &self,
        options: EngineOptions,
        listener: Arc<dyn PlayerListener>,
    ) -> Result<Box<dyn MediaEngine>>;
}
