//! # Host Bridge Traits
//!
//! Capability contracts between the playback core and the host platform.
//!
//! ## Overview
//!
//! The playback core never talks to a concrete media framework, preference
//! store or logging backend. Each of those is a capability the host provides
//! by implementing one of the traits below.
//!
//! ## Traits
//!
//! ### Media engine
//! - [`MediaEngineFactory`](engine::MediaEngineFactory) - Builds a configured engine instance
//! - [`MediaEngine`](engine::MediaEngine) - Source replacement, prepare/seek/stop/release, track selection
//! - [`PlayerListener`](engine::PlayerListener) - Callbacks the engine delivers back to the core
//!
//! ### Media session
//! - [`MediaSessionCallback`](session::MediaSessionCallback) - Transport commands from system media controls
//!
//! ### Preferences & logging
//! - [`PreferenceSource`](preferences::PreferenceSource) - Observable playback preferences
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to the host logger
//!
//! ## Platform Requirements
//!
//! | Capability          | Desktop adapter                       | Android/iOS |
//! |---------------------|---------------------------------------|-------------|
//! | `PreferenceSource`  | `bridge-desktop` (memory, SQLite)     | host-provided |
//! | `MediaEngineFactory`| host-provided                         | host-provided |
//! | `LoggerSink`        | [`ConsoleLogger`](logging::ConsoleLogger) | Logcat / OSLog |
//!
//! ## Error Handling
//!
//! Fallible bridge operations return [`BridgeError`](error::BridgeError).
//! Engine failures that happen during playback are *not* returned from
//! method calls; engines report them through
//! [`PlayerListener::on_player_error_changed`](engine::PlayerListener::on_player_error_changed).
//!
//! ## Thread Safety
//!
//! Engines are driven from the core's state lock and must be `Send`.
//! Listeners, factories, preference sources and sinks are shared across
//! threads and must be `Send + Sync`.

pub mod engine;
pub mod error;
pub mod logging;
pub mod playback;
pub mod preferences;
pub mod session;

pub use error::BridgeError;

// Re-export commonly used types
pub use engine::{
    AudioAttributes, AudioContentType, AudioUsage, CookiePolicy, EngineId, EngineOptions,
    HttpDataSourceOptions, LoadControl, MediaEngine, MediaEngineFactory, MediaSource,
    PlayerListener, SourceFactory, VideoSurface,
};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use playback::{
    mime_types, EngineError, EngineErrorCode, EngineState, TrackFormat, TrackGroup, TrackGroupId,
    TrackInfo, TrackSelectionOverride, TrackSelectionParameters, TrackType, VideoSize,
};
pub use preferences::{PlaybackPreferences, PreferenceSource, ReconnectMode};
pub use session::{
    CommandResult, ConnectionResult, ControllerInfo, MediaSessionCallback, SessionCommand,
};
