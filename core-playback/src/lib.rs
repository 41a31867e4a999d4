//! # IPTV Playback Core
//!
//! Drives one platform media engine for live IPTV streams.
//!
//! ## Overview
//!
//! This crate handles:
//! - Engine lifecycle: create on first `play`, reuse for source switches,
//!   tear down on `release`, rebuild on `replay`
//! - Container format fallback for URLs that do not say what they serve
//! - Recovery from falling behind the live window and from ended streams
//! - Track groups, per-type selection and track overrides
//! - Rebuilding the engine when connect timeout or tunneling preferences change
//! - Observable state on `tokio::sync::watch` channels
//! - A media session adapter for system transport controls
//!
//! The engine itself is a host capability
//! ([`MediaEngineFactory`](bridge_traits::MediaEngineFactory)); nothing in
//! here decodes or renders media.
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::{PlayerConfig, PlayerManager};
//! use core_runtime::config::CoreConfig;
//!
//! let core = CoreConfig::builder()
//!     .engine_factory(factory)
//!     .preference_source(preferences)
//!     .build()?;
//! let player = PlayerManager::from_config(&core, PlayerConfig::default())?;
//!
//! player.play("http://provider.example/live/user/pass/1234.ts");
//! let mut error = player.observers().playback_error;
//! ```

pub mod config;
pub mod error;
pub mod fallback;
pub mod manager;
pub mod media_session;
pub mod preferences;
pub mod router;
pub mod session;
pub mod state;
pub mod tracks;

pub use config::PlayerConfig;
pub use error::{PlaybackError, PlayerError, PlayerErrorKind, Result};
pub use fallback::{FallbackDecision, FormatFallbackPolicy, FormatHint};
pub use manager::PlayerManager;
pub use media_session::AVAILABLE_COMMANDS;
pub use preferences::{PreferenceWatcher, WatchControl};
pub use router::PlayerEventRouter;
pub use session::PlaybackSession;
pub use state::{PlaybackObservers, PlaybackSnapshot};
pub use tracks::{selected_by_type, TrackIndexOutOfRange, TrackSelectionTable};
