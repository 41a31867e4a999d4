//! Observable playback preferences.
//!
//! The host owns preference storage; the core only reads the current values
//! and watches for changes.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;

/// Default HTTP connect timeout for stream sources.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(8);

/// What to do when a stream reports that it has ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconnectMode {
    /// Let the stream end.
    #[default]
    None,
    /// Seek back to the live edge and prepare again.
    Reconnect,
}

/// Preference values that affect playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackPreferences {
    pub connect_timeout: Duration,
    pub tunneling: bool,
    pub reconnect_mode: ReconnectMode,
}

impl Default for PlaybackPreferences {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            tunneling: false,
            reconnect_mode: ReconnectMode::None,
        }
    }
}

impl PlaybackPreferences {
    /// Returns `true` when a change from `other` requires rebuilding the engine.
    ///
    /// Only the connect timeout and tunneling are baked into an engine at
    /// creation; the reconnect mode is read on every end-of-stream.
    pub fn requires_rebuild(&self, other: &PlaybackPreferences) -> bool {
        self.connect_timeout != other.connect_timeout || self.tunneling != other.tunneling
    }
}

/// Source of playback preferences.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::preferences::PreferenceSource;
///
/// async fn log_changes(source: &dyn PreferenceSource) {
///     let mut rx = source.subscribe();
///     while rx.changed().await.is_ok() {
///         println!("now: {:?}", *rx.borrow());
///     }
/// }
/// ```
pub trait PreferenceSource: Send + Sync {
    /// Current values.
    fn current(&self) -> PlaybackPreferences;

    /// Receiver that observes every future change.
    ///
    /// The receiver's initial value is the current one and is considered seen.
    fn subscribe(&self) -> watch::Receiver<PlaybackPreferences>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let prefs = PlaybackPreferences::default();
        assert_eq!(prefs.connect_timeout, Duration::from_secs(8));
        assert!(!prefs.tunneling);
        assert_eq!(prefs.reconnect_mode, ReconnectMode::None);
    }

    #[test]
    fn rebuild_ignores_reconnect_mode() {
        let base = PlaybackPreferences::default();

        let reconnect = PlaybackPreferences {
            reconnect_mode: ReconnectMode::Reconnect,
            ..base
        };
        assert!(!base.requires_rebuild(&reconnect));

        let tunneling = PlaybackPreferences {
            tunneling: true,
            ..base
        };
        assert!(base.requires_rebuild(&tunneling));

        let timeout = PlaybackPreferences {
            connect_timeout: Duration::from_secs(20),
            ..base
        };
        assert!(base.requires_rebuild(&timeout));
    }

    #[test]
    fn reconnect_mode_serializes_uppercase() {
        let json = serde_json::to_string(&ReconnectMode::Reconnect).unwrap();
        assert_eq!(json, "\"RECONNECT\"");
    }
}
