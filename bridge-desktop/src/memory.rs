//! Volatile preference source.

use bridge_traits::preferences::{PlaybackPreferences, PreferenceSource};
use tokio::sync::watch;
use tracing::debug;

/// Preference source backed by a `watch` channel.
///
/// Writes only notify subscribers when a value actually changes.
#[derive(Debug)]
pub struct InMemoryPreferences {
    tx: watch::Sender<PlaybackPreferences>,
}

impl Default for InMemoryPreferences {
    fn default() -> Self {
        Self::new(PlaybackPreferences::default())
    }
}

impl InMemoryPreferences {
    pub fn new(initial: PlaybackPreferences) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Replaces all values. Returns `true` if anything changed.
    pub fn set(&self, preferences: PlaybackPreferences) -> bool {
        self.update(|current| *current = preferences)
    }

    /// Applies `f` to the current values. Returns `true` if anything changed.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut PlaybackPreferences),
    {
        let changed = self.tx.send_if_modified(|current| {
            let before = *current;
            f(current);
            before != *current
        });
        if changed {
            debug!(preferences = ?*self.tx.borrow(), "Playback preferences updated");
        }
        changed
    }
}

impl PreferenceSource for InMemoryPreferences {
    fn current(&self) -> PlaybackPreferences {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<PlaybackPreferences> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::ReconnectMode;
    use std::time::Duration;

    #[test]
    fn starts_with_defaults() {
        let prefs = InMemoryPreferences::default();
        assert_eq!(prefs.current(), PlaybackPreferences::default());
    }

    #[test]
    fn unchanged_write_does_not_notify() {
        let prefs = InMemoryPreferences::default();
        let rx = prefs.subscribe();

        assert!(!prefs.set(PlaybackPreferences::default()));
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn subscribers_see_updates() {
        let prefs = InMemoryPreferences::default();
        let mut rx = prefs.subscribe();

        assert!(prefs.update(|p| p.tunneling = true));
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().tunneling);

        prefs.update(|p| {
            p.connect_timeout = Duration::from_secs(15);
            p.reconnect_mode = ReconnectMode::Reconnect;
        });
        rx.changed().await.unwrap();
        let seen = *rx.borrow();
        assert_eq!(seen.connect_timeout, Duration::from_secs(15));
        assert_eq!(seen.reconnect_mode, ReconnectMode::Reconnect);
    }

    #[test]
    fn writes_without_subscribers_are_kept() {
        let prefs = InMemoryPreferences::default();
        prefs.update(|p| p.tunneling = true);
        assert!(prefs.current().tunneling);
    }
}
