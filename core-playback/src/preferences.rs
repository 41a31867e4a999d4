//! # Preference Watcher
//!
//! Background task that follows a [`PreferenceSource`](bridge_traits::PreferenceSource)
//! while an engine exists. The player restarts it whenever a new engine is
//! installed and cancels it on release, so at most one watcher is alive.

use bridge_traits::PlaybackPreferences;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Returned by the change handler to keep or end the watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchControl {
    Continue,
    Stop,
}

/// Handle of a running watch task. Dropping it cancels the task.
#[derive(Debug)]
pub struct PreferenceWatcher {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl PreferenceWatcher {
    /// Spawns a task that calls `on_change` with every value seen on `rx`.
    ///
    /// The value current at spawn time is delivered first, so a change that
    /// landed between reading the engine's baseline and subscribing is not
    /// missed.
    pub fn spawn<F>(
        runtime: &Handle,
        mut rx: watch::Receiver<PlaybackPreferences>,
        mut on_change: F,
    ) -> Self
    where
        F: FnMut(PlaybackPreferences) -> WatchControl + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = runtime.spawn(async move {
            let initial = *rx.borrow_and_update();
            if on_change(initial) == WatchControl::Stop {
                return;
            }

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        trace!("Preference watcher cancelled");
                        break;
                    }
                    changed = rx.changed() => {
                        if changed.is_err() {
                            debug!("Preference source closed");
                            break;
                        }
                        let prefs = *rx.borrow_and_update();
                        if on_change(prefs) == WatchControl::Stop {
                            break;
                        }
                    }
                }
            }
        });

        Self { cancel, handle }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PreferenceWatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn prefs(tunneling: bool) -> PlaybackPreferences {
        PlaybackPreferences {
            tunneling,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_delivers_initial_then_changes() {
        let (tx, rx) = watch::channel(prefs(false));
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();

        let _watcher = PreferenceWatcher::spawn(&Handle::current(), rx, move |p| {
            seen_tx.send(p.tunneling).ok();
            WatchControl::Continue
        });

        assert_eq!(seen_rx.recv().await, Some(false));
        tx.send(prefs(true)).unwrap();
        assert_eq!(seen_rx.recv().await, Some(true));
    }

    #[tokio::test]
    async fn test_cancel_stops_delivery() {
        let (tx, rx) = watch::channel(prefs(false));
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();

        let watcher = PreferenceWatcher::spawn(&Handle::current(), rx, move |p| {
            seen_tx.send(p.tunneling).ok();
            WatchControl::Continue
        });
        assert_eq!(seen_rx.recv().await, Some(false));

        watcher.cancel();
        tokio::time::timeout(Duration::from_secs(1), async {
            while !watcher.is_finished() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        tx.send(prefs(true)).unwrap();
        assert_eq!(seen_rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_stop_ends_task() {
        let (tx, rx) = watch::channel(prefs(false));
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = calls.clone();

        let watcher = PreferenceWatcher::spawn(&Handle::current(), rx, move |_| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            WatchControl::Stop
        });

        tokio::time::timeout(Duration::from_secs(1), async {
            while !watcher.is_finished() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        tx.send(prefs(true)).ok();
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
