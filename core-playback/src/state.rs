//! # Observable Playback State
//!
//! Every field a UI renders is published on its own `tokio::sync::watch`
//! channel, plus one combined [`PlaybackSnapshot`] channel for consumers that
//! need a consistent view of all fields at once.
//!
//! Writes go through [`StatePublisher::update`], which mutates the snapshot
//! and then fans changed fields out to the per-field channels. Receivers are
//! only woken for fields whose value actually changed.

use crate::error::PlayerError;
use crate::fallback::FormatHint;
use bridge_traits::{EngineId, EngineState, TrackFormat, TrackGroup, TrackType, VideoSize};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::watch;

/// Everything observers can see, as one value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    /// Active engine, `None` while released.
    pub player: Option<EngineId>,
    pub url: Option<String>,
    pub video_size: VideoSize,
    pub playback_state: EngineState,
    pub playback_error: Option<PlayerError>,
    pub groups: Vec<TrackGroup>,
    pub selected: BTreeMap<TrackType, TrackFormat>,
    pub format_hint: FormatHint,
}

impl PlaybackSnapshot {
    /// Whether this is the released, empty state.
    pub fn is_released(&self) -> bool {
        *self == PlaybackSnapshot::default()
    }
}

/// Write side of the observables. Owned by the player core.
pub(crate) struct StatePublisher {
    snapshot: watch::Sender<PlaybackSnapshot>,
    player: watch::Sender<Option<EngineId>>,
    url: watch::Sender<Option<String>>,
    video_size: watch::Sender<VideoSize>,
    playback_state: watch::Sender<EngineState>,
    playback_error: watch::Sender<Option<PlayerError>>,
    groups: watch::Sender<Vec<TrackGroup>>,
    selected: watch::Sender<BTreeMap<TrackType, TrackFormat>>,
    format_hint: watch::Sender<FormatHint>,
}

fn set_if_changed<T: PartialEq>(tx: &watch::Sender<T>, value: &T)
where
    T: Clone,
{
    tx.send_if_modified(|current| {
        if current != value {
            *current = value.clone();
            true
        } else {
            false
        }
    });
}

impl StatePublisher {
    pub(crate) fn new() -> Self {
        let initial = PlaybackSnapshot::default();
        Self {
            player: watch::channel(initial.player).0,
            url: watch::channel(initial.url.clone()).0,
            video_size: watch::channel(initial.video_size).0,
            playback_state: watch::channel(initial.playback_state).0,
            playback_error: watch::channel(initial.playback_error.clone()).0,
            groups: watch::channel(initial.groups.clone()).0,
            selected: watch::channel(initial.selected.clone()).0,
            format_hint: watch::channel(initial.format_hint).0,
            snapshot: watch::channel(initial).0,
        }
    }

    /// Current published value.
    pub(crate) fn current(&self) -> PlaybackSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Applies `f` to the snapshot and publishes every changed field.
    pub(crate) fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut PlaybackSnapshot),
    {
        let changed = self.snapshot.send_if_modified(|snapshot| {
            let before = snapshot.clone();
            f(snapshot);
            *snapshot != before
        });

        if changed {
            self.fan_out();
        }
    }

    /// Resets everything to the released state.
    pub(crate) fn reset(&self) {
        self.update(|snapshot| *snapshot = PlaybackSnapshot::default());
    }

    fn fan_out(&self) {
        let snapshot = self.snapshot.borrow().clone();
        set_if_changed(&self.player, &snapshot.player);
        set_if_changed(&self.url, &snapshot.url);
        set_if_changed(&self.video_size, &snapshot.video_size);
        set_if_changed(&self.playback_state, &snapshot.playback_state);
        set_if_changed(&self.playback_error, &snapshot.playback_error);
        set_if_changed(&self.groups, &snapshot.groups);
        set_if_changed(&self.selected, &snapshot.selected);
        set_if_changed(&self.format_hint, &snapshot.format_hint);
    }

    pub(crate) fn observers(&self) -> PlaybackObservers {
        PlaybackObservers {
            snapshot: self.snapshot.subscribe(),
            player: self.player.subscribe(),
            url: self.url.subscribe(),
            video_size: self.video_size.subscribe(),
            playback_state: self.playback_state.subscribe(),
            playback_error: self.playback_error.subscribe(),
            groups: self.groups.subscribe(),
            selected: self.selected.subscribe(),
            format_hint: self.format_hint.subscribe(),
        }
    }
}

/// Read side of the observables.
///
/// Each field is an independent `watch::Receiver`; clone the ones a view
/// needs and await `changed()` on them.
#[derive(Debug, Clone)]
pub struct PlaybackObservers {
    pub snapshot: watch::Receiver<PlaybackSnapshot>,
    pub player: watch::Receiver<Option<EngineId>>,
    pub url: watch::Receiver<Option<String>>,
    pub video_size: watch::Receiver<VideoSize>,
    pub playback_state: watch::Receiver<EngineState>,
    pub playback_error: watch::Receiver<Option<PlayerError>>,
    pub groups: watch::Receiver<Vec<TrackGroup>>,
    pub selected: watch::Receiver<BTreeMap<TrackType, TrackFormat>>,
    pub format_hint: watch::Receiver<FormatHint>,
}
