//! Shared fixtures for player integration tests.
//!
//! `FakeEngineFactory` hands out engines that record every call made on
//! them. Tests drive callbacks through the listener captured at creation.

#![allow(dead_code)]

use bridge_desktop::InMemoryPreferences;
use bridge_traits::{
    BridgeError, EngineError, EngineErrorCode, EngineOptions, EngineState, MediaEngine,
    MediaEngineFactory, MediaSource, PlayerListener, TrackFormat, TrackGroup, TrackGroupId,
    TrackInfo, TrackSelectionParameters, TrackType, VideoSurface,
};
use core_playback::{PlayerConfig, PlayerManager};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub const TIMEOUT: Duration = Duration::from_secs(2);

// ============================================================================
// Fake Engine
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    SetMediaSource(MediaSource),
    Prepare,
    SeekToDefaultPosition,
    SetPlayWhenReady(bool),
    SetTrackSelectionParameters(TrackSelectionParameters),
    SetVideoSurface(Option<VideoSurface>),
    Stop,
    Release,
}

struct FakeEngine {
    calls: Arc<Mutex<Vec<EngineCall>>>,
    parameters: Arc<Mutex<TrackSelectionParameters>>,
}

impl FakeEngine {
    fn record(&self, call: EngineCall) {
        self.calls.lock().push(call);
    }
}

impl MediaEngine for FakeEngine {
    fn set_media_source(&mut self, source: MediaSource) {
        self.record(EngineCall::SetMediaSource(source));
    }

    fn prepare(&mut self) {
        self.record(EngineCall::Prepare);
    }

    fn seek_to_default_position(&mut self) {
        self.record(EngineCall::SeekToDefaultPosition);
    }

    fn set_play_when_ready(&mut self, play_when_ready: bool) {
        self.record(EngineCall::SetPlayWhenReady(play_when_ready));
    }

    fn track_selection_parameters(&self) -> TrackSelectionParameters {
        self.parameters.lock().clone()
    }

    fn set_track_selection_parameters(&mut self, parameters: TrackSelectionParameters) {
        *self.parameters.lock() = parameters.clone();
        self.record(EngineCall::SetTrackSelectionParameters(parameters));
    }

    fn set_video_surface(&mut self, surface: Option<VideoSurface>) {
        self.record(EngineCall::SetVideoSurface(surface));
    }

    fn stop(&mut self) {
        self.record(EngineCall::Stop);
    }

    fn release(&mut self) {
        self.record(EngineCall::Release);
    }
}

/// Test-side view of one created engine.
#[derive(Clone)]
pub struct EngineHandle {
    pub options: EngineOptions,
    pub listener: Arc<dyn PlayerListener>,
    calls: Arc<Mutex<Vec<EngineCall>>>,
}

impl EngineHandle {
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    pub fn sources(&self) -> Vec<MediaSource> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::SetMediaSource(source) => Some(source),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &EngineCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn is_released(&self) -> bool {
        self.count(&EngineCall::Release) > 0
    }

    pub fn state(&self, state: EngineState) {
        self.listener.on_playback_state_changed(state);
    }

    pub fn fail(&self, code: EngineErrorCode) {
        self.listener
            .on_player_error_changed(Some(EngineError::new(code, format!("{:?}", code))));
    }

    pub fn tracks(&self, groups: Vec<TrackGroup>) {
        self.listener.on_tracks_changed(groups);
    }
}

#[derive(Default)]
pub struct FakeEngineFactory {
    engines: Mutex<Vec<EngineHandle>>,
    failure: Mutex<Option<String>>,
}

impl FakeEngineFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes every following `create` fail with `message`.
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock() = Some(message.to_string());
    }

    pub fn recover(&self) {
        *self.failure.lock() = None;
    }

    pub fn created(&self) -> usize {
        self.engines.lock().len()
    }

    pub fn engine(&self, index: usize) -> EngineHandle {
        self.engines.lock()[index].clone()
    }

    pub fn last(&self) -> EngineHandle {
        self.engines
            .lock()
            .last()
            .cloned()
            .expect("no engine created")
    }
}

impl MediaEngineFactory for FakeEngineFactory {
    fn create(
        &self,
        options: EngineOptions,
        listener: Arc<dyn PlayerListener>,
    ) -> bridge_traits::error::Result<Box<dyn MediaEngine>> {
        if let Some(message) = self.failure.lock().clone() {
            return Err(BridgeError::EngineCreation(message));
        }

        let calls = Arc::new(Mutex::new(Vec::new()));
        let engine = FakeEngine {
            calls: calls.clone(),
            parameters: Arc::new(Mutex::new(options.track_selection.clone())),
        };
        self.engines.lock().push(EngineHandle {
            options,
            listener,
            calls,
        });
        Ok(Box::new(engine))
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub struct Fixture {
    pub factory: Arc<FakeEngineFactory>,
    pub preferences: Arc<InMemoryPreferences>,
    pub player: PlayerManager,
}

pub fn fixture() -> Fixture {
    let factory = FakeEngineFactory::new();
    let preferences = Arc::new(InMemoryPreferences::default());
    let player = PlayerManager::new(
        factory.clone(),
        preferences.clone(),
        PlayerConfig::default(),
    )
    .expect("player");

    Fixture {
        factory,
        preferences,
        player,
    }
}

/// Waits until `rx` holds a value matching `predicate` and returns it.
pub async fn wait_for<T, F>(rx: &mut watch::Receiver<T>, predicate: F) -> T
where
    T: Clone,
    F: FnMut(&T) -> bool,
{
    let value = tokio::time::timeout(TIMEOUT, rx.wait_for(predicate))
        .await
        .expect("timed out waiting for observable")
        .expect("observable closed");
    (*value).clone()
}

pub fn track(label: &str, selected: bool) -> TrackInfo {
    TrackInfo {
        format: TrackFormat {
            label: Some(label.to_string()),
            ..Default::default()
        },
        supported: true,
        selected,
    }
}

pub fn group(id: &str, track_type: TrackType, tracks: Vec<TrackInfo>) -> TrackGroup {
    TrackGroup {
        id: TrackGroupId::new(id),
        track_type,
        selected: tracks.iter().any(|t| t.selected),
        tracks,
    }
}
