//! # Player Manager Usage Example
//!
//! Wires a `PlayerManager` to a console engine that prints every call, then
//! walks through container fallback, track selection and release.
//!
//! Run with: `cargo run --example playback_demo --package core-playback`

use bridge_desktop::InMemoryPreferences;
use bridge_traits::{
    EngineError, EngineErrorCode, EngineOptions, EngineState, MediaEngine, MediaEngineFactory,
    MediaSource, PlayerListener, TrackFormat, TrackGroup, TrackGroupId, TrackInfo,
    TrackSelectionParameters, TrackType, VideoSurface,
};
use core_playback::{PlayerConfig, PlayerManager};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Console Engine (for demonstration)
// ============================================================================

struct ConsoleEngine {
    parameters: TrackSelectionParameters,
}

impl MediaEngine for ConsoleEngine {
    fn set_media_source(&mut self, source: MediaSource) {
        println!(
            "  engine: source {} (mime: {:?}, factory: {:?})",
            source.uri, source.mime_type, source.factory
        );
    }

    fn prepare(&mut self) {
        println!("  engine: prepare");
    }

    fn seek_to_default_position(&mut self) {
        println!("  engine: seek to live edge");
    }

    fn set_play_when_ready(&mut self, play_when_ready: bool) {
        println!("  engine: play_when_ready = {}", play_when_ready);
    }

    fn track_selection_parameters(&self) -> TrackSelectionParameters {
        self.parameters.clone()
    }

    fn set_track_selection_parameters(&mut self, parameters: TrackSelectionParameters) {
        println!("  engine: overrides {:?}", parameters.overrides.values());
        self.parameters = parameters;
    }

    fn set_video_surface(&mut self, surface: Option<VideoSurface>) {
        println!("  engine: surface {:?}", surface);
    }

    fn stop(&mut self) {
        println!("  engine: stop");
    }

    fn release(&mut self) {
        println!("  engine: release");
    }
}

#[derive(Default)]
struct ConsoleEngineFactory {
    listener: Mutex<Option<Arc<dyn PlayerListener>>>,
}

impl MediaEngineFactory for ConsoleEngineFactory {
    fn create(
        &self,
        options: EngineOptions,
        listener: Arc<dyn PlayerListener>,
    ) -> bridge_traits::error::Result<Box<dyn MediaEngine>> {
        println!(
            "  factory: new engine (timeout {:?}, tunneling {})",
            options.http.connect_timeout, options.track_selection.tunneling_enabled
        );
        *self.listener.lock() = Some(listener);
        Ok(Box::new(ConsoleEngine {
            parameters: options.track_selection,
        }))
    }
}

impl ConsoleEngineFactory {
    fn listener(&self) -> Option<Arc<dyn PlayerListener>> {
        self.listener.lock().clone()
    }
}

fn audio_group() -> TrackGroup {
    let track = |language: &str, selected: bool| TrackInfo {
        format: TrackFormat {
            language: Some(language.to_string()),
            ..Default::default()
        },
        supported: true,
        selected,
    };

    TrackGroup {
        id: TrackGroupId::new("audio-0"),
        track_type: TrackType::Audio,
        selected: true,
        tracks: vec![track("en", true), track("de", false)],
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::main]
async fn main() -> core_playback::Result<()> {
    let factory = Arc::new(ConsoleEngineFactory::default());
    let preferences = Arc::new(InMemoryPreferences::default());
    let player = PlayerManager::new(factory.clone(), preferences.clone(), PlayerConfig::default())?;

    println!("play");
    player.play("http://provider.example/live/1234.ts");

    let Some(listener) = factory.listener() else {
        println!("no engine was created");
        return Ok(());
    };

    println!("container malformed");
    listener.on_player_error_changed(Some(EngineError::new(
        EngineErrorCode::ParsingContainerMalformed,
        "not a transport stream",
    )));
    settle().await;
    println!("  format hint: {}", player.format_hint());

    println!("ready with tracks");
    listener.on_playback_state_changed(EngineState::Ready);
    let audio = audio_group();
    listener.on_tracks_changed(vec![audio.clone()]);
    settle().await;
    println!("  selected: {:?}", player.selected_by_type());

    println!("choose German audio");
    player.choose_track(&audio, 1);

    println!("enable tunneling");
    preferences.update(|p| p.tunneling = true);
    settle().await;

    println!("release");
    player.release();
    println!("  released: {}", player.snapshot().is_released());

    Ok(())
}
