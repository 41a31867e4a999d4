//! Integration tests for track selection through the player

mod support;

use bridge_traits::{TrackGroupId, TrackSelectionParameters, TrackType};
use core_playback::{selected_by_type, TrackSelectionTable};
use support::*;

const URL: &str = "http://x/live.m3u8";

fn override_calls(engine: &EngineHandle) -> Vec<TrackSelectionParameters> {
    engine
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            EngineCall::SetTrackSelectionParameters(params) => Some(params),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_choose_track_without_engine_has_no_effect() {
    let fx = fixture();
    let audio = group("a", TrackType::Audio, vec![track("en", true), track("de", false)]);
    let before = fx.player.snapshot();

    fx.player.choose_track(&audio, 1);

    assert_eq!(fx.player.snapshot(), before);
    assert_eq!(fx.factory.created(), 0);
}

#[tokio::test]
async fn test_choose_track_merges_override_per_type() {
    let fx = fixture();
    fx.player.play(URL);
    let engine = fx.factory.last();

    let audio = group("a", TrackType::Audio, vec![track("en", true), track("de", false)]);
    let text = group("t", TrackType::Text, vec![track("subs", false)]);

    fx.player.choose_track(&text, 0);
    fx.player.choose_track(&audio, 1);
    fx.player.choose_track(&audio, 0);

    let params = override_calls(&engine).pop().expect("parameters set");
    assert_eq!(params.overrides.len(), 2);
    assert_eq!(
        params.override_for(TrackType::Audio).map(|o| o.track_indices.clone()),
        Some(vec![0])
    );
    assert_eq!(
        params.override_for(TrackType::Text).map(|o| o.group_id.clone()),
        Some(TrackGroupId::new("t"))
    );
    // Settings from engine creation are kept.
    assert!(params.force_highest_supported_bitrate);
}

#[tokio::test]
async fn test_choose_track_out_of_range_is_ignored() {
    let fx = fixture();
    fx.player.play(URL);
    let engine = fx.factory.last();

    let video = group("v", TrackType::Video, vec![track("1080p", true)]);
    fx.player.choose_track(&video, 4);

    assert!(override_calls(&engine).is_empty());
}

#[tokio::test]
async fn test_selection_follows_track_updates() {
    let fx = fixture();
    let mut observers = fx.player.observers();

    fx.player.play(URL);
    let engine = fx.factory.last();

    let first = vec![group(
        "a",
        TrackType::Audio,
        vec![track("en", true), track("de", false)],
    )];
    engine.tracks(first.clone());
    wait_for(&mut observers.groups, |g| *g == first).await;
    assert_eq!(
        fx.player.selected_by_type()[&TrackType::Audio].label.as_deref(),
        Some("en")
    );

    let second = vec![group(
        "a",
        TrackType::Audio,
        vec![track("en", false), track("de", true)],
    )];
    engine.tracks(second.clone());
    let published = wait_for(&mut observers.selected, |s| {
        s.get(&TrackType::Audio).and_then(|f| f.label.as_deref()) == Some("de")
    })
    .await;

    assert_eq!(published, selected_by_type(&second));
    let mut table = TrackSelectionTable::new();
    table.update(second);
    assert_eq!(&published, table.selected());
}
