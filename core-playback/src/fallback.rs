//! # Container Format Fallback
//!
//! IPTV URLs rarely say what they point to. A `.ts` link may serve an HLS
//! playlist, a `/live/123` path may be DASH. The engine first tries to infer
//! the container itself; when it fails with a parsing or unspecified I/O
//! error the source is rebuilt with an explicit format, walking
//!
//! ```text
//! None → Hls → Dash → SmoothStreaming → Rtsp → (exhausted)
//! ```
//!
//! Each step rebuilds the source on the *same* engine. Once RTSP fails the
//! hint resets to `None` and the error is surfaced.

use bridge_traits::{mime_types, EngineError, EngineErrorCode, MediaSource, SourceFactory};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Container format currently forced on the media source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormatHint {
    /// Let the engine infer the container.
    #[default]
    None,
    Hls,
    Dash,
    SmoothStreaming,
    Rtsp,
}

impl FormatHint {
    /// Every hint in fallback order.
    pub const SEQUENCE: [FormatHint; 5] = [
        FormatHint::None,
        FormatHint::Hls,
        FormatHint::Dash,
        FormatHint::SmoothStreaming,
        FormatHint::Rtsp,
    ];

    /// Next hint to try, `None` once RTSP has been tried.
    pub fn next(self) -> Option<FormatHint> {
        match self {
            FormatHint::None => Some(FormatHint::Hls),
            FormatHint::Hls => Some(FormatHint::Dash),
            FormatHint::Dash => Some(FormatHint::SmoothStreaming),
            FormatHint::SmoothStreaming => Some(FormatHint::Rtsp),
            FormatHint::Rtsp => None,
        }
    }

    /// MIME type forced on the source.
    pub fn mime_type(self) -> Option<&'static str> {
        match self {
            FormatHint::None => None,
            FormatHint::Hls => Some(mime_types::APPLICATION_M3U8),
            FormatHint::Dash => Some(mime_types::APPLICATION_MPD),
            FormatHint::SmoothStreaming => Some(mime_types::APPLICATION_SS),
            FormatHint::Rtsp => Some(mime_types::APPLICATION_RTSP),
        }
    }

    /// Builds the media source for `uri` under this hint.
    pub fn media_source(self, uri: &str) -> MediaSource {
        let source = MediaSource::inferred(uri);
        let source = match self.mime_type() {
            Some(mime) => source.with_mime_type(mime),
            None => source,
        };

        match self {
            FormatHint::None | FormatHint::Dash => source,
            FormatHint::Hls => source.with_factory(SourceFactory::Hls {
                allow_chunkless_preparation: false,
            }),
            FormatHint::SmoothStreaming => source.with_factory(SourceFactory::Progressive),
            FormatHint::Rtsp => source.with_factory(SourceFactory::Rtsp),
        }
    }
}

impl fmt::Display for FormatHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormatHint::None => "None",
            FormatHint::Hls => "Hls",
            FormatHint::Dash => "Dash",
            FormatHint::SmoothStreaming => "SmoothStreaming",
            FormatHint::Rtsp => "Rtsp",
        };
        f.write_str(name)
    }
}

/// What to do about an engine error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackDecision {
    /// Rebuild the source with this hint and prepare again.
    Advance(FormatHint),
    /// Seek to the live edge and prepare again, hint unchanged.
    Reseek,
    /// The last format failed: reset the hint and surface the error.
    Exhausted,
    /// Not recoverable here: surface the error as is.
    Surface,
}

/// Decides how engine errors are recovered.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatFallbackPolicy;

impl FormatFallbackPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Errors that suggest the container was guessed wrong.
    pub fn is_fallback_trigger(code: EngineErrorCode) -> bool {
        matches!(
            code.normalized(),
            EngineErrorCode::ParsingContainerMalformed
                | EngineErrorCode::ParsingManifestMalformed
                | EngineErrorCode::ParsingContainerUnsupported
                | EngineErrorCode::ParsingManifestUnsupported
                | EngineErrorCode::IoUnspecified
        )
    }

    /// Decides what to do about `error` under `hint`.
    ///
    /// `error_surfaced` is whether a terminal error is already published;
    /// format fallback is skipped in that case.
    pub fn decide(
        &self,
        hint: FormatHint,
        error: &EngineError,
        error_surfaced: bool,
    ) -> FallbackDecision {
        let code = error.code.normalized();
        if code == EngineErrorCode::BehindLiveWindow {
            return FallbackDecision::Reseek;
        }

        if error_surfaced || !Self::is_fallback_trigger(code) {
            return FallbackDecision::Surface;
        }

        match hint.next() {
            Some(next) => FallbackDecision::Advance(next),
            None => FallbackDecision::Exhausted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn malformed() -> EngineError {
        EngineError::new(EngineErrorCode::ParsingContainerMalformed, "malformed")
    }

    #[test]
    fn test_sequence_is_walked_in_order() {
        let policy = FormatFallbackPolicy::new();
        let mut hint = FormatHint::None;
        let mut visited = Vec::new();

        while let FallbackDecision::Advance(next) = policy.decide(hint, &malformed(), false) {
            visited.push(next);
            hint = next;
        }

        assert_eq!(
            visited,
            vec![
                FormatHint::Hls,
                FormatHint::Dash,
                FormatHint::SmoothStreaming,
                FormatHint::Rtsp
            ]
        );
        assert_eq!(
            policy.decide(hint, &malformed(), false),
            FallbackDecision::Exhausted
        );
    }

    #[test]
    fn test_trigger_codes() {
        for code in [3001, 3002, 3003, 3004, 2000] {
            assert!(FormatFallbackPolicy::is_fallback_trigger(
                EngineErrorCode::from_code(code)
            ));
        }
        for code in [1000, 1002, 2001, 2004, 4001] {
            assert!(!FormatFallbackPolicy::is_fallback_trigger(
                EngineErrorCode::from_code(code)
            ));
        }
    }

    #[test]
    fn test_raw_codes_are_classified_by_value() {
        let policy = FormatFallbackPolicy::new();
        let raw = |code| EngineError {
            code: EngineErrorCode::Other(code),
            message: "raw".to_string(),
        };

        assert_eq!(
            policy.decide(FormatHint::None, &raw(1002), false),
            FallbackDecision::Reseek
        );
        assert_eq!(
            policy.decide(FormatHint::None, &raw(3001), false),
            FallbackDecision::Advance(FormatHint::Hls)
        );
        assert_eq!(
            policy.decide(FormatHint::None, &raw(7777), false),
            FallbackDecision::Surface
        );
        assert!(FormatFallbackPolicy::is_fallback_trigger(
            EngineErrorCode::Other(2000)
        ));
    }

    #[test]
    fn test_surfaced_error_blocks_fallback() {
        let policy = FormatFallbackPolicy::new();
        assert_eq!(
            policy.decide(FormatHint::None, &malformed(), true),
            FallbackDecision::Surface
        );
    }

    #[test]
    fn test_behind_live_window_reseeks() {
        let policy = FormatFallbackPolicy::new();
        let error = EngineError::new(EngineErrorCode::BehindLiveWindow, "behind");
        assert_eq!(
            policy.decide(FormatHint::Dash, &error, false),
            FallbackDecision::Reseek
        );
    }

    #[test]
    fn test_other_errors_surface() {
        let policy = FormatFallbackPolicy::new();
        let error = EngineError::new(EngineErrorCode::IoBadHttpStatus, "404");
        assert_eq!(
            policy.decide(FormatHint::None, &error, false),
            FallbackDecision::Surface
        );
    }

    #[test]
    fn test_media_sources_per_hint() {
        let uri = "http://x/live.ts";

        let none = FormatHint::None.media_source(uri);
        assert_eq!(none.mime_type, None);
        assert_eq!(none.factory, SourceFactory::Default);

        let hls = FormatHint::Hls.media_source(uri);
        assert_eq!(hls.mime_type.as_deref(), Some("application/x-mpegURL"));
        assert_eq!(
            hls.factory,
            SourceFactory::Hls {
                allow_chunkless_preparation: false
            }
        );

        let dash = FormatHint::Dash.media_source(uri);
        assert_eq!(dash.mime_type.as_deref(), Some("application/dash+xml"));
        assert_eq!(dash.factory, SourceFactory::Default);

        let ss = FormatHint::SmoothStreaming.media_source(uri);
        assert_eq!(ss.mime_type.as_deref(), Some("application/vnd.ms-sstr+xml"));
        assert_eq!(ss.factory, SourceFactory::Progressive);

        let rtsp = FormatHint::Rtsp.media_source(uri);
        assert_eq!(rtsp.mime_type.as_deref(), Some("application/x-rtsp"));
        assert_eq!(rtsp.factory, SourceFactory::Rtsp);
        assert_eq!(rtsp.uri, uri);
    }
}
