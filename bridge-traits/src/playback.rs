//! Playback value types exchanged between the core and a host media engine.
//!
//! These mirror the vocabulary of common media frameworks (player states,
//! numeric error codes, track groups) closely enough that an adapter for a
//! real engine is a field-by-field conversion.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// MIME types used as explicit container hints.
pub mod mime_types {
    /// HLS playlist.
    pub const APPLICATION_M3U8: &str = "application/x-mpegURL";
    /// DASH manifest.
    pub const APPLICATION_MPD: &str = "application/dash+xml";
    /// Microsoft Smooth Streaming manifest.
    pub const APPLICATION_SS: &str = "application/vnd.ms-sstr+xml";
    /// RTSP session.
    pub const APPLICATION_RTSP: &str = "application/x-rtsp";
}

// ============================================================================
// Video
// ============================================================================

/// Decoded video dimensions in pixels.
///
/// The default value is the empty size reported before the first frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoSize {
    pub width: u32,
    pub height: u32,
}

impl VideoSize {
    /// Size reported before any frame has been rendered.
    pub const EMPTY: VideoSize = VideoSize {
        width: 0,
        height: 0,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` when no frame dimensions are known yet.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width divided by height, or `None` for an empty size.
    pub fn aspect_ratio(&self) -> Option<f32> {
        if self.is_empty() {
            None
        } else {
            Some(self.width as f32 / self.height as f32)
        }
    }
}

impl fmt::Display for VideoSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// ============================================================================
// Engine state
// ============================================================================

/// Lifecycle state reported by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    /// No media loaded, or the engine was stopped.
    #[default]
    Idle,
    /// Waiting for enough data to start or continue rendering.
    Buffering,
    /// Able to render immediately.
    Ready,
    /// Reached the end of the media.
    Ended,
}

impl EngineState {
    /// Maps the numeric state constants used by most engines (1-4).
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Idle),
            2 => Some(Self::Buffering),
            3 => Some(Self::Ready),
            4 => Some(Self::Ended),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Idle => 1,
            Self::Buffering => 2,
            Self::Ready => 3,
            Self::Ended => 4,
        }
    }
}

// ============================================================================
// Engine errors
// ============================================================================

/// Engine error codes.
///
/// Numeric values follow the widely used media3 numbering so that host
/// adapters can convert with [`EngineErrorCode::from_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineErrorCode {
    Unspecified,
    RemoteError,
    BehindLiveWindow,
    Timeout,
    FailedRuntimeCheck,
    IoUnspecified,
    IoNetworkConnectionFailed,
    IoNetworkConnectionTimeout,
    IoInvalidHttpContentType,
    IoBadHttpStatus,
    IoFileNotFound,
    IoNoPermission,
    IoCleartextNotPermitted,
    IoReadPositionOutOfRange,
    ParsingContainerMalformed,
    ParsingManifestMalformed,
    ParsingContainerUnsupported,
    ParsingManifestUnsupported,
    DecoderInitFailed,
    DecoderQueryFailed,
    DecodingFailed,
    DecodingFormatExceedsCapabilities,
    DecodingFormatUnsupported,
    AudioTrackInitFailed,
    AudioTrackWriteFailed,
    DrmUnspecified,
    /// A code this crate has no name for.
    Other(i32),
}

impl EngineErrorCode {
    const TABLE: &'static [(i32, EngineErrorCode)] = &[
        (1000, Self::Unspecified),
        (1001, Self::RemoteError),
        (1002, Self::BehindLiveWindow),
        (1003, Self::Timeout),
        (1004, Self::FailedRuntimeCheck),
        (2000, Self::IoUnspecified),
        (2001, Self::IoNetworkConnectionFailed),
        (2002, Self::IoNetworkConnectionTimeout),
        (2003, Self::IoInvalidHttpContentType),
        (2004, Self::IoBadHttpStatus),
        (2005, Self::IoFileNotFound),
        (2006, Self::IoNoPermission),
        (2007, Self::IoCleartextNotPermitted),
        (2008, Self::IoReadPositionOutOfRange),
        (3001, Self::ParsingContainerMalformed),
        (3002, Self::ParsingManifestMalformed),
        (3003, Self::ParsingContainerUnsupported),
        (3004, Self::ParsingManifestUnsupported),
        (4001, Self::DecoderInitFailed),
        (4002, Self::DecoderQueryFailed),
        (4003, Self::DecodingFailed),
        (4004, Self::DecodingFormatExceedsCapabilities),
        (4005, Self::DecodingFormatUnsupported),
        (5001, Self::AudioTrackInitFailed),
        (5002, Self::AudioTrackWriteFailed),
        (6000, Self::DrmUnspecified),
    ];

    pub fn from_code(code: i32) -> Self {
        Self::TABLE
            .iter()
            .find(|(value, _)| *value == code)
            .map(|(_, known)| *known)
            .unwrap_or(Self::Other(code))
    }

    /// Maps `Other` values that have a name onto the named variant.
    pub fn normalized(self) -> Self {
        match self {
            Self::Other(code) => Self::from_code(code),
            known => known,
        }
    }

    pub fn code(self) -> i32 {
        if let Self::Other(code) = self {
            return code;
        }
        Self::TABLE
            .iter()
            .find(|(_, known)| *known == self)
            .map(|(value, _)| *value)
            .unwrap_or(1000)
    }

    /// Returns `true` for codes in the 2xxx (I/O) range.
    pub fn is_io(self) -> bool {
        (2000..3000).contains(&self.code())
    }

    /// Returns `true` for container and manifest parsing failures.
    pub fn is_parsing(self) -> bool {
        (3000..4000).contains(&self.code())
    }
}

impl fmt::Display for EngineErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(code) => write!(f, "ERROR_CODE_{}", code),
            known => write!(f, "{:?}({})", known, known.code()),
        }
    }
}

/// Error reported by the engine through its error callback.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message} [{code}]")]
pub struct EngineError {
    pub code: EngineErrorCode,
    pub message: String,
}

impl EngineError {
    pub fn new(code: EngineErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.normalized(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Tracks
// ============================================================================

/// Media type of a track group.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TrackType {
    Unknown,
    Default,
    Audio,
    Video,
    Text,
    Image,
    Metadata,
    CameraMotion,
}

/// Format descriptor of a single track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackFormat {
    pub id: Option<String>,
    pub label: Option<String>,
    pub language: Option<String>,
    pub sample_mime_type: Option<String>,
    pub codecs: Option<String>,
    /// Peak bitrate in bits per second.
    pub bitrate: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<f32>,
    pub channel_count: Option<u16>,
    pub sample_rate: Option<u32>,
}

/// Stable identifier of a track group within one source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackGroupId(pub String);

impl TrackGroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for TrackGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One rendition inside a track group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub format: TrackFormat,
    /// Whether the device can render this track.
    pub supported: bool,
    /// Whether the engine currently renders this track.
    pub selected: bool,
}

/// A set of alternative renditions of one media type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackGroup {
    pub id: TrackGroupId,
    pub track_type: TrackType,
    /// Whether at least one track of the group is selected.
    pub selected: bool,
    pub tracks: Vec<TrackInfo>,
}

impl TrackGroup {
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn is_track_selected(&self, index: usize) -> bool {
        self.tracks.get(index).is_some_and(|track| track.selected)
    }

    pub fn track_format(&self, index: usize) -> Option<&TrackFormat> {
        self.tracks.get(index).map(|track| &track.format)
    }
}

/// Forces the engine to render specific tracks of one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSelectionOverride {
    pub group_id: TrackGroupId,
    pub track_type: TrackType,
    pub track_indices: Vec<usize>,
}

impl TrackSelectionOverride {
    pub fn new(group: &TrackGroup, track_index: usize) -> Self {
        Self {
            group_id: group.id.clone(),
            track_type: group.track_type,
            track_indices: vec![track_index],
        }
    }
}

/// Track selection constraints applied by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSelectionParameters {
    /// At most one override per track type.
    pub overrides: BTreeMap<TrackType, TrackSelectionOverride>,
    pub force_highest_supported_bitrate: bool,
    pub tunneling_enabled: bool,
}

impl TrackSelectionParameters {
    /// Replaces the override for the override's track type, keeping the rest.
    pub fn with_override_for_type(mut self, selection: TrackSelectionOverride) -> Self {
        self.overrides.insert(selection.track_type, selection);
        self
    }

    pub fn override_for(&self, track_type: TrackType) -> Option<&TrackSelectionOverride> {
        self.overrides.get(&track_type)
    }
}
