//! # Player Configuration
//!
//! Static engine settings. Values that the user can change at runtime
//! (connect timeout, tunneling, reconnect mode) come from the
//! [`PreferenceSource`](bridge_traits::PreferenceSource) instead and are
//! merged in by [`PlayerConfig::engine_options`].

use bridge_traits::{
    AudioAttributes, AudioContentType, AudioUsage, CookiePolicy, EngineOptions,
    HttpDataSourceOptions, LoadControl, PlaybackPreferences, TrackSelectionParameters,
};
use serde::{Deserialize, Serialize};

/// Player configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Stop buffering on time thresholds before the byte target is reached.
    ///
    /// Default: true.
    #[serde(default = "default_true")]
    pub prioritize_time_over_size_thresholds: bool,

    /// Byte target for the buffer, `None` to let the engine decide.
    ///
    /// Default: unset.
    #[serde(default)]
    pub target_buffer_bytes: Option<usize>,

    /// Fall back to lower-priority decoders when one fails to initialise.
    ///
    /// Default: true.
    #[serde(default = "default_true")]
    pub enable_decoder_fallback: bool,

    /// Always pick the highest bitrate the device supports.
    ///
    /// Default: true.
    #[serde(default = "default_true")]
    pub force_highest_supported_bitrate: bool,

    /// Request and react to audio focus.
    ///
    /// Default: true.
    #[serde(default = "default_true")]
    pub handle_audio_focus: bool,

    /// Pause when the audio output disappears (headphones unplugged).
    ///
    /// Default: true.
    #[serde(default = "default_true")]
    pub handle_audio_becoming_noisy: bool,

    /// Cookie handling of the HTTP data source.
    ///
    /// Default: accept cookies from the original server only.
    #[serde(default = "default_cookie_policy")]
    pub cookie_policy: CookiePolicy,

    /// Skip TLS certificate and hostname checks.
    ///
    /// Some IPTV providers serve self-signed certificates. Leave off unless
    /// the host explicitly opts in.
    ///
    /// Default: false.
    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// Attach the engine's diagnostic event logger.
    ///
    /// Default: true in debug builds.
    #[serde(default = "default_attach_event_logger")]
    pub attach_event_logger: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            prioritize_time_over_size_thresholds: true,
            target_buffer_bytes: None,
            enable_decoder_fallback: true,
            force_highest_supported_bitrate: true,
            handle_audio_focus: true,
            handle_audio_becoming_noisy: true,
            cookie_policy: default_cookie_policy(),
            accept_invalid_certs: false,
            attach_event_logger: default_attach_event_logger(),
        }
    }
}

impl PlayerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.target_buffer_bytes == Some(0) {
            return Err("target_buffer_bytes must be > 0 when set".to_string());
        }

        if !self.prioritize_time_over_size_thresholds && self.target_buffer_bytes.is_none() {
            return Err(
                "target_buffer_bytes is required when time thresholds are not prioritized"
                    .to_string(),
            );
        }

        Ok(())
    }

    /// Engine options for a new engine under the given preferences.
    pub fn engine_options(&self, preferences: &PlaybackPreferences) -> EngineOptions {
        EngineOptions {
            load_control: LoadControl {
                prioritize_time_over_size_thresholds: self.prioritize_time_over_size_thresholds,
                target_buffer_bytes: self.target_buffer_bytes,
            },
            audio_attributes: AudioAttributes {
                usage: AudioUsage::Media,
                content_type: AudioContentType::Movie,
                handle_audio_focus: self.handle_audio_focus,
            },
            http: HttpDataSourceOptions {
                connect_timeout: preferences.connect_timeout,
                cookie_policy: self.cookie_policy,
                accept_invalid_certs: self.accept_invalid_certs,
            },
            track_selection: TrackSelectionParameters {
                force_highest_supported_bitrate: self.force_highest_supported_bitrate,
                tunneling_enabled: preferences.tunneling,
                ..Default::default()
            },
            enable_decoder_fallback: self.enable_decoder_fallback,
            handle_audio_becoming_noisy: self.handle_audio_becoming_noisy,
            play_when_ready: true,
            attach_event_logger: self.attach_event_logger,
        }
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_true() -> bool {
    true
}

fn default_cookie_policy() -> CookiePolicy {
    CookiePolicy::AcceptOriginalServer
}

fn default_attach_event_logger() -> bool {
    cfg!(debug_assertions)
}
