//! # Playback Error Types
//!
//! Two kinds of errors live here:
//!
//! - [`PlaybackError`] is returned from fallible setup calls such as
//!   [`PlayerManager::new`](crate::PlayerManager::new).
//! - [`PlayerError`] is *published*, never returned: it is the value of the
//!   `playback_error` observable once an engine failure could not be
//!   recovered.

use bridge_traits::{BridgeError, EngineError, EngineErrorCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned while constructing or configuring the player.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// No Tokio runtime is reachable from the calling thread.
    #[error("No async runtime available: {0}")]
    NoRuntime(String),

    /// Player configuration failed validation.
    #[error("Invalid player configuration: {0}")]
    InvalidConfig(String),

    #[error("Runtime configuration error: {0}")]
    Runtime(#[from] core_runtime::Error),
}

/// Result type for playback setup operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

// ============================================================================
// Published errors
// ============================================================================

/// Why a [`PlayerError`] was surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerErrorKind {
    /// The engine reported an error no recovery applies to.
    Engine,
    /// Every container format was tried and the last one failed too.
    FallbackExhausted,
    /// The engine factory could not build an engine.
    EngineUnavailable,
}

impl PlayerErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerErrorKind::Engine => "Engine",
            PlayerErrorKind::FallbackExhausted => "FallbackExhausted",
            PlayerErrorKind::EngineUnavailable => "EngineUnavailable",
        }
    }
}

/// Terminal playback error as seen by observers.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{} error: {message}", kind.as_str())]
pub struct PlayerError {
    pub kind: PlayerErrorKind,
    /// Engine error code, absent when no engine was involved.
    pub code: Option<EngineErrorCode>,
    pub message: String,
}

impl PlayerError {
    pub fn engine(error: &EngineError) -> Self {
        Self {
            kind: PlayerErrorKind::Engine,
            code: Some(error.code),
            message: error.message.clone(),
        }
    }

    pub fn fallback_exhausted(error: &EngineError) -> Self {
        Self {
            kind: PlayerErrorKind::FallbackExhausted,
            code: Some(error.code),
            message: error.message.clone(),
        }
    }

    pub fn engine_unavailable(error: &BridgeError) -> Self {
        Self {
            kind: PlayerErrorKind::EngineUnavailable,
            code: None,
            message: error.to_string(),
        }
    }

    /// Numeric engine code, if any.
    pub fn error_code(&self) -> Option<i32> {
        self.code.map(EngineErrorCode::code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_error_constructors() {
        let engine_error = EngineError::new(EngineErrorCode::ParsingContainerMalformed, "bad ts");

        let exhausted = PlayerError::fallback_exhausted(&engine_error);
        assert_eq!(exhausted.kind, PlayerErrorKind::FallbackExhausted);
        assert_eq!(exhausted.error_code(), Some(3001));
        assert_eq!(exhausted.to_string(), "FallbackExhausted error: bad ts");

        let unavailable =
            PlayerError::engine_unavailable(&BridgeError::EngineCreation("no decoder".into()));
        assert_eq!(unavailable.kind, PlayerErrorKind::EngineUnavailable);
        assert_eq!(unavailable.code, None);
        assert!(unavailable.message.contains("no decoder"));
    }

    #[test]
    fn test_setup_error_conversion() {
        let err: PlaybackError = core_runtime::Error::Config("bad".into()).into();
        assert!(matches!(err, PlaybackError::Runtime(_)));
        assert!(err.to_string().contains("bad"));
    }
}
