// Haptic engine and playback error types

use crate::error::{channel_codes, ErrorCode, PatternError};
use flutter_rust_bridge::frb;
use log::error;
use std::fmt;

/// Haptic error code constants exposed to Dart via FFI
///
/// Error code range: 4001-4007
#[frb(unignore)]
pub struct HapticErrorCodes {}

#[frb]
impl HapticErrorCodes {
    /// No engine handle is available
    pub const ENGINE_UNAVAILABLE: i32 = 4001;

    /// Backend could not construct an engine
    pub const ENGINE_CREATE_FAILED: i32 = 4002;

    /// Engine refused to start
    pub const ENGINE_START_FAILED: i32 = 4003;

    /// Engine rejected the timeline
    pub const PLAYER_CREATE_FAILED: i32 = 4004;

    /// Player failed to start playback
    pub const PLAYER_START_FAILED: i32 = 4005;

    /// Mutex was poisoned
    pub const LOCK_POISONED: i32 = 4006;

    /// Pattern rejected by the compiler
    pub const INVALID_PATTERN: i32 = 4007;

    /// Get ENGINE_UNAVAILABLE error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn engine_unavailable() -> i32 {
        Self::ENGINE_UNAVAILABLE
    }

    /// Get ENGINE_CREATE_FAILED error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn engine_create_failed() -> i32 {
        Self::ENGINE_CREATE_FAILED
    }

    /// Get ENGINE_START_FAILED error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn engine_start_failed() -> i32 {
        Self::ENGINE_START_FAILED
    }

    /// Get PLAYER_CREATE_FAILED error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn player_create_failed() -> i32 {
        Self::PLAYER_CREATE_FAILED
    }

    /// Get PLAYER_START_FAILED error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn player_start_failed() -> i32 {
        Self::PLAYER_START_FAILED
    }

    /// Get LOCK_POISONED error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn lock_poisoned() -> i32 {
        Self::LOCK_POISONED
    }

    /// Get INVALID_PATTERN error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn invalid_pattern() -> i32 {
        Self::INVALID_PATTERN
    }
}

/// Log a haptic error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_haptic_error(err: &HapticError, context: &str) {
    error!(
        "Haptic error in {}: code={}, component=HapticEngine, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Haptic-related errors
///
/// These errors cover engine construction, engine start, timeline submission,
/// and playback. Backends report failures through these variants with the
/// platform's own description in `reason`.
#[derive(Debug, Clone, PartialEq)]
pub enum HapticError {
    /// Engine handle is unset
    EngineUnavailable,

    /// Backend could not construct an engine
    EngineCreateFailed { reason: String },

    /// Engine start failed
    EngineStartFailed { reason: String },

    /// Engine could not build a player for the timeline
    PlayerCreateFailed { reason: String },

    /// Player could not start playback
    PlayerStartFailed { reason: String },

    /// Mutex was poisoned
    LockPoisoned { component: String },

    /// Pattern rejected before any engine call
    InvalidPattern(PatternError),
}

impl HapticError {
    /// Method-channel error code for this error
    pub fn channel_code(&self) -> &'static str {
        match self {
            HapticError::InvalidPattern(_) => channel_codes::INVALID_PATTERN,
            _ => channel_codes::PLAY_FAILED,
        }
    }
}

impl ErrorCode for HapticError {
    fn code(&self) -> i32 {
        match self {
            HapticError::EngineUnavailable => HapticErrorCodes::ENGINE_UNAVAILABLE,
            HapticError::EngineCreateFailed { .. } => HapticErrorCodes::ENGINE_CREATE_FAILED,
            HapticError::EngineStartFailed { .. } => HapticErrorCodes::ENGINE_START_FAILED,
            HapticError::PlayerCreateFailed { .. } => HapticErrorCodes::PLAYER_CREATE_FAILED,
            HapticError::PlayerStartFailed { .. } => HapticErrorCodes::PLAYER_START_FAILED,
            HapticError::LockPoisoned { .. } => HapticErrorCodes::LOCK_POISONED,
            HapticError::InvalidPattern(_) => HapticErrorCodes::INVALID_PATTERN,
        }
    }

    fn message(&self) -> String {
        match self {
            HapticError::EngineUnavailable => "Haptic engine is not available".to_string(),
            HapticError::EngineCreateFailed { reason } => {
                format!("Engine creation error: {}", reason)
            }
            HapticError::EngineStartFailed { reason } => {
                format!("Failed to start the engine: {}", reason)
            }
            HapticError::PlayerCreateFailed { reason } => {
                format!("Failed to create pattern player: {}", reason)
            }
            HapticError::PlayerStartFailed { reason } => {
                format!("Failed to play pattern: {}", reason)
            }
            HapticError::LockPoisoned { component } => {
                format!("Lock poisoned for component: {}", component)
            }
            HapticError::InvalidPattern(err) => err.message(),
        }
    }
}

impl fmt::Display for HapticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HapticError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for HapticError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HapticError::InvalidPattern(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PatternError> for HapticError {
    fn from(err: PatternError) -> Self {
        HapticError::InvalidPattern(err)
    }
}
