// Error types for the vibration core
//
// This module defines custom error types for pattern compilation and haptic
// playback, providing structured error handling with error codes suitable for
// FFI communication and method-channel error replies.

mod haptic;
mod pattern;

pub use haptic::{log_haptic_error, HapticError, HapticErrorCodes};
pub use pattern::{log_pattern_error, PatternError, PatternErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the FFI boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Method-channel error code strings understood by the Dart side.
pub mod channel_codes {
    /// Required argument map missing
    pub const NO_ARGS: &str = "no_args";

    /// Engine submit/start/play failed
    pub const PLAY_FAILED: &str = "play_failed";

    /// Pattern or intensity list rejected by the compiler
    pub const INVALID_PATTERN: &str = "invalid_pattern";
}
