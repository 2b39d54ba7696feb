// Pattern error types and constants

use crate::error::ErrorCode;
use flutter_rust_bridge::frb;
use log::error;
use std::fmt;

/// Pattern error code constants exposed to Dart via FFI
///
/// Error code range: 3001-3004
#[frb(unignore)]
pub struct PatternErrorCodes {}

#[frb]
impl PatternErrorCodes {
    /// Pattern has an odd number of entries
    pub const ODD_LENGTH: i32 = 3001;

    /// Intensity list length does not match the number of segments
    pub const INTENSITY_COUNT_MISMATCH: i32 = 3002;

    /// Pattern contains a negative wait or duration
    pub const NEGATIVE_TIMING: i32 = 3003;

    /// Intensity value outside 0..=255
    pub const INTENSITY_OUT_OF_RANGE: i32 = 3004;

    /// Get ODD_LENGTH error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn odd_length() -> i32 {
        Self::ODD_LENGTH
    }

    /// Get INTENSITY_COUNT_MISMATCH error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn intensity_count_mismatch() -> i32 {
        Self::INTENSITY_COUNT_MISMATCH
    }

    /// Get NEGATIVE_TIMING error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn negative_timing() -> i32 {
        Self::NEGATIVE_TIMING
    }

    /// Get INTENSITY_OUT_OF_RANGE error code
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn intensity_out_of_range() -> i32 {
        Self::INTENSITY_OUT_OF_RANGE
    }
}

/// Log a pattern error with structured context
pub fn log_pattern_error(err: &PatternError, context: &str) {
    error!(
        "Pattern error in {}: code={}, component=PatternCompiler, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while compiling a pattern into a haptic timeline
///
/// These are caller-input errors. They are reported back over the channel
/// and never affect engine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Pattern must contain (wait, duration) pairs
    OddLength { len: usize },

    /// One intensity per duration segment is required when any are given
    IntensityCountMismatch { expected: usize, got: usize },

    /// Waits and durations must be non-negative
    NegativeTiming { index: usize, value: i64 },

    /// Intensities must lie in 0..=255
    IntensityOutOfRange { index: usize, value: i64 },
}

impl ErrorCode for PatternError {
    fn code(&self) -> i32 {
        match self {
            PatternError::OddLength { .. } => PatternErrorCodes::ODD_LENGTH,
            PatternError::IntensityCountMismatch { .. } => {
                PatternErrorCodes::INTENSITY_COUNT_MISMATCH
            }
            PatternError::NegativeTiming { .. } => PatternErrorCodes::NEGATIVE_TIMING,
            PatternError::IntensityOutOfRange { .. } => PatternErrorCodes::INTENSITY_OUT_OF_RANGE,
        }
    }

    fn message(&self) -> String {
        match self {
            PatternError::OddLength { len } => {
                format!("Pattern must have an even number of elements (got {})", len)
            }
            PatternError::IntensityCountMismatch { expected, got } => {
                format!(
                    "Expected {} intensities (one per segment), got {}",
                    expected, got
                )
            }
            PatternError::NegativeTiming { index, value } => {
                format!("Pattern entry {} is negative ({})", index, value)
            }
            PatternError::IntensityOutOfRange { index, value } => {
                format!("Intensity {} out of range 0-255 ({})", index, value)
            }
        }
    }
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PatternError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for PatternError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            PatternError::OddLength { len: 3 },
            PatternError::IntensityCountMismatch {
                expected: 1,
                got: 2,
            },
            PatternError::NegativeTiming {
                index: 0,
                value: -5,
            },
            PatternError::IntensityOutOfRange {
                index: 0,
                value: 300,
            },
        ];
        let mut codes: Vec<i32> = errors.iter().map(|e| e.code()).collect();
        codes.dedup();
        assert_eq!(codes, vec![3001, 3002, 3003, 3004]);
    }

    #[test]
    fn test_display_includes_code_and_message() {
        let err = PatternError::IntensityCountMismatch {
            expected: 1,
            got: 2,
        };
        let text = err.to_string();
        assert!(text.contains("3002"));
        assert!(text.contains("Expected 1 intensities"));
    }
}
