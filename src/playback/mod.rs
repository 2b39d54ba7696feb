//! Playback: engine submission, fallback vibration, cancellation.

pub mod fallback;
pub mod scheduler;

pub use fallback::{FallbackDeadline, FallbackTimer};
pub use scheduler::{PlaybackOutcome, PlaybackScheduler};
