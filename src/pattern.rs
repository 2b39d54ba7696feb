//! Pattern compiler - flat wait/duration arrays to haptic timelines
//!
//! A pattern is a flat list of `(wait_ms, duration_ms)` pairs. Compiling walks
//! the pairs with a cumulative cursor so every segment carries its start time
//! relative to the beginning of playback:
//!
//! ```text
//! pattern  [0, 200, 100, 300]
//!           ^wait ^dur ^wait ^dur
//! cursor   0.0 -> 0.0 (start) -> 0.2 -> 0.3 (start) -> 0.6
//! segments [{start 0.0, dur 0.2}, {start 0.3, dur 0.3}]
//! ```
//!
//! Everything here is pure and deterministic.

use serde::{Deserialize, Serialize};

use crate::error::PatternError;

/// Largest intensity value accepted from callers
pub const MAX_INTENSITY: i64 = 255;

/// Intensity of a single segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SegmentIntensity {
    /// Let the engine pick its default intensity
    Default,
    /// Normalized intensity in 0.0..=1.0
    Level(f32),
}

impl SegmentIntensity {
    /// Normalize a raw 0..=255 intensity
    pub fn from_raw(raw: u8) -> Self {
        SegmentIntensity::Level((raw as f64 / MAX_INTENSITY as f64) as f32)
    }
}

/// One continuous haptic event, times in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HapticSegment {
    pub relative_start: f64,
    pub duration: f64,
    pub intensity: SegmentIntensity,
}

/// Ordered set of segments submitted to the engine as one playable unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HapticTimeline {
    segments: Vec<HapticSegment>,
}

impl HapticTimeline {
    pub fn new(segments: Vec<HapticSegment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[HapticSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// End of the last segment in seconds (0.0 for an empty timeline)
    pub fn total_duration(&self) -> f64 {
        self.segments
            .last()
            .map(|s| s.relative_start + s.duration)
            .unwrap_or(0.0)
    }
}

/// Compile a pattern and optional intensity list into a timeline.
///
/// # Errors
/// - odd-length pattern
/// - non-empty intensity list whose length is not `pattern.len() / 2`
/// - negative pattern entry
/// - intensity outside 0..=255 (never clamped on this path)
pub fn compile(pattern: &[i64], intensities: &[i64]) -> Result<HapticTimeline, PatternError> {
    validate(pattern, intensities)?;

    let mut segments = Vec::with_capacity(pattern.len() / 2);
    let mut cursor = 0.0_f64;

    for (j, pair) in pattern.chunks_exact(2).enumerate() {
        let wait = pair[0] as f64 / 1000.0;
        let duration = pair[1] as f64 / 1000.0;

        cursor += wait;

        let intensity = match intensities.get(j) {
            // validated to 0..=255 above
            Some(&raw) => SegmentIntensity::from_raw(raw as u8),
            None => SegmentIntensity::Default,
        };

        segments.push(HapticSegment {
            relative_start: cursor,
            duration,
            intensity,
        });

        cursor += duration;
    }

    Ok(HapticTimeline::new(segments))
}

/// Build the one-segment timeline used by `vibrate_duration`.
///
/// Unlike [`compile`], this path normalizes its inputs: the duration is
/// floored to 1 ms and the intensity clamped to 1..=255.
pub fn single_segment(duration_ms: i64, intensity: i64) -> HapticTimeline {
    let duration_ms = clamp_duration_ms(duration_ms);
    let intensity = clamp_intensity(intensity);

    HapticTimeline::new(vec![HapticSegment {
        relative_start: 0.0,
        duration: duration_ms as f64 / 1000.0,
        intensity: SegmentIntensity::from_raw(intensity),
    }])
}

/// Floor a requested duration to at least 1 ms
pub fn clamp_duration_ms(duration_ms: i64) -> u64 {
    duration_ms.max(1) as u64
}

/// Clamp a requested intensity into 1..=255
pub fn clamp_intensity(intensity: i64) -> u8 {
    intensity.clamp(1, MAX_INTENSITY) as u8
}

fn validate(pattern: &[i64], intensities: &[i64]) -> Result<(), PatternError> {
    if pattern.len() % 2 != 0 {
        return Err(PatternError::OddLength { len: pattern.len() });
    }

    let expected = pattern.len() / 2;
    if !intensities.is_empty() && intensities.len() != expected {
        return Err(PatternError::IntensityCountMismatch {
            expected,
            got: intensities.len(),
        });
    }

    if let Some((index, &value)) = pattern.iter().enumerate().find(|(_, v)| **v < 0) {
        return Err(PatternError::NegativeTiming { index, value });
    }

    if let Some((index, &value)) = intensities
        .iter()
        .enumerate()
        .find(|(_, v)| !(0..=MAX_INTENSITY).contains(*v))
    {
        return Err(PatternError::IntensityOutOfRange { index, value });
    }

    Ok(())
}
