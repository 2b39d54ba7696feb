// PlaybackScheduler: single-slot playback on the engine or the fallback loop
//
// Single Responsibility: turn play/cancel requests into engine submissions
// or fallback pulses, keeping at most one playback alive.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::capability::CapabilityProbe;
use crate::config::PlaybackConfig;
use crate::engine::backend::{PatternPlayer, SystemVibrator, TimeSource};
use crate::engine::lifecycle::EngineLifecycleManager;
use crate::error::{log_haptic_error, log_pattern_error, HapticError};
use crate::pattern::{self, HapticTimeline};
use crate::playback::fallback::FallbackTimer;

/// Which path a play request took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackOutcome {
    /// Timeline submitted to the haptic engine
    Engine,
    /// Repeating fallback loop started
    Fallback,
    /// One system vibration pulse fired
    DefaultPulse,
}

enum ActivePlayback {
    Engine {
        player: Box<dyn PatternPlayer>,
        // None when the timeline is too long to place on the clock
        ends_at: Option<Instant>,
    },
    Fallback(FallbackTimer),
}

impl ActivePlayback {
    fn is_running(&self, now: Instant) -> bool {
        match self {
            ActivePlayback::Engine { ends_at, .. } => ends_at.map_or(true, |end| now < end),
            ActivePlayback::Fallback(timer) => !timer.is_finished(),
        }
    }

    fn release(self) {
        match self {
            ActivePlayback::Engine { mut player, .. } => player.cancel(),
            ActivePlayback::Fallback(timer) => timer.cancel(),
        }
    }
}

/// Schedules haptic playback
///
/// This scheduler handles:
/// - Single-duration vibration on the engine, or the fallback loop without one
/// - Pattern playback as one engine timeline, or a default pulse
/// - Cancellation of whatever is active
///
/// Lock order: the active slot is always taken before the engine lock.
pub struct PlaybackScheduler {
    lifecycle: Arc<EngineLifecycleManager>,
    probe: Arc<CapabilityProbe>,
    vibrator: Arc<dyn SystemVibrator>,
    time_source: Arc<dyn TimeSource>,
    config: PlaybackConfig,
    active: Mutex<Option<ActivePlayback>>,
}

impl PlaybackScheduler {
    pub fn new(
        lifecycle: Arc<EngineLifecycleManager>,
        probe: Arc<CapabilityProbe>,
        vibrator: Arc<dyn SystemVibrator>,
        time_source: Arc<dyn TimeSource>,
        config: PlaybackConfig,
    ) -> Self {
        Self {
            lifecycle,
            probe,
            vibrator,
            time_source,
            config,
            active: Mutex::new(None),
        }
    }

    /// Vibrate continuously for `duration_ms` at `intensity`
    ///
    /// The duration is floored to 1 ms and the intensity clamped to 1..=255.
    /// Without an engine handle this starts the fallback loop instead.
    ///
    /// # Errors
    /// - `HapticError::PlayerCreateFailed` / `EngineStartFailed` /
    ///   `PlayerStartFailed` from the engine path
    /// - `HapticError::LockPoisoned`
    pub fn play_duration(
        &self,
        duration_ms: i64,
        intensity: i64,
    ) -> Result<PlaybackOutcome, HapticError> {
        let mut active = self.lock_active()?;
        Self::release_previous(&mut active);

        let timeline = pattern::single_segment(duration_ms, intensity);

        match self.submit(&timeline, "play_duration")? {
            Some(playback) => {
                *active = Some(playback);
                Ok(PlaybackOutcome::Engine)
            }
            None => {
                let duration = Duration::from_millis(pattern::clamp_duration_ms(duration_ms));
                info!(
                    "[Playback] No haptic engine, fallback vibration for {:?}",
                    duration
                );
                let timer = FallbackTimer::start(
                    duration,
                    Duration::from_millis(self.config.fallback_tick_ms),
                    Arc::clone(&self.vibrator),
                    Arc::clone(&self.time_source),
                );
                *active = Some(ActivePlayback::Fallback(timer));
                Ok(PlaybackOutcome::Fallback)
            }
        }
    }

    /// Play a wait/duration pattern
    ///
    /// An empty pattern gets one default pulse. Any other pattern is validated
    /// first; a rejected pattern leaves the current playback untouched, fires
    /// no pulse and makes no engine call. A valid pattern on a device without
    /// custom haptics gets one default pulse, otherwise it is submitted as
    /// one timeline.
    ///
    /// # Errors
    /// - `HapticError::InvalidPattern` for malformed input
    /// - engine errors as for [`play_duration`](Self::play_duration)
    pub fn play_pattern(
        &self,
        pattern: &[i64],
        intensities: &[i64],
    ) -> Result<PlaybackOutcome, HapticError> {
        let mut active = self.lock_active()?;

        if pattern.is_empty() {
            debug!("[Playback] Empty pattern, default pulse");
            Self::release_previous(&mut active);
            self.vibrator.play_default_pulse();
            return Ok(PlaybackOutcome::DefaultPulse);
        }

        let timeline = pattern::compile(pattern, intensities).map_err(|err| {
            log_pattern_error(&err, "play_pattern");
            HapticError::from(err)
        })?;

        Self::release_previous(&mut active);

        if !self.probe.has_custom_haptics_support() {
            debug!("[Playback] No custom haptics support, default pulse");
            self.vibrator.play_default_pulse();
            return Ok(PlaybackOutcome::DefaultPulse);
        }

        match self.submit(&timeline, "play_pattern")? {
            Some(playback) => {
                *active = Some(playback);
                Ok(PlaybackOutcome::Engine)
            }
            None => {
                info!("[Playback] No haptic engine, default pulse instead of pattern");
                self.vibrator.play_default_pulse();
                Ok(PlaybackOutcome::DefaultPulse)
            }
        }
    }

    /// Stop and release the active playback, if any
    ///
    /// Safe to call with nothing active.
    pub fn cancel(&self) -> Result<(), HapticError> {
        let mut active = self.lock_active()?;
        match active.take() {
            Some(playback) => {
                info!("[Playback] Cancelling active playback");
                playback.release();
            }
            None => debug!("[Playback] Cancel with nothing active"),
        }
        Ok(())
    }

    /// Whether a playback is still running
    pub fn is_active(&self) -> bool {
        let now = self.time_source.now();
        self.lock_active()
            .map(|active| active.as_ref().is_some_and(|p| p.is_running(now)))
            .unwrap_or(false)
    }

    fn submit(
        &self,
        timeline: &HapticTimeline,
        context: &str,
    ) -> Result<Option<ActivePlayback>, HapticError> {
        let started_at = self.time_source.now();
        let player = self.lifecycle.submit(timeline).map_err(|err| {
            log_haptic_error(&err, context);
            err
        })?;

        Ok(player.map(|player| {
            debug!(
                "[Playback] Submitted {} segment(s), {:.3}s",
                timeline.len(),
                timeline.total_duration()
            );
            let ends_at = Duration::try_from_secs_f64(timeline.total_duration())
                .ok()
                .and_then(|length| started_at.checked_add(length));
            if ends_at.is_none() {
                debug!("[Playback] Timeline length out of range, no end time tracked");
            }
            ActivePlayback::Engine { player, ends_at }
        }))
    }

    fn release_previous(active: &mut Option<ActivePlayback>) {
        if let Some(previous) = active.take() {
            debug!("[Playback] Releasing previous playback");
            previous.release();
        }
    }

    fn lock_active(&self) -> Result<MutexGuard<'_, Option<ActivePlayback>>, HapticError> {
        self.active.lock().map_err(|_| {
            let err = HapticError::LockPoisoned {
                component: "active_playback".to_string(),
            };
            log_haptic_error(&err, "lock_active");
            err
        })
    }
}
