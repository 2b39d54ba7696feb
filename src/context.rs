// VibrationContext: Dependency Injection Container
// Wires platform services, the engine lifecycle and the scheduler together

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::capability::CapabilityProbe;
use crate::config::AppConfig;
use crate::engine::backend::Platform;
use crate::engine::lifecycle::{EngineLifecycleManager, LifecycleEvent};
use crate::error::HapticError;
use crate::playback::{PlaybackOutcome, PlaybackScheduler};

/// VibrationContext: container for all plugin state
///
/// Built once at plugin registration. Creating the context also attempts to
/// create the haptic engine; a failure there only means playback falls back
/// to simple vibration.
pub struct VibrationContext {
    config: AppConfig,
    probe: Arc<CapabilityProbe>,
    lifecycle: Arc<EngineLifecycleManager>,
    scheduler: PlaybackScheduler,
}

impl VibrationContext {
    /// Create a context over `platform` and try to create the engine
    pub fn new(platform: Platform, config: AppConfig) -> Self {
        let probe = Arc::new(CapabilityProbe::new(
            Arc::clone(&platform.backend),
            Arc::clone(&platform.device),
            &config.device,
        ));
        let lifecycle = Arc::new(EngineLifecycleManager::new(
            Arc::clone(&platform.backend),
            config.engine.clone(),
        ));

        // already logged; the scheduler treats a missing engine as a fallback branch
        let _ = lifecycle.create_engine();

        let scheduler = PlaybackScheduler::new(
            Arc::clone(&lifecycle),
            Arc::clone(&probe),
            platform.vibrator,
            platform.time_source,
            config.playback.clone(),
        );

        Self {
            config,
            probe,
            lifecycle,
            scheduler,
        }
    }

    /// Process engine notifications on a background thread
    pub fn start_notification_worker(&self) {
        self.lifecycle.spawn_notification_worker();
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &EngineLifecycleManager {
        &self.lifecycle
    }

    pub fn scheduler(&self) -> &PlaybackScheduler {
        &self.scheduler
    }

    pub fn subscribe_lifecycle(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.lifecycle.subscribe()
    }

    // ========================================================================
    // CAPABILITY QUERIES
    // ========================================================================

    pub fn has_vibrator(&self) -> bool {
        self.probe.has_vibrator()
    }

    pub fn has_amplitude_control(&self) -> bool {
        self.probe.has_amplitude_control()
    }

    pub fn has_custom_vibrations_support(&self) -> bool {
        self.probe.has_custom_haptics_support()
    }

    // ========================================================================
    // PLAYBACK
    // ========================================================================

    /// Vibrate for a duration, filling omitted arguments from config
    pub fn vibrate_duration(
        &self,
        duration_ms: Option<i64>,
        intensity: Option<i64>,
    ) -> Result<PlaybackOutcome, HapticError> {
        let playback = &self.config.playback;
        let duration_ms = duration_ms.unwrap_or(playback.default_duration_ms as i64);
        let intensity = intensity.unwrap_or(playback.default_intensity as i64);
        self.scheduler.play_duration(duration_ms, intensity)
    }

    /// Play a wait/duration pattern with optional intensities
    pub fn vibrate(
        &self,
        pattern: &[i64],
        intensities: &[i64],
    ) -> Result<PlaybackOutcome, HapticError> {
        self.scheduler.play_pattern(pattern, intensities)
    }

    pub fn cancel(&self) -> Result<(), HapticError> {
        self.scheduler.cancel()
    }
}
