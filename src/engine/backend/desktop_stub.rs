use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::engine::notification::EngineNotifier;
use crate::error::HapticError;
use crate::pattern::HapticTimeline;

use super::{DeviceInfo, HapticBackend, HapticEngine, PatternPlayer, SystemVibrator, TimeSource};

/// Everything the stub engine has been asked to do.
#[derive(Debug, Clone, Default)]
pub struct StubRecord {
    pub engines_created: usize,
    pub engine_starts: usize,
    pub timelines: Vec<HapticTimeline>,
    pub player_starts: Vec<f64>,
    pub player_cancels: usize,
}

#[derive(Default)]
struct StubShared {
    record: Mutex<StubRecord>,
    notifier: Mutex<Option<EngineNotifier>>,
    fail_create: AtomicBool,
    fail_start: AtomicBool,
    fail_make_player: AtomicBool,
    fail_player_start: AtomicBool,
    no_custom_haptics: AtomicBool,
    capability_error: AtomicBool,
}

impl StubShared {
    fn record(&self) -> MutexGuard<'_, StubRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Desktop stub backend used for deterministic testing and CLI tooling.
///
/// Simulates the engine lifecycle without touching hardware. Clones share
/// state, so a test can keep one clone to inject failures and inspect the
/// [`StubRecord`] while the context owns another.
#[derive(Clone, Default)]
pub struct DesktopStubBackend {
    shared: Arc<StubShared>,
}

impl DesktopStubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) -> StubRecord {
        self.shared.record().clone()
    }

    /// Notifier installed by the most recent `create_engine`
    pub fn notifier(&self) -> Option<EngineNotifier> {
        self.shared
            .notifier
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.shared.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_start(&self, fail: bool) {
        self.shared.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_make_player(&self, fail: bool) {
        self.shared.fail_make_player.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_player_start(&self, fail: bool) {
        self.shared.fail_player_start.store(fail, Ordering::SeqCst);
    }

    pub fn set_supports_custom_haptics(&self, supported: bool) {
        self.shared
            .no_custom_haptics
            .store(!supported, Ordering::SeqCst);
    }

    /// Make the capability query itself fail
    pub fn set_capability_error(&self, fail: bool) {
        self.shared.capability_error.store(fail, Ordering::SeqCst);
    }
}

impl HapticBackend for DesktopStubBackend {
    fn create_engine(&self, notifier: EngineNotifier) -> Result<Box<dyn HapticEngine>, HapticError> {
        if self.shared.fail_create.load(Ordering::SeqCst) {
            return Err(HapticError::EngineCreateFailed {
                reason: "stub configured to fail".to_string(),
            });
        }

        self.shared.record().engines_created += 1;
        *self.shared.notifier.lock().unwrap_or_else(PoisonError::into_inner) = Some(notifier);

        Ok(Box::new(StubEngine {
            shared: Arc::clone(&self.shared),
        }))
    }

    fn supports_custom_haptics(&self) -> Result<bool, HapticError> {
        if self.shared.capability_error.load(Ordering::SeqCst) {
            return Err(HapticError::EngineUnavailable);
        }
        Ok(!self.shared.no_custom_haptics.load(Ordering::SeqCst))
    }
}

struct StubEngine {
    shared: Arc<StubShared>,
}

impl HapticEngine for StubEngine {
    fn start(&mut self) -> Result<(), HapticError> {
        if self.shared.fail_start.load(Ordering::SeqCst) {
            return Err(HapticError::EngineStartFailed {
                reason: "stub configured to fail".to_string(),
            });
        }
        self.shared.record().engine_starts += 1;
        Ok(())
    }

    fn make_player(
        &mut self,
        timeline: &HapticTimeline,
    ) -> Result<Box<dyn PatternPlayer>, HapticError> {
        if self.shared.fail_make_player.load(Ordering::SeqCst) {
            return Err(HapticError::PlayerCreateFailed {
                reason: "stub configured to fail".to_string(),
            });
        }
        self.shared.record().timelines.push(timeline.clone());
        Ok(Box::new(StubPlayer {
            shared: Arc::clone(&self.shared),
            cancelled: false,
        }))
    }
}

struct StubPlayer {
    shared: Arc<StubShared>,
    cancelled: bool,
}

impl PatternPlayer for StubPlayer {
    fn start(&mut self, at_time: f64) -> Result<(), HapticError> {
        if self.shared.fail_player_start.load(Ordering::SeqCst) {
            return Err(HapticError::PlayerStartFailed {
                reason: "stub configured to fail".to_string(),
            });
        }
        self.shared.record().player_starts.push(at_time);
        Ok(())
    }

    fn cancel(&mut self) {
        if !self.cancelled {
            self.cancelled = true;
            self.shared.record().player_cancels += 1;
        }
    }
}

/// Vibrator that counts pulses instead of buzzing.
#[derive(Clone, Default)]
pub struct StubVibrator {
    pulses: Arc<AtomicUsize>,
}

impl StubVibrator {
    pub fn pulses(&self) -> usize {
        self.pulses.load(Ordering::SeqCst)
    }
}

impl SystemVibrator for StubVibrator {
    fn play_default_pulse(&self) {
        self.pulses.fetch_add(1, Ordering::SeqCst);
    }
}

/// Fixed device identity.
#[derive(Debug, Clone)]
pub struct StubDevice {
    physical: bool,
    model: String,
}

impl StubDevice {
    pub fn new(physical: bool, model: impl Into<String>) -> Self {
        Self {
            physical,
            model: model.into(),
        }
    }

    pub fn simulator() -> Self {
        Self::new(false, "x86_64")
    }
}

impl DeviceInfo for StubDevice {
    fn is_physical_device(&self) -> bool {
        self.physical
    }

    fn model(&self) -> String {
        self.model.clone()
    }
}

/// Deterministic time source.
///
/// Each call to `now()` advances by a fixed step (10ms unless configured) to
/// guarantee monotonic timestamps without sleeping.
pub struct StubTimeSource {
    start: Instant,
    step_ms: u64,
    offset_ms: AtomicU64,
}

impl StubTimeSource {
    pub fn new() -> Self {
        Self::with_step(Duration::from_millis(10))
    }

    pub fn with_step(step: Duration) -> Self {
        Self {
            start: Instant::now(),
            step_ms: step.as_millis() as u64,
            offset_ms: AtomicU64::new(0),
        }
    }
}

impl Default for StubTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for StubTimeSource {
    fn now(&self) -> Instant {
        let ms = self.offset_ms.fetch_add(self.step_ms, Ordering::SeqCst);
        self.start + Duration::from_millis(ms)
    }
}
