//! Backend abstractions for the platform services the core drives.
//!
//! The haptic engine, the system-sound vibrator and the device identity
//! query all live on the host platform. The core only sees them through the
//! traits below; the iOS host supplies real implementations and tests, the
//! CLI and desktop builds use [`DesktopStubBackend`].

use std::sync::Arc;
use std::time::Instant;

use crate::engine::notification::EngineNotifier;
use crate::error::HapticError;
use crate::pattern::HapticTimeline;

/// Factory and capability query for the hardware haptic engine.
pub trait HapticBackend: Send + Sync {
    /// Construct a new engine. The backend keeps `notifier` and reports
    /// asynchronous stop/reset events through it.
    fn create_engine(&self, notifier: EngineNotifier) -> Result<Box<dyn HapticEngine>, HapticError>;

    /// Whether the hardware supports custom haptic timelines.
    fn supports_custom_haptics(&self) -> Result<bool, HapticError>;
}

/// A live haptic engine handle.
pub trait HapticEngine: Send {
    fn start(&mut self) -> Result<(), HapticError>;
    fn make_player(&mut self, timeline: &HapticTimeline)
        -> Result<Box<dyn PatternPlayer>, HapticError>;
}

/// Player for one submitted timeline.
pub trait PatternPlayer: Send {
    /// Start playback at `at_time` seconds on the engine clock (0 = now)
    fn start(&mut self, at_time: f64) -> Result<(), HapticError>;
    /// Stop playback and release the player's engine resources
    fn cancel(&mut self);
}

/// Simple on/off system vibration, fire-and-forget.
pub trait SystemVibrator: Send + Sync {
    fn play_default_pulse(&self);
}

/// Host device identity.
pub trait DeviceInfo: Send + Sync {
    /// False on simulators/emulators
    fn is_physical_device(&self) -> bool;
    /// Hardware model identifier, e.g. "iPhone12,1"
    fn model(&self) -> String;
}

/// Trait representing a monotonic time source used by the fallback timer.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Instant;
}

/// Default time source backed by `Instant::now`.
#[derive(Default)]
pub struct SystemTimeSource {
    _unit: (),
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Bundle of platform services handed to the context at registration.
#[derive(Clone)]
pub struct Platform {
    pub backend: Arc<dyn HapticBackend>,
    pub vibrator: Arc<dyn SystemVibrator>,
    pub device: Arc<dyn DeviceInfo>,
    pub time_source: Arc<dyn TimeSource>,
}

impl Platform {
    /// Platform backed entirely by the desktop stub.
    pub fn desktop_stub() -> Self {
        Self {
            backend: Arc::new(DesktopStubBackend::new()),
            vibrator: Arc::new(StubVibrator::default()),
            device: Arc::new(StubDevice::simulator()),
            time_source: Arc::new(SystemTimeSource::default()),
        }
    }
}

mod desktop_stub;
pub use desktop_stub::{DesktopStubBackend, StubDevice, StubRecord, StubTimeSource, StubVibrator};
