//! Engine module housing the haptic engine seams and lifecycle.
//!
//! This module exposes trait-based backends (`backend`), the asynchronous
//! notification inbox (`notification`) and the `EngineLifecycleManager`
//! that owns the process-wide engine handle (`lifecycle`).

pub mod backend;
pub mod lifecycle;
pub mod notification;

pub use backend::{
    DesktopStubBackend, DeviceInfo, HapticBackend, HapticEngine, PatternPlayer, Platform,
    StubDevice, StubTimeSource, StubVibrator, SystemTimeSource, SystemVibrator, TimeSource,
};
pub use lifecycle::{EngineLifecycleManager, EngineState, LifecycleEvent};
pub use notification::{EngineNotification, EngineNotifier, StopReason};
