// Public API for flutter_rust_bridge integration
// This module provides FFI functions for Flutter to drive device vibration

#![allow(dead_code)] // FFI functions are called from Dart, not detected by Rust analyzer

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use once_cell::sync::OnceCell;

use crate::config::AppConfig;
use crate::context::VibrationContext;
use crate::dispatcher::{CommandDispatcher, MethodCall};
use crate::engine::backend::Platform;
use crate::error::HapticError;
use crate::playback::PlaybackOutcome;

// Re-export error code constants for FFI exposure
pub use crate::error::{HapticErrorCodes, PatternErrorCodes};

/// Global dispatcher instance
///
/// Set once by [`register_platform`] from the host's plugin registration.
/// If Dart calls in before any registration (desktop runs, tests) the
/// desktop stub platform is used.
static DISPATCHER: OnceCell<CommandDispatcher> = OnceCell::new();

fn build_dispatcher(platform: Platform, config: AppConfig) -> CommandDispatcher {
    crate::init_logging();
    let context = VibrationContext::new(platform, config);
    context.start_notification_worker();
    CommandDispatcher::new(Arc::new(context))
}

fn dispatcher() -> &'static CommandDispatcher {
    DISPATCHER.get_or_init(|| build_dispatcher(Platform::desktop_stub(), AppConfig::load()))
}

/// Register the host platform services
///
/// Called by the native plugin registration before any Dart call. Creates the
/// haptic engine and starts the notification worker.
///
/// # Errors
/// Fails if a platform was already registered (or the stub was already
/// installed by an earlier call).
#[flutter_rust_bridge::frb(ignore)]
pub fn register_platform(platform: Platform, config: AppConfig) -> Result<()> {
    DISPATCHER
        .set(build_dispatcher(platform, config))
        .map_err(|_| anyhow!("vibration platform already registered"))
}

/// Get the version of the vibration core
#[flutter_rust_bridge::frb(sync)]
pub fn get_version() -> Result<String> {
    Ok(env!("CARGO_PKG_VERSION").to_string())
}

/// Whether the device can vibrate (false on simulators)
#[flutter_rust_bridge::frb(sync)]
pub fn has_vibrator() -> bool {
    dispatcher().context().has_vibrator()
}

/// Whether vibration amplitude can be controlled
#[flutter_rust_bridge::frb(sync)]
pub fn has_amplitude_control() -> bool {
    dispatcher().context().has_amplitude_control()
}

/// Whether the hardware supports custom haptic patterns
#[flutter_rust_bridge::frb(sync)]
pub fn has_custom_vibrations_support() -> bool {
    dispatcher().context().has_custom_vibrations_support()
}

/// Vibrate for a duration
///
/// # Arguments
/// * `duration_ms` - Duration in milliseconds (default 500, floored to 1)
/// * `intensity` - Intensity 1-255 (default 255, clamped)
///
/// # Returns
/// * `Ok(None)` - Playing on the haptic engine
/// * `Ok(Some(has_vibrator))` - Playing on the fallback loop
/// * `Err(HapticError)` - Engine submission failed
#[flutter_rust_bridge::frb]
pub fn vibrate_duration(
    duration_ms: Option<i64>,
    intensity: Option<i64>,
) -> Result<Option<bool>, HapticError> {
    let context = dispatcher().context();
    match context.vibrate_duration(duration_ms, intensity)? {
        PlaybackOutcome::Engine => Ok(None),
        _ => Ok(Some(context.has_vibrator())),
    }
}

/// Play a wait/duration pattern
///
/// # Arguments
/// * `pattern` - Alternating wait/duration pairs in milliseconds
/// * `intensities` - One 0-255 intensity per pair, or empty for default
///
/// # Errors
/// - `HapticError::InvalidPattern` for malformed input
/// - engine submission failures
#[flutter_rust_bridge::frb]
pub fn vibrate(pattern: Vec<i64>, intensities: Vec<i64>) -> Result<bool, HapticError> {
    let context = dispatcher().context();
    match context.vibrate(&pattern, &intensities)? {
        PlaybackOutcome::Engine => Ok(context.has_vibrator()),
        _ => Ok(true),
    }
}

/// Cancel the active vibration. Safe to call when nothing is playing.
#[flutter_rust_bridge::frb]
pub fn cancel() -> Result<(), HapticError> {
    dispatcher().context().cancel()
}

/// Handle a raw method-channel call
///
/// `arguments_json` is the call's argument map serialized as JSON. The reply
/// is a serialized `MethodResponse`.
#[flutter_rust_bridge::frb]
pub fn handle_method_call(method: String, arguments_json: Option<String>) -> Result<String> {
    let arguments = arguments_json
        .as_deref()
        .map(|json| serde_json::from_str::<serde_json::Value>(json))
        .transpose()
        .context("method arguments are not valid JSON")?;

    let response = dispatcher().handle(&MethodCall::new(method, arguments));
    serde_json::to_string(&response).context("failed to serialize method response")
}
