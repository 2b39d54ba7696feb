// Vibration Core - haptic pattern playback for the Flutter vibration plugin
// Pattern compilation, engine lifecycle and fallback vibration

// Module declarations
pub mod api;
pub mod capability;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod pattern;
pub mod playback;

// Re-exports for convenience
pub use api::*;

use std::sync::Once;

static LOGGING: Once = Once::new();

/// Install the tracing subscriber once per process
///
/// `log` records from this crate are forwarded through the subscriber's
/// log bridge. Safe to call repeatedly; a subscriber installed by the host
/// takes precedence.
pub fn init_logging() {
    LOGGING.call_once(|| {
        let result = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .try_init();

        if let Err(err) = result {
            // host already installed a subscriber
            log::debug!("Logging already initialized: {}", err);
        } else {
            log::info!("Vibration core logging initialized");
        }
    });
}
