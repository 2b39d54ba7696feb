//! Capability probe - what the host device can do.
//!
//! None of these queries fail: anything the platform cannot answer is
//! reported as unsupported.

use std::sync::Arc;

use log::debug;

use crate::config::DeviceConfig;
use crate::engine::backend::{DeviceInfo, HapticBackend};

pub struct CapabilityProbe {
    backend: Arc<dyn HapticBackend>,
    device: Arc<dyn DeviceInfo>,
    incapable_model_prefixes: Vec<String>,
}

impl CapabilityProbe {
    pub fn new(
        backend: Arc<dyn HapticBackend>,
        device: Arc<dyn DeviceInfo>,
        config: &DeviceConfig,
    ) -> Self {
        Self {
            backend,
            device,
            incapable_model_prefixes: config.incapable_model_prefixes.clone(),
        }
    }

    /// True on physical hardware, false on simulators
    pub fn has_vibrator(&self) -> bool {
        self.device.is_physical_device()
    }

    /// Amplitude control is assumed wherever a vibrator exists
    pub fn has_amplitude_control(&self) -> bool {
        self.has_vibrator()
    }

    /// Whether the hardware can play custom haptic timelines
    pub fn has_custom_haptics_support(&self) -> bool {
        let model = self.device.model();
        if self.is_known_incapable(&model) {
            debug!("[Capability] Model {} is listed as lacking custom haptics", model);
            return false;
        }

        match self.backend.supports_custom_haptics() {
            Ok(supported) => supported,
            Err(err) => {
                debug!("[Capability] Custom haptics query failed: {}", err);
                false
            }
        }
    }

    fn is_known_incapable(&self, model: &str) -> bool {
        self.incapable_model_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && model.starts_with(prefix.as_str()))
    }
}
