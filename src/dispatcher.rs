//! Command dispatcher for the `vibration` method channel.
//!
//! The platform shim hands over the method name and the raw argument map as
//! JSON; the dispatcher normalizes arguments, calls the context and returns a
//! [`MethodResponse`] the shim can relay to Dart unchanged.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::VibrationContext;
use crate::error::{channel_codes, ErrorCode, HapticError};
use crate::playback::PlaybackOutcome;

/// One incoming method call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Option<Value>) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

/// Reply to a method call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MethodResponse {
    Success { value: Value },
    Error { code: String, message: String },
    NotImplemented,
}

impl MethodResponse {
    fn success(value: impl Into<Value>) -> Self {
        MethodResponse::Success {
            value: value.into(),
        }
    }

    fn error(code: &str, message: impl Into<String>) -> Self {
        MethodResponse::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }

    fn from_haptic_error(err: &HapticError) -> Self {
        Self::error(err.channel_code(), err.message())
    }
}

/// Routes method-channel calls to the vibration context
pub struct CommandDispatcher {
    context: Arc<VibrationContext>,
}

impl CommandDispatcher {
    pub fn new(context: Arc<VibrationContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &VibrationContext {
        &self.context
    }

    pub fn handle(&self, call: &MethodCall) -> MethodResponse {
        debug!("[Dispatch] {}", call.method);

        match call.method.as_str() {
            "hasVibrator" => MethodResponse::success(self.context.has_vibrator()),
            "hasAmplitudeControl" => MethodResponse::success(self.context.has_amplitude_control()),
            "hasCustomVibrationsSupport" => {
                MethodResponse::success(self.context.has_custom_vibrations_support())
            }
            "vibrate_duration" => self.vibrate_duration(call.arguments.as_ref()),
            "vibrate" => self.vibrate(call.arguments.as_ref()),
            "cancel" => match self.context.cancel() {
                Ok(()) => MethodResponse::success(Value::Null),
                Err(err) => MethodResponse::from_haptic_error(&err),
            },
            _ => MethodResponse::NotImplemented,
        }
    }

    fn vibrate_duration(&self, arguments: Option<&Value>) -> MethodResponse {
        let Some(args) = argument_map(arguments) else {
            return MethodResponse::error(channel_codes::NO_ARGS, "args are missing");
        };

        let duration = optional_int(args, "duration");
        let intensity = optional_int(args, "intensity");

        match self.context.vibrate_duration(duration, intensity) {
            Ok(PlaybackOutcome::Engine) => MethodResponse::success(Value::Null),
            Ok(_) => MethodResponse::success(self.context.has_vibrator()),
            Err(err) => MethodResponse::from_haptic_error(&err),
        }
    }

    fn vibrate(&self, arguments: Option<&Value>) -> MethodResponse {
        let Some(args) = argument_map(arguments) else {
            return MethodResponse::error(channel_codes::NO_ARGS, "args are missing");
        };

        let pattern = match int_list(args, "pattern") {
            Ok(pattern) => pattern,
            Err(message) => return MethodResponse::error(channel_codes::INVALID_PATTERN, message),
        };
        let intensities = match int_list(args, "intensities") {
            Ok(intensities) => intensities,
            Err(message) => return MethodResponse::error(channel_codes::INVALID_PATTERN, message),
        };

        match self.context.vibrate(&pattern, &intensities) {
            Ok(PlaybackOutcome::Engine) => MethodResponse::success(self.context.has_vibrator()),
            Ok(_) => MethodResponse::success(true),
            Err(err) => MethodResponse::from_haptic_error(&err),
        }
    }
}

fn argument_map(arguments: Option<&Value>) -> Option<&Map<String, Value>> {
    arguments.and_then(Value::as_object)
}

/// Read an optional integer; anything else falls back to the default
fn optional_int(args: &Map<String, Value>, key: &str) -> Option<i64> {
    match args.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => {
            let parsed = value.as_i64();
            if parsed.is_none() {
                debug!("[Dispatch] Ignoring non-integer {}: {}, using default", key, value);
            }
            parsed
        }
    }
}

/// Read an optional list of integers; absent or null means empty
fn int_list(args: &Map<String, Value>, key: &str) -> Result<Vec<i64>, String> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_i64()
                    .ok_or_else(|| format!("{}[{}] is not an integer", key, i))
            })
            .collect(),
        Some(_) => Err(format!("{} must be a list of integers", key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_int_list_accepts_missing_and_null() {
        let args = json!({"intensities": null});
        let map = args.as_object().unwrap();
        assert_eq!(int_list(map, "pattern").unwrap(), Vec::<i64>::new());
        assert_eq!(int_list(map, "intensities").unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn test_int_list_rejects_non_integers() {
        let args = json!({"pattern": [0, 1.5], "intensities": "loud"});
        let map = args.as_object().unwrap();
        assert_eq!(
            int_list(map, "pattern").unwrap_err(),
            "pattern[1] is not an integer"
        );
        assert!(int_list(map, "intensities").is_err());
    }

    #[test]
    fn test_optional_int_ignores_ill_typed_values() {
        let args = json!({"duration": 1.5, "intensity": "500", "extra": 42, "none": null});
        let map = args.as_object().unwrap();
        assert_eq!(optional_int(map, "duration"), None);
        assert_eq!(optional_int(map, "intensity"), None);
        assert_eq!(optional_int(map, "none"), None);
        assert_eq!(optional_int(map, "missing"), None);
        assert_eq!(optional_int(map, "extra"), Some(42));
    }

    #[test]
    fn test_argument_map_requires_object() {
        assert!(argument_map(None).is_none());
        assert!(argument_map(Some(&json!([1, 2]))).is_none());
        assert!(argument_map(Some(&json!({}))).is_some());
    }

    #[test]
    fn test_response_serialization_shape() {
        let response = MethodResponse::error(channel_codes::NO_ARGS, "args are missing");
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"status": "error", "code": "no_args", "message": "args are missing"})
        );
        assert_eq!(
            serde_json::to_value(MethodResponse::NotImplemented).unwrap(),
            json!({"status": "not_implemented"})
        );
    }
}
