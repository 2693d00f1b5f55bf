use serde_json::Value;

use crate::foundation::error::MixplayError;
use crate::playback::controller::PlaybackController;

/// One named operation with its JSON arguments.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MethodCall {
    /// Operation name: `load`, `play`, `pause`, `seek`, `setOpacity` or `dispose`.
    pub method: String,
    /// Argument map; absent means no arguments.
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    /// Call `method` with `arguments`.
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

/// Failure reported back to the caller.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MethodError {
    /// `args`, `load` or `notImplemented`.
    pub code: String,
    /// Human-readable detail.
    pub message: String,
}

impl MethodError {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for MethodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Wire form of a call outcome.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MethodResponse {
    /// The call succeeded; `result` is `null` for every current operation.
    Ok {
        /// Operation result.
        result: Value,
    },
    /// The call failed.
    Error {
        /// Failure detail.
        error: MethodError,
    },
}

impl From<Result<Value, MethodError>> for MethodResponse {
    fn from(r: Result<Value, MethodError>) -> Self {
        match r {
            Ok(result) => Self::Ok { result },
            Err(error) => Self::Error { error },
        }
    }
}

fn arg<'a>(args: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|n| args.get(*n)).filter(|v| !v.is_null())
}

fn string_arg<'a>(args: &'a Value, names: &[&str]) -> Option<&'a str> {
    arg(args, names).and_then(Value::as_str)
}

/// Route `call` to `controller`.
///
/// `load` needs string `baseUrl` and `overlayUrl`; `narrationUrl` (alias `extraAudioUrl`) and
/// `opacity` (alias `overlayOpacity`) are optional. `seek` takes integer `ms` and `setOpacity`
/// takes numeric `value`; when those are missing the call succeeds without effect.
pub fn dispatch(controller: &PlaybackController, call: &MethodCall) -> Result<Value, MethodError> {
    let args = &call.arguments;
    match call.method.as_str() {
        "load" => {
            let (Some(base), Some(overlay)) = (
                string_arg(args, &["baseUrl"]).filter(|s| !s.trim().is_empty()),
                string_arg(args, &["overlayUrl"]).filter(|s| !s.trim().is_empty()),
            ) else {
                return Err(MethodError::new("args", "baseUrl/overlayUrl required"));
            };
            let narration = string_arg(args, &["narrationUrl", "extraAudioUrl"]);
            let opacity = arg(args, &["opacity", "overlayOpacity"])
                .and_then(Value::as_f64)
                .map(|v| v as f32);
            controller
                .load(base, overlay, narration, opacity)
                .map_err(|e| match e {
                    MixplayError::Args(msg) => MethodError::new("args", msg),
                    other => MethodError::new("load", other.to_string()),
                })?;
        }
        "play" => controller.play(),
        "pause" => controller.pause(),
        "seek" => {
            if let Some(ms) = arg(args, &["ms"]).and_then(Value::as_i64) {
                controller.seek(ms);
            }
        }
        "setOpacity" => {
            if let Some(v) = arg(args, &["value"]).and_then(Value::as_f64) {
                controller.set_opacity(v as f32);
            }
        }
        "dispose" => controller.dispose(),
        other => {
            return Err(MethodError::new(
                "notImplemented",
                format!("unknown method '{other}'"),
            ));
        }
    }
    Ok(Value::Null)
}

#[cfg(test)]
#[path = "../../tests/unit/surface/method.rs"]
mod tests;
