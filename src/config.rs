//! Engine configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::audio::mix::MixPolicy;
use crate::foundation::error::{MixplayError, MixplayResult};
use crate::render::buffer_pool::BufferPoolOpts;

/// Top-level engine configuration. Every section falls back to its default when omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Overlay opacity used when `load` is called without one.
    pub default_opacity: f32,

    /// Frame rate assumed when the background reports none.
    pub fallback_frame_rate: f32,

    /// Constant audio volumes.
    pub mix: MixPolicy,

    /// Render worker settings.
    pub render: RenderConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Render worker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Name of the compositor's worker thread.
    pub queue_label: String,

    /// Frames with at least this many pixels are blended row-parallel; `0` disables it.
    pub parallel_rows_min_pixels: usize,

    /// Longest a clock tick waits for its frame, in milliseconds.
    pub tick_timeout_ms: u64,

    /// Destination buffer retention.
    pub buffer_pool: BufferPoolOpts,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "mixplay=debug,warn"). `RUST_LOG` takes precedence.
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_opacity: 0.7,
            fallback_frame_rate: 30.0,
            mix: MixPolicy::default(),
            render: RenderConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            queue_label: "mixplay.render".to_string(),
            parallel_rows_min_pixels: 640 * 360,
            tick_timeout_ms: 1000,
            buffer_pool: BufferPoolOpts::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> MixplayResult<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| MixplayError::config(format!("invalid config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: &Path) -> MixplayResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            MixplayError::config(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Check value ranges.
    pub fn validate(&self) -> MixplayResult<()> {
        if !(0.0..=1.0).contains(&self.default_opacity) {
            return Err(MixplayError::config(format!(
                "default_opacity must be within [0, 1], got {}",
                self.default_opacity
            )));
        }
        if !self.fallback_frame_rate.is_finite() || self.fallback_frame_rate <= 0.0 {
            return Err(MixplayError::config(format!(
                "fallback_frame_rate must be finite and > 0, got {}",
                self.fallback_frame_rate
            )));
        }
        self.mix.validate()?;
        if self.render.queue_label.trim().is_empty() {
            return Err(MixplayError::config("render.queue_label must not be empty"));
        }
        if self.render.tick_timeout_ms == 0 {
            return Err(MixplayError::config("render.tick_timeout_ms must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
