use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{OverlayError, OverlayResult};

/// Engine construction options. Every field has a default, so `{}` is a valid config file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Zoom used for the first render.
    pub initial_scale: f64,
    /// Smallest zoom [`crate::Engine::set_scale`] accepts.
    pub min_scale: f64,
    /// Largest zoom [`crate::Engine::set_scale`] accepts.
    pub max_scale: f64,
    /// Device pixels per logical pixel for the ink surface.
    pub device_pixel_ratio: f64,
    /// Page rendered right after a document loads (clamped to the page count).
    pub initial_page: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_scale: 1.0,
            min_scale: 0.1,
            max_scale: 10.0,
            device_pixel_ratio: 1.0,
            initial_page: 1,
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> OverlayResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read engine config '{}'", path.display()))?;
        let config: Self =
            serde_json::from_str(&text).map_err(|e| OverlayError::serde(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges and cross-field constraints.
    pub fn validate(&self) -> OverlayResult<()> {
        for (name, v) in [
            ("initial_scale", self.initial_scale),
            ("min_scale", self.min_scale),
            ("max_scale", self.max_scale),
            ("device_pixel_ratio", self.device_pixel_ratio),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(OverlayError::validation(format!(
                    "{name} must be finite and > 0, got {v}"
                )));
            }
        }
        if self.min_scale > self.max_scale {
            return Err(OverlayError::validation(format!(
                "min_scale ({}) must be <= max_scale ({})",
                self.min_scale, self.max_scale
            )));
        }
        self.check_scale(self.initial_scale)?;
        if self.initial_page == 0 {
            return Err(OverlayError::validation("initial_page is 1-indexed"));
        }
        Ok(())
    }

    pub(crate) fn check_scale(&self, scale: f64) -> OverlayResult<()> {
        if !scale.is_finite() || scale < self.min_scale || scale > self.max_scale {
            return Err(OverlayError::validation(format!(
                "scale {scale} is outside [{}, {}]",
                self.min_scale, self.max_scale
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/config.rs"]
mod tests;
