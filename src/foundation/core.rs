use crate::foundation::error::{OverlayError, OverlayResult};

pub use kurbo::{Affine, BezPath, Point};

/// Pixel dimensions and scale describing how a page is currently rendered.
///
/// Absolute coordinates are only meaningful for the viewport that produced them; any change
/// invalidates previously computed layout.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Rendered page width in logical pixels.
    pub width: f64,
    /// Rendered page height in logical pixels.
    pub height: f64,
    /// Zoom factor the page was rendered at.
    pub scale: f64,
}

impl Viewport {
    /// Build a viewport, rejecting negative or non-finite dimensions and non-positive scales.
    pub fn new(width: f64, height: f64, scale: f64) -> OverlayResult<Self> {
        if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
            return Err(OverlayError::validation(
                "viewport dimensions must be finite and >= 0",
            ));
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(OverlayError::validation("viewport scale must be finite and > 0"));
        }
        Ok(Self {
            width,
            height,
            scale,
        })
    }

    /// Zero-sized viewport used before any page has been rendered.
    pub fn empty(scale: f64) -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            scale,
        }
    }

    /// Whether the viewport has no drawable area.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Backing-store size in whole device pixels for the given pixel density.
    pub fn device_size(&self, density: f64) -> (u32, u32) {
        fn dim(v: f64) -> u32 {
            v.floor().clamp(0.0, f64::from(u32::MAX)) as u32
        }
        (dim(self.width * density), dim(self.height * density))
    }
}

/// Normalized rectangle, every component in `[0, 1]` relative to the page size.
///
/// Missing `w`/`h` deserialize as `0` rather than being guessed.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NormRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    #[serde(default)]
    pub w: f64,
    /// Height.
    #[serde(default)]
    pub h: f64,
}

impl NormRect {
    /// Build a normalized rectangle.
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub(crate) fn validate(&self, what: &str) -> OverlayResult<()> {
        if [self.x, self.y, self.w, self.h].iter().any(|v| !v.is_finite()) {
            return Err(OverlayError::validation(format!(
                "{what} must have finite coordinates"
            )));
        }
        if self.w < 0.0 || self.h < 0.0 {
            return Err(OverlayError::validation(format!(
                "{what} must have non-negative size"
            )));
        }
        Ok(())
    }
}

/// Normalized point relative to the page size.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NormPoint {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

/// Absolute rectangle in viewport (logical pixel) space.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PixelRect {
    /// Left edge in pixels.
    pub left: f64,
    /// Top edge in pixels.
    pub top: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl PixelRect {
    /// Convert into a `kurbo` rectangle.
    pub fn to_kurbo(self) -> kurbo::Rect {
        kurbo::Rect::new(
            self.left,
            self.top,
            self.left + self.width,
            self.top + self.height,
        )
    }

    /// The rectangle after a horizontal scale anchored at its left edge.
    pub fn scaled_from_left(self, scale_x: f64) -> Self {
        Self {
            width: self.width * scale_x,
            ..self
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
