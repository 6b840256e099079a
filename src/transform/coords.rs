//! Stateless conversion from normalized page coordinates to viewport pixels.

use crate::foundation::core::{NormPoint, NormRect, PixelRect, Point, Viewport};

#[inline]
/// Map a normalized rectangle onto `viewport` pixels.
pub fn rect_to_absolute(rect: &NormRect, viewport: &Viewport) -> PixelRect {
    PixelRect {
        left: rect.x * viewport.width,
        top: rect.y * viewport.height,
        width: rect.w * viewport.width,
        height: rect.h * viewport.height,
    }
}

#[inline]
/// Map a normalized point onto `viewport` pixels.
pub fn point_to_absolute(point: NormPoint, viewport: &Viewport) -> Point {
    Point::new(point.x * viewport.width, point.y * viewport.height)
}

#[cfg(test)]
#[path = "../../tests/unit/transform/coords.rs"]
mod tests;
