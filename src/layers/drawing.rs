//! Freehand ink, redrawn from scratch onto a raster surface on every update.

use crate::{
    annotation::model::{InkAnnotation, InkPoint, InkStroke},
    foundation::core::{BezPath, NormPoint, Viewport},
    foundation::error::{OverlayError, OverlayResult},
    layers::base::{Layer, LayerState},
    overlay::host::LayerKind,
    overlay::ink::SharedInkSurface,
    transform::coords::point_to_absolute,
};

/// Points of `stroke` revealed at `now` for an annotation spanning `[start, end]`.
///
/// A point with normalized offset `t` appears at `start + t * (end - start)`. Nothing is revealed
/// before `start`; a zero-length window reveals every point at once.
pub fn revealed_points(stroke: &InkStroke, start: f64, end: f64, now: f64) -> Vec<&InkPoint> {
    if now < start {
        return Vec::new();
    }
    let duration = end - start;
    let elapsed = (now - start).min(duration);
    stroke
        .points
        .iter()
        .filter(|p| p.t * duration <= elapsed)
        .collect()
}

/// Renders [`InkAnnotation`]s onto an [`crate::InkSurface`].
pub struct DrawingLayer {
    surface: SharedInkSurface,
    density: f64,
    state: LayerState<InkAnnotation>,
    configured_for: Option<Viewport>,
    strokes_drawn: usize,
}

impl std::fmt::Debug for DrawingLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingLayer")
            .field("density", &self.density)
            .field("state", &self.state)
            .field("configured_for", &self.configured_for)
            .finish_non_exhaustive()
    }
}

impl DrawingLayer {
    /// Create an empty layer drawing onto `surface` at `density` device pixels per logical pixel.
    pub fn new(surface: SharedInkSurface, viewport: Viewport, density: f64) -> Self {
        Self {
            surface,
            density,
            state: LayerState::new(viewport),
            configured_for: None,
            strokes_drawn: 0,
        }
    }

    /// Strokes drawn by the most recent redraw.
    pub fn strokes_drawn(&self) -> usize {
        self.strokes_drawn
    }

    fn redraw(&mut self) -> OverlayResult<()> {
        let viewport = self.state.viewport;
        let now = self.state.current_time;
        let mut surface = self.surface.borrow_mut();
        surface.clear();

        let mut drawn = 0;
        for annotation in &self.state.annotations {
            if now < annotation.start {
                continue;
            }
            for stroke in &annotation.strokes {
                let points = revealed_points(stroke, annotation.start, annotation.end, now);
                if points.len() < 2 {
                    continue;
                }
                let mut path = BezPath::new();
                for (i, p) in points.iter().enumerate() {
                    let abs = point_to_absolute(NormPoint { x: p.x, y: p.y }, &viewport);
                    if i == 0 {
                        path.move_to(abs);
                    } else {
                        path.line_to(abs);
                    }
                }
                surface.stroke_path(&path, stroke.color, stroke.width * viewport.scale);
                drawn += 1;
            }
        }
        surface.present()?;
        self.strokes_drawn = drawn;
        Ok(())
    }
}

impl Layer for DrawingLayer {
    type Annotation = InkAnnotation;

    fn kind(&self) -> LayerKind {
        LayerKind::Drawing
    }

    fn state(&self) -> &LayerState<InkAnnotation> {
        &self.state
    }

    fn state_mut(&mut self) -> &mut LayerState<InkAnnotation> {
        &mut self.state
    }

    fn rebuild(&mut self) -> OverlayResult<()> {
        {
            let mut surface = self.surface.borrow_mut();
            if !surface.is_attached() {
                return Err(OverlayError::validation("ink surface is not attached"));
            }
            let viewport = self.state.viewport;
            if self.configured_for != Some(viewport) {
                surface.configure(viewport.width, viewport.height, self.density)?;
                self.configured_for = Some(viewport);
            }
        }
        self.redraw()
    }

    fn apply_time(&mut self) -> OverlayResult<()> {
        self.redraw()
    }

    fn release(&mut self) {
        self.surface.borrow_mut().clear();
        self.strokes_drawn = 0;
        if let Err(err) = self.surface.borrow_mut().present() {
            tracing::warn!(error = %err, "failed to present cleared ink surface");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/drawing.rs"]
mod tests;
