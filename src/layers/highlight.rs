//! Highlight quads that sweep left to right across their annotation's time window.

use std::collections::HashMap;

use crate::{
    annotation::model::HighlightAnnotation,
    foundation::core::{NormRect, Viewport},
    foundation::error::{OverlayError, OverlayResult},
    layers::base::{Layer, LayerState},
    overlay::host::{Element, ElementId, LayerKind, QuadElement, SharedHost},
    timeline::progress::progress,
    transform::coords::rect_to_absolute,
};

/// Time sub-window assigned to one quad of a multi-quad highlight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// Segment start in seconds.
    pub start: f64,
    /// Segment end in seconds.
    pub end: f64,
}

impl Segment {
    /// Length of the segment in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Split `[start, end]` across `quads` proportionally to their widths.
///
/// Segments are contiguous: each one starts where the previous ended and the last ends exactly
/// at `end`. If the quads have no total width the window is split evenly.
pub fn quad_segments(quads: &[NormRect], start: f64, end: f64) -> Vec<Segment> {
    let n = quads.len();
    if n == 0 {
        return Vec::new();
    }
    let duration = end - start;
    let total: f64 = quads.iter().map(|q| q.w.max(0.0)).sum();
    let even = !(total.is_finite() && total > 0.0);

    let mut segments = Vec::with_capacity(n);
    let mut cumulative = 0.0;
    let mut seg_start = start;
    for (i, quad) in quads.iter().enumerate() {
        let seg_end = if i + 1 == n {
            end
        } else if even {
            start + ((i + 1) as f64 / n as f64) * duration
        } else {
            cumulative += quad.w.max(0.0);
            start + (cumulative / total) * duration
        };
        segments.push(Segment {
            start: seg_start,
            end: seg_end,
        });
        seg_start = seg_end;
    }
    segments
}

#[derive(Debug)]
struct QuadPrimitive {
    id: ElementId,
    segment: Segment,
    element: QuadElement,
}

/// Renders [`HighlightAnnotation`]s as retained quads on an overlay host.
pub struct HighlightLayer {
    host: SharedHost,
    state: LayerState<HighlightAnnotation>,
    primitives: HashMap<String, Vec<QuadPrimitive>>,
}

impl std::fmt::Debug for HighlightLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HighlightLayer")
            .field("state", &self.state)
            .field("primitives", &self.primitives)
            .finish_non_exhaustive()
    }
}

impl HighlightLayer {
    /// Create an empty layer drawing onto `host`.
    pub fn new(host: SharedHost, viewport: Viewport) -> Self {
        Self {
            host,
            state: LayerState::new(viewport),
            primitives: HashMap::new(),
        }
    }

    /// Number of quads currently on the host.
    pub fn quad_count(&self) -> usize {
        self.primitives.values().map(Vec::len).sum()
    }

    /// Revealed fraction of each quad of annotation `id`, in quad order.
    pub fn reveal_of(&self, id: &str) -> Option<Vec<f64>> {
        self.primitives
            .get(id)
            .map(|quads| quads.iter().map(|q| q.element.scale_x).collect())
    }
}

/// Visual state of one quad at `now`: `(scale_x, visible)`.
fn quad_state(annotation: &HighlightAnnotation, segment: Segment, now: f64) -> (f64, bool) {
    (
        progress(segment.start, segment.end, now),
        now >= annotation.start,
    )
}

impl Layer for HighlightLayer {
    type Annotation = HighlightAnnotation;

    fn kind(&self) -> LayerKind {
        LayerKind::Highlight
    }

    fn state(&self) -> &LayerState<HighlightAnnotation> {
        &self.state
    }

    fn state_mut(&mut self) -> &mut LayerState<HighlightAnnotation> {
        &mut self.state
    }

    fn rebuild(&mut self) -> OverlayResult<()> {
        self.release();
        let mut host = self.host.borrow_mut();
        if !host.is_attached() {
            return Err(OverlayError::validation(
                "highlight layer host is not attached",
            ));
        }
        let viewport = self.state.viewport;
        let now = self.state.current_time;
        for annotation in &self.state.annotations {
            let segments = quad_segments(&annotation.quads, annotation.start, annotation.end);
            let mut quads = Vec::with_capacity(segments.len());
            for (quad_index, (rect, segment)) in annotation.quads.iter().zip(segments).enumerate() {
                let (scale_x, visible) = quad_state(annotation, segment, now);
                let element = QuadElement {
                    annotation_id: annotation.id.clone(),
                    quad_index,
                    rect: rect_to_absolute(rect, &viewport),
                    color: annotation.color,
                    scale_x,
                    visible,
                };
                let id = host.create_element(
                    LayerKind::Highlight,
                    Element::HighlightQuad(element.clone()),
                )?;
                quads.push(QuadPrimitive {
                    id,
                    segment,
                    element,
                });
            }
            if let Some(stale) = self.primitives.insert(annotation.id.clone(), quads) {
                tracing::warn!(id = %annotation.id, "duplicate highlight id; keeping the last one");
                for quad in stale {
                    host.remove_element(quad.id);
                }
            }
        }
        tracing::debug!(quads = self.quad_count(), "highlight layer rebuilt");
        Ok(())
    }

    fn apply_time(&mut self) -> OverlayResult<()> {
        let now = self.state.current_time;
        let mut host = self.host.borrow_mut();
        for annotation in &self.state.annotations {
            let Some(quads) = self.primitives.get_mut(&annotation.id) else {
                continue;
            };
            for quad in quads {
                let (scale_x, visible) = quad_state(annotation, quad.segment, now);
                if quad.element.scale_x == scale_x && quad.element.visible == visible {
                    continue;
                }
                quad.element.scale_x = scale_x;
                quad.element.visible = visible;
                host.update_element(quad.id, Element::HighlightQuad(quad.element.clone()))?;
            }
        }
        Ok(())
    }

    fn release(&mut self) {
        let mut host = self.host.borrow_mut();
        for (_, quads) in self.primitives.drain() {
            for quad in quads {
                host.remove_element(quad.id);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/highlight.rs"]
mod tests;
