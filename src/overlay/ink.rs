//! Immediate-mode ink surfaces: cleared and fully redrawn on every update.

use std::{cell::RefCell, path::Path, rc::Rc};

use anyhow::Context as _;
use kurbo::{PathEl, Point};

use crate::{
    foundation::color::Color,
    foundation::core::{Affine, BezPath},
    foundation::error::{OverlayError, OverlayResult},
};

/// Raster surface the drawing layer strokes ink onto.
///
/// Callers work in logical (viewport) pixels; the surface owns the mapping to device pixels set
/// by [`InkSurface::configure`]. That mapping is replaced, never accumulated, on reconfigure.
pub trait InkSurface {
    /// Whether the surface is still attached to something that displays it.
    fn is_attached(&self) -> bool {
        true
    }

    /// Size the backing store to `width * density` by `height * density` device pixels.
    fn configure(&mut self, width: f64, height: f64, density: f64) -> OverlayResult<()>;

    /// Discard everything drawn since the last clear.
    fn clear(&mut self);

    /// Stroke `path` (logical pixels) with round caps and joins.
    fn stroke_path(&mut self, path: &BezPath, color: Color, width: f64);

    /// Make the strokes since the last clear visible.
    fn present(&mut self) -> OverlayResult<()>;
}

/// Shared handle to an ink surface.
pub type SharedInkSurface = Rc<RefCell<dyn InkSurface>>;

#[derive(Clone, Debug)]
struct PendingStroke {
    path: BezPath,
    color: Color,
    width: f64,
}

/// CPU-rasterized ink surface.
pub struct CpuInkSurface {
    width: u16,
    height: u16,
    base: Affine,
    pending: Vec<PendingStroke>,
    pixmap: vello_cpu::Pixmap,
}

impl Default for CpuInkSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CpuInkSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuInkSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl CpuInkSurface {
    /// Create an unconfigured (zero-sized) surface.
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            base: Affine::IDENTITY,
            pending: Vec::new(),
            pixmap: vello_cpu::Pixmap::new(0, 0),
        }
    }

    /// Backing-store size in device pixels.
    pub fn size(&self) -> (u32, u32) {
        (u32::from(self.width), u32::from(self.height))
    }

    /// Premultiplied RGBA8 pixels of the last presented frame.
    pub fn rgba8_premul(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    /// Premultiplied RGBA8 value at device pixel `(x, y)`, if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let (w, h) = self.size();
        if x >= w || y >= h {
            return None;
        }
        let i = (y as usize * w as usize + x as usize) * 4;
        let d = self.rgba8_premul();
        Some([d[i], d[i + 1], d[i + 2], d[i + 3]])
    }

    /// Write the last presented frame as a PNG.
    pub fn save_png(&self, path: &Path) -> OverlayResult<()> {
        let (w, h) = self.size();
        if w == 0 || h == 0 {
            return Err(OverlayError::validation("ink surface has not been configured"));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        let straight = unpremultiply(self.rgba8_premul());
        image::save_buffer_with_format(
            path,
            &straight,
            w,
            h,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

impl InkSurface for CpuInkSurface {
    fn configure(&mut self, width: f64, height: f64, density: f64) -> OverlayResult<()> {
        if !density.is_finite() || density <= 0.0 {
            return Err(OverlayError::validation(format!(
                "device pixel ratio must be finite and > 0, got {density}"
            )));
        }
        let device = |v: f64, what: &str| -> OverlayResult<u16> {
            let px = (v * density).floor();
            if !px.is_finite() || px < 0.0 || px > f64::from(u16::MAX) {
                return Err(OverlayError::validation(format!(
                    "ink surface {what} {px} does not fit in u16"
                )));
            }
            Ok(px as u16)
        };
        let (w, h) = (device(width, "width")?, device(height, "height")?);
        if (w, h) != (self.width, self.height) {
            self.width = w;
            self.height = h;
            self.pixmap = vello_cpu::Pixmap::new(w, h);
        }
        self.base = Affine::scale(density);
        self.pending.clear();
        tracing::debug!(width = w, height = h, density, "ink surface configured");
        Ok(())
    }

    fn clear(&mut self) {
        self.pending.clear();
    }

    fn stroke_path(&mut self, path: &BezPath, color: Color, width: f64) {
        self.pending.push(PendingStroke {
            path: path.clone(),
            color,
            width,
        });
    }

    fn present(&mut self) -> OverlayResult<()> {
        if self.width == 0 || self.height == 0 {
            self.pending.clear();
            return Ok(());
        }
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_transform(affine_to_cpu(self.base));
        for stroke in &self.pending {
            let [r, g, b, a] = stroke.color.to_rgba8();
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            ctx.set_stroke(
                vello_cpu::kurbo::Stroke::new(stroke.width)
                    .with_caps(vello_cpu::kurbo::Cap::Round)
                    .with_join(vello_cpu::kurbo::Join::Round),
            );
            ctx.stroke_path(&bezpath_to_cpu(&stroke.path));
        }
        ctx.flush();
        clear_pixmap(&mut self.pixmap);
        ctx.render_to_pixmap(&mut self.pixmap);
        Ok(())
    }
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap) {
    pixmap.data_as_u8_slice_mut().fill(0);
}

fn unpremultiply(premul: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(premul.len());
    for px in premul.chunks_exact(4) {
        let a = px[3];
        if a == 0 {
            out.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        let un = |c: u8| -> u8 {
            ((u16::from(c) * 255 + u16::from(a) / 2) / u16::from(a)).min(255) as u8
        };
        out.extend_from_slice(&[un(px[0]), un(px[1]), un(px[2]), a]);
    }
    out
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

/// Operation captured by [`RecordingInkSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum InkOp {
    /// Surface (re)configured.
    Configure {
        /// Logical width.
        width: f64,
        /// Logical height.
        height: f64,
        /// Device pixel ratio.
        density: f64,
    },
    /// Surface cleared.
    Clear,
    /// Polyline stroked.
    Stroke {
        /// Vertices in logical pixels.
        points: Vec<Point>,
        /// Stroke color.
        color: Color,
        /// Stroke width in logical pixels.
        width: f64,
    },
    /// Frame presented.
    Present,
}

/// [`InkSurface`] that records calls instead of rasterizing.
///
/// Only the current frame is kept: each [`InkSurface::clear`] drops the operations before it, so
/// a long-running session records a bounded amount. Configuration and clears are also counted.
#[derive(Clone, Debug, Default)]
pub struct RecordingInkSurface {
    ops: Vec<InkOp>,
    last_configure: Option<InkOp>,
    configures: usize,
    clears: usize,
    detached: bool,
}

impl RecordingInkSurface {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap in a shared handle.
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Simulate detaching the surface from its display.
    pub fn set_detached(&mut self, detached: bool) {
        self.detached = detached;
    }

    /// Operations recorded since the most recent clear, starting with that clear.
    pub fn ops(&self) -> &[InkOp] {
        &self.ops
    }

    /// Forget recorded operations and counters.
    pub fn reset(&mut self) {
        self.ops.clear();
        self.last_configure = None;
        self.configures = 0;
        self.clears = 0;
    }

    /// Strokes drawn since the most recent clear, i.e. what is currently on screen.
    pub fn current_strokes(&self) -> Vec<&InkOp> {
        let start = self
            .ops
            .iter()
            .rposition(|op| matches!(op, InkOp::Clear | InkOp::Configure { .. }))
            .map_or(0, |i| i + 1);
        self.ops[start..]
            .iter()
            .filter(|op| matches!(op, InkOp::Stroke { .. }))
            .collect()
    }

    /// Number of recorded clears.
    pub fn clear_count(&self) -> usize {
        self.clears
    }

    /// Number of recorded configurations.
    pub fn configure_count(&self) -> usize {
        self.configures
    }

    /// The most recent [`InkOp::Configure`].
    pub fn last_configure(&self) -> Option<&InkOp> {
        self.last_configure.as_ref()
    }
}

impl InkSurface for RecordingInkSurface {
    fn is_attached(&self) -> bool {
        !self.detached
    }

    fn configure(&mut self, width: f64, height: f64, density: f64) -> OverlayResult<()> {
        let op = InkOp::Configure {
            width,
            height,
            density,
        };
        self.ops.push(op.clone());
        self.last_configure = Some(op);
        self.configures += 1;
        Ok(())
    }

    fn clear(&mut self) {
        self.ops.clear();
        self.ops.push(InkOp::Clear);
        self.clears += 1;
    }

    fn stroke_path(&mut self, path: &BezPath, color: Color, width: f64) {
        let points = path
            .elements()
            .iter()
            .filter_map(|el| match *el {
                PathEl::MoveTo(p) | PathEl::LineTo(p) => Some(p),
                _ => None,
            })
            .collect();
        self.ops.push(InkOp::Stroke {
            points,
            color,
            width,
        });
    }

    fn present(&mut self) -> OverlayResult<()> {
        self.ops.push(InkOp::Present);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/ink.rs"]
mod tests;
