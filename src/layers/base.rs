use crate::{
    foundation::core::Viewport,
    foundation::error::{OverlayError, OverlayResult},
    overlay::host::LayerKind,
};

/// State every layer carries: its annotations (already filtered to its kind and the current
/// page), the viewport it lays out against, the last time it was given, and whether it has been
/// destroyed.
#[derive(Clone, Debug)]
pub struct LayerState<A> {
    pub(crate) viewport: Viewport,
    pub(crate) annotations: Vec<A>,
    pub(crate) current_time: f64,
    pub(crate) destroyed: bool,
}

impl<A> LayerState<A> {
    pub(crate) fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            annotations: Vec::new(),
            current_time: 0.0,
            destroyed: false,
        }
    }

    /// Viewport the layer currently lays out against.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Annotations owned by the layer.
    pub fn annotations(&self) -> &[A] {
        &self.annotations
    }

    /// Time of the last [`Layer::update_time`].
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Whether [`Layer::destroy`] has run.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub(crate) fn ensure_live(&self, kind: LayerKind, op: &'static str) -> OverlayResult<()> {
        if self.destroyed {
            tracing::warn!(layer = kind.as_str(), op, "layer used after destroy");
            return Err(OverlayError::Destroyed(op));
        }
        Ok(())
    }
}

/// Contract shared by the highlight, text and drawing layers.
///
/// Implementors provide [`Layer::rebuild`] (recreate primitives from annotations and viewport)
/// and [`Layer::apply_time`] (recompute visual state from the current time without rebuilding).
/// Everything else is provided. Every operation after [`Layer::destroy`] fails with
/// [`OverlayError::Destroyed`], except `destroy` itself, which is idempotent.
pub trait Layer {
    /// Annotation kind this layer renders.
    type Annotation: Clone;

    /// Which stacking slot this layer occupies.
    fn kind(&self) -> LayerKind;

    /// Shared layer state.
    fn state(&self) -> &LayerState<Self::Annotation>;

    /// Shared layer state, mutably.
    fn state_mut(&mut self) -> &mut LayerState<Self::Annotation>;

    /// Discard and recreate every primitive. Must be safe to call repeatedly.
    fn rebuild(&mut self) -> OverlayResult<()>;

    /// Bring existing primitives up to date with the stored time.
    fn apply_time(&mut self) -> OverlayResult<()>;

    /// Drop every primitive this layer created.
    fn release(&mut self);

    /// Build (or rebuild) visible primitives.
    fn render(&mut self) -> OverlayResult<()> {
        self.state().ensure_live(self.kind(), "render")?;
        self.rebuild()
    }

    /// Replace the layer's annotations. Takes effect on the next [`Layer::render`].
    fn set_annotations(&mut self, annotations: Vec<Self::Annotation>) -> OverlayResult<()> {
        self.state().ensure_live(self.kind(), "set_annotations")?;
        self.state_mut().annotations = annotations;
        Ok(())
    }

    /// Replace the viewport. Takes effect on the next [`Layer::render`].
    fn set_viewport(&mut self, viewport: Viewport) -> OverlayResult<()> {
        self.state().ensure_live(self.kind(), "set_viewport")?;
        self.state_mut().viewport = viewport;
        Ok(())
    }

    /// Store `now` and update visual state for it.
    fn update_time(&mut self, now: f64) -> OverlayResult<()> {
        self.state().ensure_live(self.kind(), "update_time")?;
        self.state_mut().current_time = now;
        self.apply_time()
    }

    /// Release primitives and mark the layer destroyed. Idempotent.
    fn destroy(&mut self) {
        if self.state().destroyed {
            return;
        }
        self.release();
        let state = self.state_mut();
        state.destroyed = true;
        state.annotations.clear();
    }

    /// Whether the layer has been destroyed.
    fn is_destroyed(&self) -> bool {
        self.state().destroyed
    }
}
