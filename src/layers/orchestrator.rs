use crate::{
    annotation::model::Annotation,
    foundation::core::Viewport,
    foundation::error::{OverlayError, OverlayResult},
    layers::base::Layer,
    layers::drawing::DrawingLayer,
    layers::highlight::HighlightLayer,
    layers::text::TextLayer,
    overlay::host::SharedHost,
    overlay::ink::SharedInkSurface,
};

/// How [`LayerOrchestrator::set_annotations`] routed its input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct RoutingSummary {
    /// Highlights handed to the highlight layer.
    pub highlights: usize,
    /// Text boxes handed to the text layer.
    pub texts: usize,
    /// Ink annotations handed to the drawing layer.
    pub inks: usize,
    /// Annotations of an unrecognized kind, dropped.
    pub unknown: usize,
    /// Annotations on other pages, skipped.
    pub other_pages: usize,
}

impl RoutingSummary {
    /// Annotations now owned by some layer.
    pub fn routed(&self) -> usize {
        self.highlights + self.texts + self.inks
    }
}

/// Owns the three overlay layers and keeps them in step.
pub struct LayerOrchestrator {
    host: SharedHost,
    ink: SharedInkSurface,
    highlight: HighlightLayer,
    text: TextLayer,
    drawing: DrawingLayer,
    page: Option<u32>,
    destroyed: bool,
}

impl std::fmt::Debug for LayerOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerOrchestrator")
            .field("highlight", &self.highlight)
            .field("text", &self.text)
            .field("drawing", &self.drawing)
            .field("page", &self.page)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

/// Run every step, log failures, and report the first one.
fn first_error(steps: [(&'static str, OverlayResult<()>); 3]) -> OverlayResult<()> {
    let mut first = None;
    for (layer, result) in steps {
        if let Err(err) = result {
            tracing::warn!(layer, error = %err, "layer operation failed");
            first.get_or_insert(err);
        }
    }
    first.map_or(Ok(()), Err)
}

fn check_attached(host: &SharedHost, ink: &SharedInkSurface) -> OverlayResult<()> {
    if !host.borrow().is_attached() {
        return Err(OverlayError::validation("overlay host is not attached"));
    }
    if !ink.borrow().is_attached() {
        return Err(OverlayError::validation("ink surface is not attached"));
    }
    Ok(())
}

impl LayerOrchestrator {
    /// Create the highlight, text and drawing layers against the same host and viewport.
    ///
    /// Fails with a validation error if either surface is detached or `density` is not a
    /// positive finite number.
    pub fn new(
        host: SharedHost,
        ink: SharedInkSurface,
        viewport: Viewport,
        density: f64,
    ) -> OverlayResult<Self> {
        check_attached(&host, &ink)?;
        if !density.is_finite() || density <= 0.0 {
            return Err(OverlayError::validation(format!(
                "device pixel ratio must be finite and > 0, got {density}"
            )));
        }
        Ok(Self {
            highlight: HighlightLayer::new(host.clone(), viewport),
            text: TextLayer::new(host.clone(), viewport),
            drawing: DrawingLayer::new(ink.clone(), viewport, density),
            host,
            ink,
            page: None,
            destroyed: false,
        })
    }

    fn ensure_live(&self, op: &'static str) -> OverlayResult<()> {
        if self.destroyed {
            return Err(OverlayError::Destroyed(op));
        }
        Ok(())
    }

    /// Fail with a validation error if the overlay host or the ink surface has been detached.
    pub fn check_surfaces(&self) -> OverlayResult<()> {
        check_attached(&self.host, &self.ink)
    }

    /// Route `all` to the layers: keep annotations on `page`, partition by kind, render each
    /// layer once. Unknown kinds are dropped.
    #[tracing::instrument(skip(self, all), fields(total = all.len()))]
    pub fn set_annotations(
        &mut self,
        all: &[Annotation],
        page: u32,
    ) -> OverlayResult<RoutingSummary> {
        let summary = self.route(all, page)?;
        self.render_all()?;
        Ok(summary)
    }

    /// Propagate a new viewport and rebuild every layer.
    #[tracing::instrument(skip(self))]
    pub fn set_viewport(&mut self, viewport: Viewport) -> OverlayResult<()> {
        self.ensure_live("set_viewport")?;
        self.propagate_viewport(viewport)?;
        self.render_all()
    }

    /// Switch to a new page: viewport and annotations change together, then each layer renders
    /// exactly once.
    pub fn load_page(
        &mut self,
        viewport: Viewport,
        all: &[Annotation],
        page: u32,
    ) -> OverlayResult<RoutingSummary> {
        self.ensure_live("load_page")?;
        self.propagate_viewport(viewport)?;
        let summary = self.route(all, page)?;
        self.render_all()?;
        Ok(summary)
    }

    /// Remove every annotation from every layer, e.g. when a new document replaces the page.
    pub fn clear(&mut self) -> OverlayResult<()> {
        self.route(&[], 0)?;
        self.page = None;
        self.render_all()
    }

    /// Move every layer to time `now`. Layers are not rebuilt.
    pub fn update_timeline(&mut self, now: f64) -> OverlayResult<()> {
        self.ensure_live("update_timeline")?;
        first_error([
            ("highlight", self.highlight.update_time(now)),
            ("text", self.text.update_time(now)),
            ("drawing", self.drawing.update_time(now)),
        ])
    }

    /// Destroy all layers. Idempotent.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.highlight.destroy();
        self.text.destroy();
        self.drawing.destroy();
        self.page = None;
        self.destroyed = true;
    }

    /// Whether [`LayerOrchestrator::destroy`] has run.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Page the current annotations were filtered for.
    pub fn page(&self) -> Option<u32> {
        self.page
    }

    /// The highlight layer.
    pub fn highlight(&self) -> &HighlightLayer {
        &self.highlight
    }

    /// The text layer.
    pub fn text(&self) -> &TextLayer {
        &self.text
    }

    /// The drawing layer.
    pub fn drawing(&self) -> &DrawingLayer {
        &self.drawing
    }

    /// Annotations currently owned by the layers.
    pub fn annotation_count(&self) -> usize {
        self.highlight.state().annotations().len()
            + self.text.state().annotations().len()
            + self.drawing.state().annotations().len()
    }

    /// Annotations whose window has started at the layers' current time.
    pub fn visible_count(&self) -> usize {
        let h = self.highlight.state();
        let t = self.text.state();
        let d = self.drawing.state();
        h.annotations()
            .iter()
            .filter(|a| h.current_time() >= a.start)
            .count()
            + t.annotations()
                .iter()
                .filter(|a| t.current_time() >= a.start)
                .count()
            + d.annotations()
                .iter()
                .filter(|a| d.current_time() >= a.start)
                .count()
    }

    fn propagate_viewport(&mut self, viewport: Viewport) -> OverlayResult<()> {
        self.highlight.set_viewport(viewport)?;
        self.text.set_viewport(viewport)?;
        self.drawing.set_viewport(viewport)
    }

    fn route(&mut self, all: &[Annotation], page: u32) -> OverlayResult<RoutingSummary> {
        self.ensure_live("set_annotations")?;
        let mut summary = RoutingSummary::default();
        let mut highlights = Vec::new();
        let mut texts = Vec::new();
        let mut inks = Vec::new();
        for annotation in all {
            if annotation.page().is_some_and(|p| p != page) {
                summary.other_pages += 1;
                continue;
            }
            match annotation {
                Annotation::Highlight(a) => highlights.push(a.clone()),
                Annotation::Text(a) => texts.push(a.clone()),
                Annotation::Ink(a) => inks.push(a.clone()),
                Annotation::Unknown => summary.unknown += 1,
            }
        }
        summary.highlights = highlights.len();
        summary.texts = texts.len();
        summary.inks = inks.len();
        if summary.unknown > 0 {
            tracing::warn!(count = summary.unknown, "dropped annotations of unknown kind");
        }

        self.highlight.set_annotations(highlights)?;
        self.text.set_annotations(texts)?;
        self.drawing.set_annotations(inks)?;
        self.page = Some(page);
        Ok(summary)
    }

    fn render_all(&mut self) -> OverlayResult<()> {
        first_error([
            ("highlight", self.highlight.render()),
            ("text", self.text.render()),
            ("drawing", self.drawing.render()),
        ])
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/orchestrator.rs"]
mod tests;
