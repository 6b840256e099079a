use std::{cell::RefCell, rc::Rc};

use crate::{
    annotation::model::{Annotation, AnnotationSet},
    engine::config::EngineConfig,
    foundation::core::Viewport,
    foundation::error::{OverlayError, OverlayResult},
    layers::orchestrator::{LayerOrchestrator, RoutingSummary},
    overlay::host::SharedHost,
    overlay::ink::SharedInkSurface,
    render::backend::{DocumentBackend, DocumentLocator},
    render::page_renderer::{PageRenderer, RenderOutcome},
    timeline::clock::{Clock, SubscriptionId},
    timeline::frame::FrameScheduler,
};

/// Callbacks a host UI receives from the [`Engine`]. All default to no-ops.
pub trait EngineObserver {
    /// A document finished loading.
    fn on_load(&self, page_count: u32) {
        let _ = page_count;
    }

    /// An engine operation failed. The engine itself stays usable.
    fn on_error(&self, error: &OverlayError) {
        let _ = error;
    }

    /// A different page is now displayed.
    fn on_page_change(&self, page: u32) {
        let _ = page;
    }
}

/// Observer that ignores every callback.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}

/// Surfaces the host hands to [`Engine::new`].
pub struct EngineSurfaces<T> {
    /// Where page content is rendered.
    pub page_target: T,
    /// Container for highlight and text elements.
    pub host: SharedHost,
    /// Pixel surface for ink.
    pub ink: SharedInkSurface,
}

/// Point-in-time summary of an [`Engine`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct EngineState {
    /// Pages in the loaded document, `0` if none.
    pub page_count: u32,
    /// Page currently displayed.
    pub current_page: Option<u32>,
    /// Zoom of the displayed page (or the configured initial zoom).
    pub scale: f64,
    /// Clock time in seconds.
    pub current_time: f64,
    /// Viewport of the displayed page.
    pub viewport: Option<Viewport>,
    /// Annotations stored on the engine, all pages.
    pub annotation_count: usize,
    /// Annotations on the current page whose window has started.
    pub visible_annotation_count: usize,
    /// Whether continuous sync is running.
    pub continuous: bool,
}

struct Session {
    page: Option<u32>,
    scale: f64,
    viewport: Option<Viewport>,
    annotations: Rc<[Annotation]>,
    destroyed: bool,
}

/// Facade over page rendering, the clock and the overlay layers.
///
/// Every fallible operation returns an [`OverlayResult`] and also forwards the error to
/// [`EngineObserver::on_error`]. A failed operation leaves the previous page, viewport and
/// annotations in place.
pub struct Engine<B: DocumentBackend> {
    config: EngineConfig,
    renderer: PageRenderer<B>,
    clock: Clock,
    orchestrator: Rc<RefCell<LayerOrchestrator>>,
    target: RefCell<B::Target>,
    session: RefCell<Session>,
    observer: Rc<dyn EngineObserver>,
    frames: Option<Rc<dyn FrameScheduler>>,
    subscription: SubscriptionId,
}

impl<B: DocumentBackend> Engine<B> {
    /// Build an engine. Configuration and surfaces are validated here and fail fast.
    pub fn new(
        backend: B,
        surfaces: EngineSurfaces<B::Target>,
        config: EngineConfig,
    ) -> OverlayResult<Self> {
        config.validate()?;
        let EngineSurfaces {
            page_target,
            host,
            ink,
        } = surfaces;
        let orchestrator = Rc::new(RefCell::new(LayerOrchestrator::new(
            host,
            ink,
            Viewport::empty(config.initial_scale),
            config.device_pixel_ratio,
        )?));

        let clock = Clock::new();
        let weak = Rc::downgrade(&orchestrator);
        let subscription = clock.subscribe(move |t| {
            let Some(orchestrator) = weak.upgrade() else {
                return Ok(());
            };
            let Ok(mut orchestrator) = orchestrator.try_borrow_mut() else {
                anyhow::bail!("layers are busy; time {t} skipped");
            };
            orchestrator.update_timeline(t)?;
            Ok(())
        });

        Ok(Self {
            renderer: PageRenderer::new(backend),
            clock,
            orchestrator,
            target: RefCell::new(page_target),
            session: RefCell::new(Session {
                page: None,
                scale: config.initial_scale,
                viewport: None,
                annotations: Rc::from(Vec::new()),
                destroyed: false,
            }),
            observer: Rc::new(NoopObserver),
            frames: None,
            subscription,
            config,
        })
    }

    /// Replace the observer.
    pub fn with_observer(mut self, observer: Rc<dyn EngineObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Provide the animation-frame source used by continuous sync.
    pub fn with_frame_scheduler(mut self, frames: Rc<dyn FrameScheduler>) -> Self {
        self.frames = Some(frames);
        self
    }

    /// The validated configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The engine's clock.
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// The page renderer.
    pub fn renderer(&self) -> &PageRenderer<B> {
        &self.renderer
    }

    /// The page render target.
    pub fn page_target(&self) -> &RefCell<B::Target> {
        &self.target
    }

    fn report<T>(&self, result: OverlayResult<T>) -> OverlayResult<T> {
        if let Err(err) = &result {
            self.observer.on_error(err);
        }
        result
    }

    fn ensure_live(&self, op: &'static str) -> OverlayResult<()> {
        if self.session.borrow().destroyed {
            return Err(OverlayError::Destroyed(op));
        }
        Ok(())
    }

    /// Load a document and display the configured initial page.
    #[tracing::instrument(skip(self, locator))]
    pub async fn load_document(&self, locator: impl Into<DocumentLocator>) -> OverlayResult<u32> {
        let locator = locator.into();
        let result = self.load_inner(&locator).await;
        self.report(result)
    }

    async fn load_inner(&self, locator: &DocumentLocator) -> OverlayResult<u32> {
        self.ensure_live("load_document")?;
        self.orchestrator.borrow().check_surfaces()?;
        let page_count = self.renderer.load_document(locator).await?;
        {
            let mut s = self.session.borrow_mut();
            s.page = None;
            s.viewport = None;
        }
        self.orchestrator.borrow_mut().clear()?;
        tracing::info!(%locator, page_count, "document loaded");
        self.observer.on_load(page_count);
        if page_count > 0 {
            let first = self.config.initial_page.min(page_count);
            let scale = self.session.borrow().scale;
            self.show_page(first, scale).await?;
        }
        Ok(page_count)
    }

    /// Render page `page` (1-indexed) at the current zoom and lay the overlays out on it.
    ///
    /// Resolves to [`RenderOutcome::Cancelled`] if a later navigation superseded it; the
    /// displayed page is then whatever the later call produced.
    #[tracing::instrument(skip(self))]
    pub async fn set_page(&self, page: u32) -> OverlayResult<RenderOutcome> {
        let result = async {
            self.ensure_live("set_page")?;
            let scale = self.session.borrow().scale;
            self.show_page(page, scale).await
        }
        .await;
        self.report(result)
    }

    /// Re-render the current page at `scale`. `Ok(None)` if no page is displayed yet.
    #[tracing::instrument(skip(self))]
    pub async fn set_scale(&self, scale: f64) -> OverlayResult<Option<RenderOutcome>> {
        let result = async {
            self.ensure_live("set_scale")?;
            self.config.check_scale(scale)?;
            let page = self.session.borrow().page;
            match page {
                Some(page) => self.show_page(page, scale).await.map(Some),
                None => {
                    self.session.borrow_mut().scale = scale;
                    Ok(None)
                }
            }
        }
        .await;
        self.report(result)
    }

    /// Display the page after the current one.
    pub async fn next_page(&self) -> OverlayResult<RenderOutcome> {
        let target = self.neighbour(1);
        match target {
            Ok(page) => self.set_page(page).await,
            Err(err) => self.report(Err(err)),
        }
    }

    /// Display the page before the current one.
    pub async fn prev_page(&self) -> OverlayResult<RenderOutcome> {
        let target = self.neighbour(-1);
        match target {
            Ok(page) => self.set_page(page).await,
            Err(err) => self.report(Err(err)),
        }
    }

    fn neighbour(&self, step: i64) -> OverlayResult<u32> {
        self.ensure_live("navigate")?;
        let Some(current) = self.session.borrow().page else {
            return Err(OverlayError::validation("no page is displayed"));
        };
        let next = i64::from(current) + step;
        let count = i64::from(self.renderer.page_count());
        if next < 1 || next > count {
            return Err(OverlayError::validation(format!(
                "no page {next}; document has {count} pages"
            )));
        }
        Ok(next as u32)
    }

    async fn show_page(&self, page: u32, scale: f64) -> OverlayResult<RenderOutcome> {
        self.orchestrator.borrow().check_surfaces()?;
        let outcome = self.renderer.render_page(page, &self.target, scale).await?;
        let RenderOutcome::Rendered(viewport) = outcome else {
            return Ok(outcome);
        };
        let annotations = self.session.borrow().annotations.clone();
        let loaded = self
            .orchestrator
            .borrow_mut()
            .load_page(viewport, &annotations, page);
        if let Err(err) = loaded {
            self.restore_page().await;
            return Err(err);
        }

        let previous = {
            let mut s = self.session.borrow_mut();
            s.scale = scale;
            s.viewport = Some(viewport);
            s.page.replace(page)
        };
        if previous != Some(page) {
            self.observer.on_page_change(page);
        }
        Ok(outcome)
    }

    /// Bring the page target and the overlays back to the committed session state.
    async fn restore_page(&self) {
        let (page, scale, viewport, annotations) = {
            let s = self.session.borrow();
            (s.page, s.scale, s.viewport, s.annotations.clone())
        };
        let restored = match (page, viewport) {
            (Some(page), Some(viewport)) => {
                match self.renderer.render_page(page, &self.target, scale).await {
                    Ok(RenderOutcome::Rendered(_)) => self
                        .orchestrator
                        .borrow_mut()
                        .load_page(viewport, &annotations, page)
                        .map(drop),
                    Ok(RenderOutcome::Cancelled) => Ok(()),
                    Err(err) => Err(err),
                }
            }
            _ => self.orchestrator.borrow_mut().clear(),
        };
        if let Err(err) = restored {
            tracing::warn!(error = %err, "could not restore the previous page");
        }
    }

    /// Replace all annotations and re-route the current page's share to the layers.
    ///
    /// The set is validated first. An invalid set or a detached surface changes nothing.
    #[tracing::instrument(skip(self, annotations))]
    pub fn set_annotations(
        &self,
        annotations: impl Into<AnnotationSet>,
    ) -> OverlayResult<RoutingSummary> {
        let annotations = annotations.into();
        let result = self.set_annotations_inner(annotations);
        self.report(result)
    }

    fn set_annotations_inner(&self, annotations: AnnotationSet) -> OverlayResult<RoutingSummary> {
        self.ensure_live("set_annotations")?;
        annotations.validate()?;
        let annotations: Rc<[Annotation]> = Rc::from(annotations.as_slice());
        let page = self.session.borrow().page;
        let summary = match page {
            Some(page) => {
                let mut orchestrator = self.orchestrator.borrow_mut();
                orchestrator.check_surfaces()?;
                match orchestrator.set_annotations(&annotations, page) {
                    Ok(summary) => summary,
                    Err(err) => {
                        let previous = self.session.borrow().annotations.clone();
                        if let Err(restore) = orchestrator.set_annotations(&previous, page) {
                            tracing::warn!(error = %restore, "could not restore previous annotations");
                        }
                        return Err(err);
                    }
                }
            }
            None => RoutingSummary::default(),
        };
        self.session.borrow_mut().annotations = annotations;
        Ok(summary)
    }

    /// Move the clock to `t` seconds; layers update synchronously.
    pub fn set_time(&self, t: f64) -> OverlayResult<()> {
        let result = self.ensure_live("set_time").and_then(|()| {
            if !t.is_finite() {
                return Err(OverlayError::validation(format!(
                    "time must be finite, got {t}"
                )));
            }
            self.clock.set_time(t);
            Ok(())
        });
        self.report(result)
    }

    /// Drive the clock from `sample` once per animation frame.
    ///
    /// Returns `Ok(false)` if continuous sync was already running.
    pub fn start_continuous_sync(
        &self,
        sample: impl Fn() -> f64 + 'static,
    ) -> OverlayResult<bool> {
        let result = self.ensure_live("start_continuous_sync").and_then(|()| {
            let frames = self.frames.clone().ok_or_else(|| {
                OverlayError::validation("continuous sync needs a frame scheduler")
            })?;
            Ok(self.clock.start_continuous_sync(frames, sample))
        });
        self.report(result)
    }

    /// Stop continuous sync. Idempotent.
    pub fn stop_continuous_sync(&self) {
        self.clock.stop_continuous_sync();
    }

    /// Current state snapshot.
    pub fn state(&self) -> EngineState {
        let s = self.session.borrow();
        let visible = self
            .orchestrator
            .try_borrow()
            .map_or(0, |o| if o.is_destroyed() { 0 } else { o.visible_count() });
        EngineState {
            page_count: self.renderer.page_count(),
            current_page: s.page,
            scale: s.scale,
            current_time: self.clock.time(),
            viewport: s.viewport,
            annotation_count: s.annotations.len(),
            visible_annotation_count: visible,
            continuous: self.clock.is_continuous(),
        }
    }

    /// Tear down the renderer, clock and layers. Idempotent.
    pub fn destroy(&self) {
        {
            let mut s = self.session.borrow_mut();
            if s.destroyed {
                return;
            }
            s.destroyed = true;
            s.page = None;
            s.viewport = None;
            s.annotations = Rc::from(Vec::new());
        }
        self.renderer.destroy();
        self.clock.unsubscribe(self.subscription);
        self.clock.destroy();
        self.orchestrator.borrow_mut().destroy();
        tracing::debug!("engine destroyed");
    }

    /// Whether [`Engine::destroy`] has run.
    pub fn is_destroyed(&self) -> bool {
        self.session.borrow().destroyed
    }
}

impl<B: DocumentBackend> Drop for Engine<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/session.rs"]
mod tests;
