use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::{
    foundation::core::Viewport,
    foundation::error::{OverlayError, OverlayResult},
    render::backend::{DocumentBackend, DocumentLocator, RenderTarget, RenderTask, RenderTaskError},
};

/// Result of a render that did not fail.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RenderOutcome {
    /// The page is on the target; overlays should lay out against this viewport.
    Rendered(Viewport),
    /// A newer render (or [`PageRenderer::cancel_render`]) superseded this one. Expected and
    /// harmless: nothing should be reported to the user.
    Cancelled,
}

impl RenderOutcome {
    /// The produced viewport, if the render completed.
    pub fn viewport(&self) -> Option<Viewport> {
        match self {
            Self::Rendered(vp) => Some(*vp),
            Self::Cancelled => None,
        }
    }
}

/// Per-call cancellation flag. Each render owns its own token so that a stale completion can
/// never cancel, or be mistaken for, a newer render.
#[derive(Clone, Debug)]
struct RenderToken {
    id: u64,
    cancelled: Rc<Cell<bool>>,
}

impl RenderToken {
    fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

struct ActiveRender<T> {
    token: RenderToken,
    task: Option<Rc<T>>,
}

struct RendererState<B: DocumentBackend> {
    document: Option<Rc<B::Document>>,
    page_count: u32,
    active: Option<ActiveRender<B::Task>>,
    load_generation: u64,
    destroyed: bool,
}

/// Loads a document and renders its pages, keeping at most one render in flight.
pub struct PageRenderer<B: DocumentBackend> {
    backend: B,
    state: RefCell<RendererState<B>>,
    next_token: Cell<u64>,
}

impl<B: DocumentBackend> PageRenderer<B> {
    /// Wrap a document backend.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: RefCell::new(RendererState {
                document: None,
                page_count: 0,
                active: None,
                load_generation: 0,
                destroyed: false,
            }),
            next_token: Cell::new(1),
        }
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Page count of the loaded document, `0` if none is loaded.
    pub fn page_count(&self) -> u32 {
        self.state.borrow().page_count
    }

    /// Whether a document is loaded.
    pub fn has_document(&self) -> bool {
        self.state.borrow().document.is_some()
    }

    /// Whether a render is currently in flight.
    pub fn is_rendering(&self) -> bool {
        self.state.borrow().active.is_some()
    }

    fn ensure_live(&self, op: &'static str) -> OverlayResult<()> {
        if self.state.borrow().destroyed {
            return Err(OverlayError::Destroyed(op));
        }
        Ok(())
    }

    /// Open a document and return its page count.
    ///
    /// Any in-flight render is cancelled first. On failure the previously loaded document (if
    /// any) stays loaded.
    #[tracing::instrument(skip(self))]
    pub async fn load_document(&self, locator: &DocumentLocator) -> OverlayResult<u32> {
        self.ensure_live("load_document")?;
        self.cancel_render();

        let generation = {
            let mut s = self.state.borrow_mut();
            s.load_generation += 1;
            s.load_generation
        };

        let opened = self.backend.open(locator).await;

        let mut s = self.state.borrow_mut();
        if s.destroyed {
            return Err(OverlayError::Destroyed("load_document"));
        }
        if s.load_generation != generation {
            return Err(OverlayError::load(format!(
                "load of '{locator}' was superseded by a newer load"
            )));
        }
        match opened {
            Ok(document) => {
                let page_count = self.backend.page_count(&document);
                s.document = Some(Rc::new(document));
                s.page_count = page_count;
                tracing::debug!(page_count, "document loaded");
                Ok(page_count)
            }
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "document load failed");
                Err(OverlayError::load(format!("failed to open '{locator}': {err:#}")))
            }
        }
    }

    /// Render 1-indexed `page_number` at `scale` into `target`.
    ///
    /// Cancels any in-flight render before starting. If this render is itself superseded while
    /// awaiting, it resolves to [`RenderOutcome::Cancelled`] whatever the library reports.
    /// Validation failures return before any state is touched.
    #[tracing::instrument(skip(self, target))]
    pub async fn render_page(
        &self,
        page_number: u32,
        target: &RefCell<B::Target>,
        scale: f64,
    ) -> OverlayResult<RenderOutcome> {
        self.ensure_live("render_page")?;
        let document = {
            let s = self.state.borrow();
            let Some(document) = s.document.clone() else {
                return Err(OverlayError::validation("no document loaded"));
            };
            if page_number == 0 || page_number > s.page_count {
                return Err(OverlayError::validation(format!(
                    "page {page_number} is out of range 1..={}",
                    s.page_count
                )));
            }
            document
        };
        if !scale.is_finite() || scale <= 0.0 {
            return Err(OverlayError::validation(format!(
                "scale must be finite and > 0, got {scale}"
            )));
        }
        match target.try_borrow() {
            Ok(t) if t.is_valid() => {}
            Ok(_) => return Err(OverlayError::validation("render target is not valid")),
            Err(_) => return Err(OverlayError::validation("render target is in use")),
        }

        self.cancel_render();
        let token = self.begin();

        let page = match self.backend.page(&document, page_number).await {
            Ok(page) => page,
            Err(err) => {
                self.finish(&token);
                if token.is_cancelled() {
                    return Ok(RenderOutcome::Cancelled);
                }
                return Err(OverlayError::render(format!(
                    "failed to fetch page {page_number}: {err:#}"
                )));
            }
        };
        if token.is_cancelled() {
            tracing::debug!(page_number, "render superseded while fetching page");
            return Ok(RenderOutcome::Cancelled);
        }

        let viewport = self.backend.viewport(&page, scale);
        let issued = {
            let Ok(mut target) = target.try_borrow_mut() else {
                self.finish(&token);
                return Err(OverlayError::render("render target is in use"));
            };
            let (width, height) = viewport.device_size(1.0);
            target.resize(width, height);
            self.backend.render(&page, &mut target, &viewport)
        };
        let task = match issued {
            Ok(task) => Rc::new(task),
            Err(err) => {
                self.finish(&token);
                tracing::error!(page_number, error = %format!("{err:#}"), "render failed to start");
                return Err(OverlayError::render(format!(
                    "page {page_number}: {err:#}"
                )));
            }
        };
        self.attach(&token, task.clone());

        let completed = task.completion().await;
        self.finish(&token);

        if token.is_cancelled() {
            tracing::debug!(page_number, "render cancelled");
            return Ok(RenderOutcome::Cancelled);
        }
        match completed {
            Ok(()) => Ok(RenderOutcome::Rendered(viewport)),
            Err(RenderTaskError::Cancelled) => {
                tracing::debug!(page_number, "render cancelled by the library");
                Ok(RenderOutcome::Cancelled)
            }
            Err(RenderTaskError::Failed(err)) => {
                tracing::error!(page_number, error = %format!("{err:#}"), "render failed");
                Err(OverlayError::render(format!("page {page_number}: {err:#}")))
            }
        }
    }

    /// Cancel the in-flight render, if any. Idempotent.
    pub fn cancel_render(&self) {
        let active = self.state.borrow_mut().active.take();
        if let Some(active) = active {
            active.token.cancelled.set(true);
            if let Some(task) = active.task {
                task.cancel();
            }
            tracing::debug!(token = active.token.id, "cancelled in-flight render");
        }
    }

    /// Cancel rendering and drop the document. Idempotent.
    pub fn destroy(&self) {
        self.cancel_render();
        let mut s = self.state.borrow_mut();
        s.document = None;
        s.page_count = 0;
        s.destroyed = true;
    }

    fn begin(&self) -> RenderToken {
        let id = self.next_token.get();
        self.next_token.set(id + 1);
        let token = RenderToken {
            id,
            cancelled: Rc::new(Cell::new(false)),
        };
        self.state.borrow_mut().active = Some(ActiveRender {
            token: token.clone(),
            task: None,
        });
        token
    }

    fn attach(&self, token: &RenderToken, task: Rc<B::Task>) {
        let mut s = self.state.borrow_mut();
        match s.active.as_mut() {
            Some(active) if active.token.id == token.id => active.task = Some(task),
            _ => task.cancel(),
        }
    }

    fn finish(&self, token: &RenderToken) {
        let mut s = self.state.borrow_mut();
        if s
            .active
            .as_ref()
            .is_some_and(|active| active.token.id == token.id)
        {
            s.active = None;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/page_renderer.rs"]
mod tests;
