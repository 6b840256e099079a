//! In-memory document backend: documents are lists of page sizes, renders are instant or gated.
//!
//! Used by the CLI to drive the engine without a real document library, and by tests to hold
//! renders in flight and release them deterministically.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll, Waker},
};

use crate::{
    foundation::core::Viewport,
    render::backend::{DocumentBackend, DocumentLocator, RenderTarget, RenderTask, RenderTaskError},
};

/// Page size in points at scale 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSize {
    /// Width in points.
    pub width: f64,
    /// Height in points.
    pub height: f64,
}

impl PageSize {
    /// US Letter, portrait.
    pub const LETTER: Self = Self {
        width: 612.0,
        height: 792.0,
    };

    /// Build a page size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A registered in-memory document.
#[derive(Clone, Debug)]
pub struct MemoryDocument {
    pages: Rc<[PageSize]>,
}

/// One page of a [`MemoryDocument`].
#[derive(Clone, Copy, Debug)]
pub struct MemoryPage {
    number: u32,
    size: PageSize,
}

/// Render target that records what was drawn into it.
#[derive(Clone, Debug, Default)]
pub struct MemoryTarget {
    /// Current backing width in pixels.
    pub width: u32,
    /// Current backing height in pixels.
    pub height: u32,
    /// Page number of the most recently issued render.
    pub last_page: Option<u32>,
    /// Set to `true` to simulate a surface that is detached from its window.
    pub detached: bool,
}

impl MemoryTarget {
    /// Create a zero-sized, attached target.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderTarget for MemoryTarget {
    fn is_valid(&self) -> bool {
        !self.detached
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

#[derive(Debug)]
enum TaskState {
    Pending,
    Done,
    Cancelled,
    Failed(String),
}

#[derive(Debug)]
struct TaskShared {
    state: RefCell<TaskState>,
    waker: RefCell<Option<Waker>>,
}

impl TaskShared {
    fn settle(&self, next: TaskState) {
        {
            let mut state = self.state.borrow_mut();
            if !matches!(*state, TaskState::Pending) {
                return;
            }
            *state = next;
        }
        if let Some(waker) = self.waker.borrow_mut().take() {
            waker.wake();
        }
    }
}

/// Render handle issued by [`MemoryBackend`].
#[derive(Debug)]
pub struct MemoryTask {
    shared: Rc<TaskShared>,
}

impl RenderTask for MemoryTask {
    fn cancel(&self) {
        self.shared.settle(TaskState::Cancelled);
    }

    fn completion(&self) -> impl Future<Output = Result<(), RenderTaskError>> {
        TaskCompletion {
            shared: self.shared.clone(),
        }
    }
}

struct TaskCompletion {
    shared: Rc<TaskShared>,
}

impl Future for TaskCompletion {
    type Output = Result<(), RenderTaskError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &*self.shared.state.borrow() {
            TaskState::Pending => {}
            TaskState::Done => return Poll::Ready(Ok(())),
            TaskState::Cancelled => return Poll::Ready(Err(RenderTaskError::Cancelled)),
            TaskState::Failed(msg) => {
                return Poll::Ready(Err(RenderTaskError::Failed(anyhow::anyhow!(
                    msg.clone()
                ))));
            }
        }
        *self.shared.waker.borrow_mut() = Some(cx.waker().clone());
        Poll::Pending
    }
}

#[derive(Default)]
struct MemoryInner {
    documents: RefCell<HashMap<DocumentLocator, MemoryDocument>>,
    gated: Cell<bool>,
    in_flight: RefCell<Vec<Rc<TaskShared>>>,
    fail_next_render: RefCell<Option<String>>,
    renders_issued: Cell<usize>,
}

/// Document backend over registered page-size lists. Cloning shares the registry.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Rc<MemoryInner>,
}

impl MemoryBackend {
    /// Create a backend with no documents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document under `locator`.
    pub fn with_document(self, locator: impl Into<DocumentLocator>, pages: Vec<PageSize>) -> Self {
        self.inner.documents.borrow_mut().insert(
            locator.into(),
            MemoryDocument {
                pages: pages.into(),
            },
        );
        self
    }

    /// While gated, issued renders stay pending until [`MemoryBackend::release_renders`].
    pub fn set_gated(&self, gated: bool) {
        self.inner.gated.set(gated);
    }

    /// Complete every pending render.
    pub fn release_renders(&self) -> usize {
        let tasks = std::mem::take(&mut *self.inner.in_flight.borrow_mut());
        let n = tasks.len();
        for task in tasks {
            task.settle(TaskState::Done);
        }
        n
    }

    /// Make the next issued render fail with `message`.
    pub fn fail_next_render(&self, message: impl Into<String>) {
        *self.inner.fail_next_render.borrow_mut() = Some(message.into());
    }

    /// Total renders issued so far.
    pub fn renders_issued(&self) -> usize {
        self.inner.renders_issued.get()
    }
}

impl DocumentBackend for MemoryBackend {
    type Document = MemoryDocument;
    type Page = MemoryPage;
    type Target = MemoryTarget;
    type Task = MemoryTask;

    fn open(
        &self,
        locator: &DocumentLocator,
    ) -> impl Future<Output = anyhow::Result<Self::Document>> {
        let found = self.inner.documents.borrow().get(locator).cloned();
        let locator = locator.to_string();
        std::future::ready(found.ok_or_else(|| anyhow::anyhow!("no document at '{locator}'")))
    }

    fn page_count(&self, document: &Self::Document) -> u32 {
        u32::try_from(document.pages.len()).unwrap_or(u32::MAX)
    }

    fn page(
        &self,
        document: &Self::Document,
        number: u32,
    ) -> impl Future<Output = anyhow::Result<Self::Page>> {
        let page = number
            .checked_sub(1)
            .and_then(|i| document.pages.get(i as usize))
            .map(|&size| MemoryPage { number, size })
            .ok_or_else(|| anyhow::anyhow!("page {number} does not exist"));
        std::future::ready(page)
    }

    fn viewport(&self, page: &Self::Page, scale: f64) -> Viewport {
        Viewport {
            width: page.size.width * scale,
            height: page.size.height * scale,
            scale,
        }
    }

    fn render(
        &self,
        page: &Self::Page,
        target: &mut Self::Target,
        _viewport: &Viewport,
    ) -> anyhow::Result<Self::Task> {
        self.inner
            .renders_issued
            .set(self.inner.renders_issued.get() + 1);
        target.last_page = Some(page.number);

        let initial = match self.inner.fail_next_render.borrow_mut().take() {
            Some(msg) => TaskState::Failed(msg),
            None if self.inner.gated.get() => TaskState::Pending,
            None => TaskState::Done,
        };
        let pending = matches!(initial, TaskState::Pending);
        let shared = Rc::new(TaskShared {
            state: RefCell::new(initial),
            waker: RefCell::new(None),
        });
        if pending {
            self.inner.in_flight.borrow_mut().push(shared.clone());
        }
        Ok(MemoryTask { shared })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/memory.rs"]
mod tests;
