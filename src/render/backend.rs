use std::{fmt, future::Future, path::PathBuf, sync::Arc};

use crate::foundation::core::Viewport;

/// Where a document comes from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DocumentLocator {
    /// Local file path.
    Path(PathBuf),
    /// Remote URL, resolved by the backend.
    Url(String),
    /// Document bytes already in memory.
    Bytes(Arc<[u8]>),
}

impl fmt::Display for DocumentLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Url(u) => f.write_str(u),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<&str> for DocumentLocator {
    fn from(s: &str) -> Self {
        if s.contains("://") {
            Self::Url(s.to_owned())
        } else {
            Self::Path(PathBuf::from(s))
        }
    }
}

impl From<PathBuf> for DocumentLocator {
    fn from(p: PathBuf) -> Self {
        Self::Path(p)
    }
}

impl From<Vec<u8>> for DocumentLocator {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes.into())
    }
}

/// Surface a page is rendered into (a canvas, a texture, a pixmap).
pub trait RenderTarget {
    /// Whether the surface can currently be drawn to, e.g. still attached to its window.
    fn is_valid(&self) -> bool {
        true
    }

    /// Resize the backing store to `width` x `height` pixels.
    fn resize(&mut self, width: u32, height: u32);
}

/// How an in-flight render ended when it did not succeed.
#[derive(Debug)]
pub enum RenderTaskError {
    /// [`RenderTask::cancel`] was called before the render finished.
    Cancelled,
    /// The library failed to render.
    Failed(anyhow::Error),
}

/// One issued page render.
pub trait RenderTask {
    /// Ask the library to stop. Cooperative: the completion future then resolves to
    /// [`RenderTaskError::Cancelled`] once the library notices.
    fn cancel(&self);

    /// Resolves when the render finishes, fails, or is cancelled.
    fn completion(&self) -> impl Future<Output = Result<(), RenderTaskError>>;
}

/// The external document library: open, fetch pages, compute viewports, render.
///
/// Everything behind this trait is a black box to the overlay engine.
pub trait DocumentBackend {
    /// An opened document.
    type Document;
    /// One page of a document.
    type Page;
    /// Surface type pages render into.
    type Target: RenderTarget;
    /// Handle for an issued render.
    type Task: RenderTask;

    /// Open and parse the document at `locator`.
    fn open(
        &self,
        locator: &DocumentLocator,
    ) -> impl Future<Output = anyhow::Result<Self::Document>>;

    /// Page count of an opened document.
    fn page_count(&self, document: &Self::Document) -> u32;

    /// Fetch 1-indexed page `number`.
    fn page(
        &self,
        document: &Self::Document,
        number: u32,
    ) -> impl Future<Output = anyhow::Result<Self::Page>>;

    /// Viewport of `page` rendered at `scale`.
    fn viewport(&self, page: &Self::Page, scale: f64) -> Viewport;

    /// Start rendering `page` into `target`. The target has already been resized to `viewport`.
    fn render(
        &self,
        page: &Self::Page,
        target: &mut Self::Target,
        viewport: &Viewport,
    ) -> anyhow::Result<Self::Task>;
}
