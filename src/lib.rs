//! Wavyte Overlay draws time-synchronized annotations on top of rendered document pages.
//!
//! Annotations (highlighted regions, typed text boxes, hand-drawn ink) reveal themselves in step
//! with an external clock, usually the playback position of narration audio or video.
//!
//! # Pipeline overview
//!
//! 1. **Load**: [`Engine::load_document`] opens a document through a [`DocumentBackend`].
//! 2. **Render**: [`Engine::set_page`] renders one page into the host's page target and derives
//!    the [`Viewport`] every overlay layer lays out against.
//! 3. **Route**: the [`LayerOrchestrator`] filters annotations to the current page and hands each
//!    kind to its layer ([`HighlightLayer`], [`TextLayer`], [`DrawingLayer`]).
//! 4. **Animate**: [`Engine::set_time`] (or continuous sync) moves the [`Clock`]; every layer
//!    recomputes its reveal state as a pure function of the current time.
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Single-threaded**: shared state is `Rc`/`RefCell`; async work is cooperative and
//!   executor-agnostic.
//! - **Time is not a delta**: the clock may jump backwards; every update is a fresh evaluation.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod annotation;
mod engine;
mod foundation;
mod layers;
mod overlay;
mod render;
mod timeline;
mod transform;

pub use annotation::model::{
    Annotation, AnnotationSet, HighlightAnnotation, InkAnnotation, InkPoint, InkStroke,
    TextAnnotation,
};
pub use engine::config::EngineConfig;
pub use engine::session::{Engine, EngineObserver, EngineState, EngineSurfaces, NoopObserver};
pub use foundation::color::Color;
pub use foundation::core::{Affine, BezPath, NormPoint, NormRect, PixelRect, Point, Viewport};
pub use foundation::error::{OverlayError, OverlayResult};
pub use layers::base::{Layer, LayerState};
pub use layers::drawing::{DrawingLayer, revealed_points};
pub use layers::highlight::{HighlightLayer, Segment, quad_segments};
pub use layers::orchestrator::{LayerOrchestrator, RoutingSummary};
pub use layers::text::{TextLayer, visible_text};
pub use overlay::host::{
    Element, ElementId, LayerKind, OverlayHost, QuadElement, SceneHost, SceneSnapshot, SharedHost,
    SnapshotEntry, TextBoxElement,
};
pub use overlay::ink::{CpuInkSurface, InkOp, InkSurface, RecordingInkSurface, SharedInkSurface};
pub use render::backend::{
    DocumentBackend, DocumentLocator, RenderTarget, RenderTask, RenderTaskError,
};
pub use render::memory::{MemoryBackend, MemoryDocument, MemoryPage, MemoryTarget, PageSize};
pub use render::page_renderer::{PageRenderer, RenderOutcome};
pub use timeline::clock::{Clock, SubscriptionId};
pub use timeline::frame::{FrameCallback, FrameHandle, FrameScheduler, ManualFrameScheduler};
pub use timeline::progress::progress;
pub use transform::coords::{point_to_absolute, rect_to_absolute};
