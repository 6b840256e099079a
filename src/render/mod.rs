//! Document loading and page rendering against a pluggable document library.

pub(crate) mod backend;
pub(crate) mod memory;
pub(crate) mod page_renderer;
