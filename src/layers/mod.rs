//! Time-driven overlay layers and the orchestrator that routes annotations to them.

pub(crate) mod base;
pub(crate) mod drawing;
pub(crate) mod highlight;
pub(crate) mod orchestrator;
pub(crate) mod text;
