//! Normalized-to-viewport coordinate helpers.

pub(crate) mod coords;
