//! The engine facade and its configuration.

pub(crate) mod config;
pub(crate) mod session;
