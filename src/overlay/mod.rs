//! Seams between overlay layers and whatever actually displays them.

pub(crate) mod host;
pub(crate) mod ink;
