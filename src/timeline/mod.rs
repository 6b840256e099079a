//! Time source, frame scheduling, and the shared reveal-progress rule.

pub(crate) mod clock;
pub(crate) mod frame;
pub(crate) mod progress;
