/// Reveal progress in `[0, 1]` of the window `[start, end]` at time `now`.
///
/// A zero-length window is a step: `0` before `start`, `1` from `start` on. That single guard
/// covers progressive reveals (`end > start`), instant reveals (`end == start`) and
/// always-visible annotations (`start == end == 0`).
#[inline]
pub fn progress(start: f64, end: f64, now: f64) -> f64 {
    let duration = end - start;
    if duration == 0.0 {
        return if now >= start { 1.0 } else { 0.0 };
    }
    let p = (now - start) / duration;
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/progress.rs"]
mod tests;
