//! Wall-clock measurement of one benchmark iteration.

use std::time::Instant;

/// Run `f` and return its output with the elapsed wall time in seconds.
///
/// The clock covers `f` only; callers reset device state before and read
/// results back after, outside the timed window.
pub fn time_secs<R>(f: impl FnOnce() -> R) -> (R, f64) {
    let start = Instant::now();
    let out = f();
    (out, start.elapsed().as_secs_f64())
}
