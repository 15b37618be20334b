use std::time::{Duration, Instant};

/// Run `f` once and report how long it took.
pub fn timed<T>(label: &str, f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let value = f();
    let elapsed = start.elapsed();
    tracing::info!("{} took {:.3}s", label, elapsed.as_secs_f64());
    (value, elapsed)
}
