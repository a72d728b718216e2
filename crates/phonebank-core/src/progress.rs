//! Progress reporting for long-running operations.

/// Receives `(percentage, status)` updates. Purely observational: a sink
/// cannot slow down or cancel the operation reporting to it.
pub trait ProgressSink {
  /// `percent` is in `0.0..=100.0`.
  fn update(&self, percent: f64, status: &str);
}

/// A sink that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
  fn update(&self, _percent: f64, _status: &str) {}
}

impl<F> ProgressSink for F
where
  F: Fn(f64, &str),
{
  fn update(&self, percent: f64, status: &str) { self(percent, status) }
}

/// Map `done` of `total` onto the band `[start, start + width]`.
pub fn scaled(start: f64, width: f64, done: usize, total: usize) -> f64 {
  if total == 0 {
    return start + width;
  }
  start + width * (done as f64 / total as f64)
}
