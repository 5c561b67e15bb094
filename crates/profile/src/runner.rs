//! Wall-clock benchmark runner.
//!
//! Deliberately simple: warm up for a fixed window, then count iterations
//! for a fixed window. Variant choice only needs a stable ordering between
//! implementations of the same operation on the same data, not
//! publication-grade statistics.

use core::time::Duration;
use std::time::Instant;

/// Default warmup duration.
const DEFAULT_WARMUP_MS: u64 = 100;

/// Default measurement duration.
const DEFAULT_MEASURE_MS: u64 = 250;

/// Quick mode durations (faster, noisier).
const QUICK_WARMUP_MS: u64 = 10;
const QUICK_MEASURE_MS: u64 = 25;

/// One measured variant.
#[derive(Clone, Debug)]
pub struct BenchResult {
  pub impl_name: &'static str,
  pub iterations: u64,
  pub elapsed: Duration,
  /// Bytes of output produced per second.
  pub throughput: f64,
}

/// Benchmark runner configuration.
#[derive(Clone, Debug)]
pub struct BenchRunner {
  warmup: Duration,
  measure: Duration,
}

impl Default for BenchRunner {
  fn default() -> Self {
    Self {
      warmup: Duration::from_millis(DEFAULT_WARMUP_MS),
      measure: Duration::from_millis(DEFAULT_MEASURE_MS),
    }
  }
}

impl BenchRunner {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Quick mode settings, for tests and smoke runs.
  #[must_use]
  pub fn quick() -> Self {
    Self {
      warmup: Duration::from_millis(QUICK_WARMUP_MS),
      measure: Duration::from_millis(QUICK_MEASURE_MS),
    }
  }

  /// Set warmup duration.
  #[must_use]
  pub fn with_warmup(mut self, warmup: Duration) -> Self {
    self.warmup = warmup;
    self
  }

  /// Set measurement duration.
  #[must_use]
  pub fn with_measure(mut self, measure: Duration) -> Self {
    self.measure = measure;
    self
  }

  /// Time `work` and report throughput in terms of `bytes_per_iter`.
  pub fn run<F: FnMut()>(&self, impl_name: &'static str, bytes_per_iter: u64, mut work: F) -> BenchResult {
    let warm_until = Instant::now() + self.warmup;
    while Instant::now() < warm_until {
      work();
    }

    let start = Instant::now();
    let stop = start + self.measure;
    let mut iterations = 0u64;
    while Instant::now() < stop {
      work();
      iterations += 1;
    }
    let elapsed = start.elapsed();

    let secs = elapsed.as_secs_f64().max(f64::MIN_POSITIVE);
    BenchResult {
      impl_name,
      iterations,
      elapsed,
      throughput: (iterations.saturating_mul(bytes_per_iter)) as f64 / secs,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn run_counts_iterations_and_time() {
    let runner = BenchRunner::quick();
    let mut calls = 0u64;
    let result = runner.run("noop", 64, || calls += 1);

    assert_eq!(result.impl_name, "noop");
    assert!(result.iterations > 0);
    assert!(calls >= result.iterations);
    assert!(result.elapsed >= Duration::from_millis(QUICK_MEASURE_MS));
    assert!(result.throughput > 0.0);
  }
}
