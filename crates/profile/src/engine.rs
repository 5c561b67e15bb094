//! The profiling engine: verify, time, pick.
//!
//! For each registered operation the engine first cross-checks every legal
//! variant against the generic reference, then times them all over
//! identical aligned buffers and records the fastest. The result is a plain
//! `op -> impl` mapping; persisting it is the caller's business (the
//! binary writes it through the prefs store).

use std::collections::BTreeMap;

use vlk_dispatch::{Alignment, OpEntry, Registry, select};
use vlk_platform::CapabilitySet;

use crate::buffer::{AlignedBuf, fill};
use crate::error::ProfileError;
use crate::runner::{BenchResult, BenchRunner};
use crate::verify;

/// Canonical unit count used for timing. Large enough that dispatch and
/// loop overhead stop dominating, a multiple of 64 like the verify length.
pub const BENCH_LEN: usize = 65_536;

/// Everything the engine learned about one operation.
#[derive(Debug)]
pub struct OpReport {
  pub op: &'static str,
  pub results: Vec<BenchResult>,
  pub best: &'static str,
}

/// Verification plus timing over a whole registry.
#[derive(Default)]
pub struct ProfileEngine {
  runner: BenchRunner,
}

impl ProfileEngine {
  #[must_use]
  pub fn new(runner: BenchRunner) -> Self {
    Self { runner }
  }

  /// Profile one operation. Variants run over identical inputs; aligned
  /// harness buffers make aligned-only variants legal.
  ///
  /// # Errors
  ///
  /// [`ProfileError::Mismatch`] if a variant fails verification; timing
  /// only happens after every variant checks out.
  pub fn profile_op(&self, entry: &OpEntry, caps: &CapabilitySet) -> Result<OpReport, ProfileError> {
    verify::verify_op(entry, caps)?;

    let legal = select::rank(entry.metas(), caps, Alignment::Required);
    if legal.is_empty() {
      return Err(ProfileError::NoKernels(entry.name()));
    }

    let shape = entry.shape();
    let inputs: Vec<AlignedBuf> = (0..shape.inputs)
      .map(|i| {
        let mut buf = AlignedBuf::zeroed((shape.in_bytes)(i, BENCH_LEN));
        fill(buf.as_mut_slice(), shape.fill, 0x5851_f42d + i as u64);
        buf
      })
      .collect();
    let ins: Vec<&[u8]> = inputs.iter().map(AlignedBuf::as_slice).collect();
    let out_len = (shape.out_bytes)(BENCH_LEN);

    let mut results = Vec::with_capacity(legal.len());
    for index in legal {
      let Some(puppet) = entry.puppet(index) else {
        continue;
      };
      let name = entry.metas().get(index).map_or("?", |m| m.name);
      let mut out = AlignedBuf::zeroed(out_len);
      results.push(self.runner.run(name, out_len as u64, || {
        puppet(out.as_mut_slice(), &ins, BENCH_LEN);
      }));
    }

    let best = results
      .iter()
      .max_by(|a, b| a.throughput.total_cmp(&b.throughput))
      .map(|r| r.impl_name)
      .ok_or(ProfileError::NoKernels(entry.name()))?;

    Ok(OpReport {
      op: entry.name(),
      results,
      best,
    })
  }

  /// Profile every operation in the registry.
  ///
  /// Returns the `op -> impl` mapping to persist, plus the per-op reports
  /// for display.
  ///
  /// # Errors
  ///
  /// Fails on the first operation whose variants disagree; a machine that
  /// miscomputes should not get a profile.
  pub fn run(
    &self,
    registry: &Registry,
    caps: &CapabilitySet,
  ) -> Result<(BTreeMap<String, String>, Vec<OpReport>), ProfileError> {
    let mut chosen = BTreeMap::new();
    let mut reports = Vec::with_capacity(registry.len());
    for entry in registry.iter() {
      let report = self.profile_op(entry, caps)?;
      chosen.insert(report.op.to_owned(), report.best.to_owned());
      reports.push(report);
    }
    Ok((chosen, reports))
  }
}

#[cfg(test)]
mod tests {
  use core::time::Duration;

  use super::*;

  fn quick_engine() -> ProfileEngine {
    ProfileEngine::new(
      BenchRunner::quick()
        .with_warmup(Duration::from_millis(1))
        .with_measure(Duration::from_millis(5)),
    )
  }

  #[test]
  fn engine_profiles_the_real_registry() {
    let reg = vlk_kernels::build_registry().unwrap();
    let caps = vlk_platform::detect();
    let (chosen, reports) = quick_engine().run(&reg, &caps).unwrap();

    assert_eq!(chosen.len(), reg.len());
    for report in &reports {
      assert!(!report.results.is_empty());
      assert_eq!(chosen.get(report.op).map(String::as_str), Some(report.best));
      // The pick is one of the measured variants.
      assert!(report.results.iter().any(|r| r.impl_name == report.best));
    }
  }

  #[test]
  fn minimal_host_always_picks_generic() {
    let reg = vlk_kernels::build_registry().unwrap();
    let caps = CapabilitySet::minimal();
    let (chosen, _) = quick_engine().run(&reg, &caps).unwrap();
    for (op, imp) in &chosen {
      assert_eq!(imp, "generic", "operation {op}");
    }
  }
}
