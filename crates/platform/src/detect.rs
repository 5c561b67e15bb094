//! Runtime capability detection.
//!
//! Detection runs at most once per process and is side-effect free; the
//! result is cached in a `OnceLock` and shared read-only afterwards.
//! Re-detection requires a process restart.
//!
//! Detection never fails. On platforms where the query is unavailable (or
//! under Miri, which does not interpret feature probes) it degrades to
//! [`CapabilitySet::minimal`] and the dispatch layer falls back to generic
//! kernels.

use std::sync::OnceLock;

use crate::caps::{CapabilitySet, ExtSet, Extension, DEFAULT_ALIGNMENT};

static DETECTED: OnceLock<CapabilitySet> = OnceLock::new();

/// Detected capabilities of the current host, memoized for the process
/// lifetime.
#[inline]
#[must_use]
pub fn detect() -> CapabilitySet {
  *DETECTED.get_or_init(detect_uncached)
}

fn detect_uncached() -> CapabilitySet {
  #[cfg(miri)]
  {
    return CapabilitySet::minimal();
  }

  #[cfg(all(target_arch = "x86_64", not(miri)))]
  {
    return detect_x86_64();
  }

  #[cfg(all(target_arch = "aarch64", not(miri)))]
  {
    return detect_aarch64();
  }

  #[allow(unreachable_code)]
  CapabilitySet::minimal()
}

#[cfg(all(target_arch = "x86_64", not(miri)))]
fn detect_x86_64() -> CapabilitySet {
  let mut exts = ExtSet::NONE;

  if std::arch::is_x86_feature_detected!("sse2") {
    exts |= ExtSet::only(Extension::Sse2);
  }
  if std::arch::is_x86_feature_detected!("sse3") {
    exts |= ExtSet::only(Extension::Sse3);
  }
  if std::arch::is_x86_feature_detected!("ssse3") {
    exts |= ExtSet::only(Extension::Ssse3);
  }
  if std::arch::is_x86_feature_detected!("sse4.1") {
    exts |= ExtSet::only(Extension::Sse41);
  }
  if std::arch::is_x86_feature_detected!("sse4.2") {
    exts |= ExtSet::only(Extension::Sse42);
  }
  if std::arch::is_x86_feature_detected!("avx") {
    exts |= ExtSet::only(Extension::Avx);
  }
  if std::arch::is_x86_feature_detected!("avx2") {
    exts |= ExtSet::only(Extension::Avx2);
  }
  if std::arch::is_x86_feature_detected!("avx512f") {
    exts |= ExtSet::only(Extension::Avx512f);
  }
  if std::arch::is_x86_feature_detected!("popcnt") {
    exts |= ExtSet::only(Extension::Popcnt);
  }
  if std::arch::is_x86_feature_detected!("fma") {
    exts |= ExtSet::only(Extension::Fma);
  }

  // The boundary tracks the widest vector register the host can load.
  let alignment = if exts.has(Extension::Avx512f) {
    64
  } else if exts.has(Extension::Avx) {
    32
  } else {
    DEFAULT_ALIGNMENT
  };

  CapabilitySet::new(exts, alignment)
}

#[cfg(all(target_arch = "aarch64", not(miri)))]
fn detect_aarch64() -> CapabilitySet {
  let mut exts = ExtSet::NONE;
  if std::arch::is_aarch64_feature_detected!("neon") {
    exts |= ExtSet::only(Extension::Neon);
  }
  CapabilitySet::new(exts, DEFAULT_ALIGNMENT)
}
