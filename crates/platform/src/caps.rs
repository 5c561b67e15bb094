//! Extension tokens, capability bitsets, and the preference order.
//!
//! This module answers two questions:
//!
//! - "What instruction-set extensions can I legally use on this machine?"
//!   ([`ExtSet`] inside a [`CapabilitySet`])
//! - "Given two extensions, which one do I prefer?"
//!   ([`Extension::dominates`] and [`Extension::preference_weight`])
//!
//! The preference relation is a partial order, not a total one: the x86
//! vector chain is totally ordered among its own members, but extensions
//! like `Popcnt`, `Fma`, or `Neon` are incomparable with the chain and with
//! each other. Selection code breaks those ties by declaration order.

// ─────────────────────────────────────────────────────────────────────────────
// Extension tokens
// ─────────────────────────────────────────────────────────────────────────────

/// A named instruction-set extension a host may or may not support.
///
/// The discriminant doubles as the bit position inside [`ExtSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Extension {
  Sse2 = 0,
  Sse3 = 1,
  Ssse3 = 2,
  Sse41 = 3,
  Sse42 = 4,
  Avx = 5,
  Avx2 = 6,
  Avx512f = 7,
  Popcnt = 8,
  Fma = 9,
  Neon = 10,
}

impl Extension {
  /// Every extension token, in bit order.
  pub const ALL: [Self; 11] = [
    Self::Sse2,
    Self::Sse3,
    Self::Ssse3,
    Self::Sse41,
    Self::Sse42,
    Self::Avx,
    Self::Avx2,
    Self::Avx512f,
    Self::Popcnt,
    Self::Fma,
    Self::Neon,
  ];

  /// Bit mask of this extension inside an [`ExtSet`].
  #[inline]
  #[must_use]
  pub const fn bit(self) -> u32 {
    1u32 << (self as u8)
  }

  /// Human-readable token name, as persisted in profiles and reports.
  #[inline]
  #[must_use]
  pub const fn name(self) -> &'static str {
    match self {
      Self::Sse2 => "sse2",
      Self::Sse3 => "sse3",
      Self::Ssse3 => "ssse3",
      Self::Sse41 => "sse4_1",
      Self::Sse42 => "sse4_2",
      Self::Avx => "avx",
      Self::Avx2 => "avx2",
      Self::Avx512f => "avx512f",
      Self::Popcnt => "popcnt",
      Self::Fma => "fma",
      Self::Neon => "neon",
    }
  }

  /// Depth in the x86 vector-width chain, or `None` for extensions that are
  /// not a member of any chain.
  ///
  /// The chain expresses "strictly faster than" on the same host:
  /// `avx512f ≻ avx2 ≻ avx ≻ sse4_2 ≻ sse4_1 ≻ ssse3 ≻ sse3 ≻ sse2`.
  #[inline]
  const fn chain_depth(self) -> Option<u8> {
    match self {
      Self::Sse2 => Some(0),
      Self::Sse3 => Some(1),
      Self::Ssse3 => Some(2),
      Self::Sse41 => Some(3),
      Self::Sse42 => Some(4),
      Self::Avx => Some(5),
      Self::Avx2 => Some(6),
      Self::Avx512f => Some(7),
      Self::Popcnt | Self::Fma | Self::Neon => None,
    }
  }

  /// Whether `self` is strictly preferred over `other` on a host that
  /// supports both.
  ///
  /// Extensions outside a common chain are incomparable and never dominate
  /// one another.
  #[inline]
  #[must_use]
  pub const fn dominates(self, other: Self) -> bool {
    match (self.chain_depth(), other.chain_depth()) {
      (Some(a), Some(b)) => a > b,
      _ => false,
    }
  }

  /// Deterministic sort key for ranking: deeper chain members weigh more.
  ///
  /// Extensions outside any chain get the minimum non-zero weight, so a
  /// variant requiring one still outranks the generic fallback (weight 0 by
  /// convention) while staying incomparable with chain members of the same
  /// weight. Ties are broken by variant declaration order; declaration
  /// order wins ties is the documented policy, not an accident.
  #[inline]
  #[must_use]
  pub const fn preference_weight(self) -> u8 {
    match self.chain_depth() {
      Some(depth) => depth + 1,
      None => 1,
    }
  }
}

impl core::fmt::Display for Extension {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str(self.name())
  }
}

// ─────────────────────────────────────────────────────────────────────────────
// ExtSet
// ─────────────────────────────────────────────────────────────────────────────

/// A set of [`Extension`]s, stored as a bitset.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ExtSet(u32);

impl ExtSet {
  /// The empty set.
  pub const NONE: Self = Self(0);

  /// Set containing a single extension.
  #[inline]
  #[must_use]
  pub const fn only(ext: Extension) -> Self {
    Self(ext.bit())
  }

  /// Check membership.
  #[inline(always)]
  #[must_use]
  pub const fn has(self, ext: Extension) -> bool {
    self.0 & ext.bit() != 0
  }

  /// Copy with `ext` added.
  #[inline]
  #[must_use]
  pub const fn with(self, ext: Extension) -> Self {
    Self(self.0 | ext.bit())
  }

  /// Copy with `ext` removed.
  #[inline]
  #[must_use]
  pub const fn without(self, ext: Extension) -> Self {
    Self(self.0 & !ext.bit())
  }

  /// Union of two sets.
  #[inline]
  #[must_use]
  pub const fn union(self, other: Self) -> Self {
    Self(self.0 | other.0)
  }

  /// Intersection of two sets.
  #[inline]
  #[must_use]
  pub const fn intersection(self, other: Self) -> Self {
    Self(self.0 & other.0)
  }

  #[inline]
  #[must_use]
  pub const fn is_empty(self) -> bool {
    self.0 == 0
  }

  /// Number of extensions present.
  #[inline]
  #[must_use]
  pub const fn count(self) -> u32 {
    self.0.count_ones()
  }

  /// Raw bits, used by host fingerprinting.
  #[inline]
  #[must_use]
  pub const fn bits(self) -> u32 {
    self.0
  }

  /// Iterate over the members in bit order.
  pub fn iter(self) -> impl Iterator<Item = Extension> {
    Extension::ALL.into_iter().filter(move |ext| self.has(*ext))
  }
}

impl core::ops::BitOr for ExtSet {
  type Output = Self;

  #[inline]
  fn bitor(self, rhs: Self) -> Self {
    self.union(rhs)
  }
}

impl core::ops::BitOrAssign for ExtSet {
  #[inline]
  fn bitor_assign(&mut self, rhs: Self) {
    *self = self.union(rhs);
  }
}

impl core::fmt::Debug for ExtSet {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_set().entries(self.iter()).finish()
  }
}

// ─────────────────────────────────────────────────────────────────────────────
// CapabilitySet
// ─────────────────────────────────────────────────────────────────────────────

/// Alignment boundary used when no wider guarantee is detectable.
pub const DEFAULT_ALIGNMENT: usize = 16;

/// Immutable snapshot of what the host supports.
///
/// Holds the detected extensions plus the platform alignment boundary (a
/// power of two, in bytes) that aligned-only kernels assume. Computed once
/// per process by [`crate::detect()`] and shared read-only afterwards;
/// tests construct synthetic sets directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CapabilitySet {
  exts: ExtSet,
  alignment: usize,
}

impl CapabilitySet {
  /// Construct from parts. `alignment` must be a power of two.
  #[inline]
  #[must_use]
  pub const fn new(exts: ExtSet, alignment: usize) -> Self {
    debug_assert!(alignment.is_power_of_two());
    Self { exts, alignment }
  }

  /// The degraded set: no extensions, default alignment.
  ///
  /// This is what detection falls back to on unknown platforms or when the
  /// platform query is unavailable; everything still works through the
  /// generic kernels.
  #[inline]
  #[must_use]
  pub const fn minimal() -> Self {
    Self {
      exts: ExtSet::NONE,
      alignment: DEFAULT_ALIGNMENT,
    }
  }

  /// Detected extensions.
  #[inline]
  #[must_use]
  pub const fn exts(&self) -> ExtSet {
    self.exts
  }

  /// Platform alignment boundary in bytes.
  #[inline]
  #[must_use]
  pub const fn alignment(&self) -> usize {
    self.alignment
  }

  /// Check a single extension.
  #[inline(always)]
  #[must_use]
  pub const fn has(&self, ext: Extension) -> bool {
    self.exts.has(ext)
  }

  /// Check an optional requirement: `None` (no requirement) always passes.
  #[inline(always)]
  #[must_use]
  pub const fn satisfies(&self, required: Option<Extension>) -> bool {
    match required {
      None => true,
      Some(ext) => self.exts.has(ext),
    }
  }

  /// Copy with an extra extension, for simulating hosts in tests.
  #[inline]
  #[must_use]
  pub const fn with_extension(self, ext: Extension) -> Self {
    Self {
      exts: self.exts.with(ext),
      alignment: self.alignment,
    }
  }

  /// Copy with an extension removed.
  #[inline]
  #[must_use]
  pub const fn without_extension(self, ext: Extension) -> Self {
    Self {
      exts: self.exts.without(ext),
      alignment: self.alignment,
    }
  }

  /// Whether `addr` satisfies the platform alignment boundary.
  #[inline(always)]
  #[must_use]
  pub const fn is_aligned_addr(&self, addr: usize) -> bool {
    addr % self.alignment == 0
  }

  /// Whether a pointer satisfies the platform alignment boundary.
  #[inline(always)]
  #[must_use]
  pub fn is_aligned<T>(&self, ptr: *const T) -> bool {
    self.is_aligned_addr(ptr as usize)
  }
}

impl Default for CapabilitySet {
  fn default() -> Self {
    Self::minimal()
  }
}
