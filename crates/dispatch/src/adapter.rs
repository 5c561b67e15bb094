//! Puppet adapters: one canonical shape for every kernel signature.
//!
//! Real kernel signatures are irregular by necessity: complex versus real
//! inputs, scalar parameters, in-place variants, bit-packing operations
//! whose output is an eighth of their input. Verification and benchmarking
//! must nevertheless be uniform, so every variant registers a puppet — a
//! thin wrapper with the canonical signature
//!
//! ```text
//! fn(out: &mut [u8], ins: &[&[u8]], len: usize)
//! ```
//!
//! where `len` is always the harness-controlled canonical unit count. The
//! puppet casts the byte buffers to the native types and encodes the real
//! size relationship internally; [`CanonShape`] tells the harness how large
//! the buffers must be for a given `len` and how to compare outputs.

/// Canonical puppet signature: `(output, inputs, canonical length)`.
pub type PuppetFn = fn(&mut [u8], &[&[u8]], usize);

/// How the harness compares a variant's output against the generic
/// reference output.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CheckMode {
  /// Outputs must match byte for byte.
  Exact,
  /// Outputs are `f32` lanes; compare with the given relative tolerance.
  F32Tol(f32),
}

/// How the harness fills input buffers before driving a puppet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillMode {
  /// Arbitrary deterministic bytes.
  Bytes,
  /// `f32` lanes drawn deterministically from [-1, 1]; for kernels with a
  /// restricted numeric domain (trigonometric approximations).
  F32Unit,
}

/// Size contract of one operation in canonical units.
///
/// `in_bytes(i, len)` is the required size of input buffer `i`;
/// `out_bytes(len)` the required size of the output buffer. For an
/// element-wise byte operation both are `len`; for an 8:1 bit-packer
/// `out_bytes(len) == len / 8`.
#[derive(Clone, Copy)]
pub struct CanonShape {
  /// Number of input buffers the puppets expect.
  pub inputs: usize,
  /// Byte size of input buffer `i` for a canonical length.
  pub in_bytes: fn(usize, usize) -> usize,
  /// Byte size of the output buffer for a canonical length.
  pub out_bytes: fn(usize) -> usize,
  /// Output comparison rule.
  pub check: CheckMode,
  /// Input fill rule.
  pub fill: FillMode,
}

impl core::fmt::Debug for CanonShape {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("CanonShape")
      .field("inputs", &self.inputs)
      .field("check", &self.check)
      .field("fill", &self.fill)
      .finish()
  }
}

// ─────────────────────────────────────────────────────────────────────────────
// Byte ↔ typed reinterpretation
// ─────────────────────────────────────────────────────────────────────────────
//
// Puppets receive byte buffers and hand typed slices to the native kernels.
// The harness allocates all buffers on a 64-byte boundary with sizes that
// are multiples of the lane size, so these conversions hold by construction;
// the asserts catch misuse from hand-rolled callers.

/// Reinterpret a byte buffer as `f32` lanes.
///
/// # Panics
///
/// Panics if the buffer is not aligned to `f32` or its length is not a
/// multiple of 4.
#[must_use]
pub fn as_f32s(bytes: &[u8]) -> &[f32] {
  // SAFETY: every bit pattern is a valid f32; alignment and exact coverage
  // are asserted below.
  let (prefix, lanes, suffix) = unsafe { bytes.align_to::<f32>() };
  assert!(prefix.is_empty() && suffix.is_empty(), "buffer not f32-shaped");
  lanes
}

/// Reinterpret a mutable byte buffer as `f32` lanes.
///
/// # Panics
///
/// Panics if the buffer is not aligned to `f32` or its length is not a
/// multiple of 4.
#[must_use]
pub fn as_f32s_mut(bytes: &mut [u8]) -> &mut [f32] {
  // SAFETY: as in `as_f32s`; f32 has no invalid bit patterns in either
  // direction.
  let (prefix, lanes, suffix) = unsafe { bytes.align_to_mut::<f32>() };
  assert!(prefix.is_empty() && suffix.is_empty(), "buffer not f32-shaped");
  lanes
}

/// Reinterpret a byte buffer as `u64` lanes.
///
/// # Panics
///
/// Panics if the buffer is not aligned to `u64` or its length is not a
/// multiple of 8.
#[must_use]
pub fn as_u64s(bytes: &[u8]) -> &[u64] {
  // SAFETY: every bit pattern is a valid u64.
  let (prefix, lanes, suffix) = unsafe { bytes.align_to::<u64>() };
  assert!(prefix.is_empty() && suffix.is_empty(), "buffer not u64-shaped");
  lanes
}

/// Reinterpret a mutable byte buffer as `u64` lanes.
///
/// # Panics
///
/// Panics if the buffer is not aligned to `u64` or its length is not a
/// multiple of 8.
#[must_use]
pub fn as_u64s_mut(bytes: &mut [u8]) -> &mut [u64] {
  // SAFETY: every bit pattern is a valid u64.
  let (prefix, lanes, suffix) = unsafe { bytes.align_to_mut::<u64>() };
  assert!(prefix.is_empty() && suffix.is_empty(), "buffer not u64-shaped");
  lanes
}
