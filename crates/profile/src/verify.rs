//! Cross-variant verification through the puppet adapters.
//!
//! The generic fallback is the reference: every variant legal on the host
//! must reproduce its output over identical, deterministically filled
//! inputs. Comparison follows the operation's [`CheckMode`] — exact bytes
//! for integer kernels, a relative tolerance for approximating ones.

use vlk_dispatch::{Alignment, CheckMode, OpEntry, as_f32s, select};
use vlk_platform::CapabilitySet;

use crate::buffer::{AlignedBuf, fill};
use crate::error::ProfileError;

/// Canonical unit count used for verification. A multiple of 64 so every
/// registered size contract divides cleanly, and past the widest vector
/// loop's single iteration.
pub const VERIFY_LEN: usize = 4096;

fn compare(check: CheckMode, expected: &[u8], got: &[u8]) -> Result<(), String> {
  match check {
    CheckMode::Exact => {
      if let Some(i) = (0..expected.len()).find(|&i| expected[i] != got[i]) {
        return Err(format!(
          "byte {i}: expected {:#04x}, got {:#04x}",
          expected[i], got[i]
        ));
      }
      Ok(())
    }
    CheckMode::F32Tol(tol) => {
      for (i, (e, g)) in as_f32s(expected).iter().zip(as_f32s(got)).enumerate() {
        let bound = tol * e.abs().max(1.0);
        if (e - g).abs() > bound {
          return Err(format!("lane {i}: expected {e}, got {g}, tolerance {bound}"));
        }
      }
      Ok(())
    }
  }
}

/// Drive one puppet over freshly filled inputs.
fn run_puppet(entry: &OpEntry, index: usize, len: usize) -> Result<AlignedBuf, ProfileError> {
  let shape = entry.shape();
  let inputs: Vec<AlignedBuf> = (0..shape.inputs)
    .map(|i| {
      let mut buf = AlignedBuf::zeroed((shape.in_bytes)(i, len));
      // Seed per input, not per variant, so all variants see the same data.
      fill(buf.as_mut_slice(), shape.fill, 0x9e37_79b9 + i as u64);
      buf
    })
    .collect();
  let ins: Vec<&[u8]> = inputs.iter().map(AlignedBuf::as_slice).collect();

  let mut out = AlignedBuf::zeroed((shape.out_bytes)(len));
  let puppet = entry
    .puppet(index)
    .ok_or(ProfileError::NoKernels(entry.name()))?;
  puppet(out.as_mut_slice(), &ins, len);
  Ok(out)
}

/// Verify every variant of `entry` that is legal under `caps` against the
/// generic reference.
///
/// Harness buffers are 64-byte aligned, so aligned-only variants are legal
/// here even when ordinary callers could not use them.
///
/// # Errors
///
/// [`ProfileError::Mismatch`] on the first diverging variant.
pub fn verify_op(entry: &OpEntry, caps: &CapabilitySet) -> Result<(), ProfileError> {
  let reference = run_puppet(entry, entry.generic_index(), VERIFY_LEN)?;

  for index in select::rank(entry.metas(), caps, Alignment::Required) {
    if index == entry.generic_index() {
      continue;
    }
    let out = run_puppet(entry, index, VERIFY_LEN)?;
    if let Err(detail) = compare(entry.shape().check, reference.as_slice(), out.as_slice()) {
      let variant = entry.metas().get(index).map_or("?", |m| m.name);
      return Err(ProfileError::Mismatch {
        op: entry.name(),
        variant,
        detail,
      });
    }
  }
  Ok(())
}
