//! Aligned buffers and deterministic fills for the harness.
//!
//! Every buffer the harness hands to a puppet sits on a 64-byte boundary,
//! wide enough for any variant's alignment assumption, and is filled
//! deterministically so repeated runs and cross-variant comparisons see the
//! same data.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use vlk_dispatch::FillMode;

/// Boundary every harness buffer is aligned to.
pub const HARNESS_ALIGN: usize = 64;

/// Heap buffer with a 64-byte-aligned base address.
pub struct AlignedBuf {
  ptr: NonNull<u8>,
  len: usize,
  layout: Layout,
}

impl AlignedBuf {
  /// Allocate a zeroed buffer of `len` bytes.
  ///
  /// # Panics
  ///
  /// Panics if `len` overflows a layout; aborts on allocation failure, as
  /// heap exhaustion in a measurement tool is unrecoverable.
  #[must_use]
  pub fn zeroed(len: usize) -> Self {
    let size = len.max(1);
    let Ok(layout) = Layout::from_size_align(size, HARNESS_ALIGN) else {
      panic!("aligned buffer of {len} bytes overflows a layout");
    };
    // SAFETY: layout has non-zero size.
    let raw = unsafe { alloc::alloc_zeroed(layout) };
    let Some(ptr) = NonNull::new(raw) else {
      alloc::handle_alloc_error(layout);
    };
    Self { ptr, len, layout }
  }

  #[inline]
  #[must_use]
  pub fn as_slice(&self) -> &[u8] {
    // SAFETY: ptr covers `layout.size() >= len` initialized bytes.
    unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
  }

  #[inline]
  #[must_use]
  pub fn as_mut_slice(&mut self) -> &mut [u8] {
    // SAFETY: as in `as_slice`, and we hold the unique reference.
    unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
  }

  #[inline]
  #[must_use]
  pub fn len(&self) -> usize {
    self.len
  }

  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }
}

impl Drop for AlignedBuf {
  fn drop(&mut self) {
    // SAFETY: allocated in `zeroed` with this exact layout.
    unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
  }
}

// SAFETY: AlignedBuf owns its allocation outright.
unsafe impl Send for AlignedBuf {}
unsafe impl Sync for AlignedBuf {}

// ─────────────────────────────────────────────────────────────────────────────
// Deterministic fills
// ─────────────────────────────────────────────────────────────────────────────

fn xorshift(state: &mut u64) -> u64 {
  // xorshift64*, plenty for test data.
  let mut x = *state;
  x ^= x << 13;
  x ^= x >> 7;
  x ^= x << 17;
  *state = x;
  x.wrapping_mul(0x2545_f491_4f6c_dd1d)
}

/// Fill a buffer deterministically according to the operation's fill rule.
pub fn fill(buf: &mut [u8], mode: FillMode, seed: u64) {
  let mut state = seed | 1;
  match mode {
    FillMode::Bytes => {
      for chunk in buf.chunks_mut(8) {
        let word = xorshift(&mut state).to_le_bytes();
        let n = chunk.len();
        chunk.copy_from_slice(&word[..n]);
      }
    }
    FillMode::F32Unit => {
      for lane in buf.chunks_mut(4) {
        // 24 random bits mapped onto [-1, 1].
        let raw = (xorshift(&mut state) >> 40) as f32;
        let x = raw / ((1u32 << 23) as f32) - 1.0;
        let bytes = x.to_le_bytes();
        let n = lane.len();
        lane.copy_from_slice(&bytes[..n]);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn base_address_is_aligned() {
    for len in [1, 7, 64, 4096] {
      let buf = AlignedBuf::zeroed(len);
      assert_eq!(buf.as_slice().as_ptr() as usize % HARNESS_ALIGN, 0);
      assert_eq!(buf.len(), len);
      assert!(buf.as_slice().iter().all(|&b| b == 0));
    }
  }

  #[test]
  fn fill_is_deterministic() {
    let mut a = vec![0u8; 128];
    let mut b = vec![0u8; 128];
    fill(&mut a, FillMode::Bytes, 42);
    fill(&mut b, FillMode::Bytes, 42);
    assert_eq!(a, b);

    fill(&mut b, FillMode::Bytes, 43);
    assert_ne!(a, b);
  }

  #[test]
  fn f32_unit_fill_stays_in_range() {
    let mut buf = AlignedBuf::zeroed(256);
    fill(buf.as_mut_slice(), FillMode::F32Unit, 7);
    for lane in vlk_dispatch::as_f32s(buf.as_slice()) {
      assert!(*lane >= -1.0 && *lane <= 1.0, "lane {lane} out of range");
    }
  }
}
