//! `pack_bits` / `unpack_bits`: 8:1 and 1:8 conversions between one bit
//! per byte and packed bytes.
//!
//! Bit order is MSB first: the first unpacked byte of each group lands in
//! bit 7 of the packed byte. The canonical length is always the unpacked
//! count, so `pack_bits` reads `len` bytes and writes `len / 8`, while
//! `unpack_bits` does the reverse. The harness only uses canonical lengths
//! that are multiples of 64, so the ratios divide cleanly.

use vlk_dispatch::{
  Alignment, CanonShape, CheckMode, DispatchError, FillMode, KernelDescriptor, PuppetFn, Registry,
  Variant,
};
#[cfg(target_arch = "x86_64")]
use vlk_platform::Extension;

pub const PACK_NAME: &str = "pack_bits";
pub const UNPACK_NAME: &str = "unpack_bits";

type PackFn = fn(&mut [u8], &[u8]);

// ─────────────────────────────────────────────────────────────────────────────
// pack_bits
// ─────────────────────────────────────────────────────────────────────────────

fn pack_generic(out: &mut [u8], input: &[u8]) {
  for (o, group) in out.iter_mut().zip(input.chunks_exact(8)) {
    let mut byte = 0u8;
    for (j, &bit) in group.iter().enumerate() {
      byte |= (bit & 1) << (7 - j);
    }
    *o = byte;
  }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "ssse3")]
unsafe fn pack_ssse3_impl(out: &mut [u8], input: &[u8]) {
  use core::arch::x86_64::{
    __m128i, _mm_and_si128, _mm_loadu_si128, _mm_movemask_epi8, _mm_set1_epi8, _mm_set_epi8,
    _mm_shuffle_epi8, _mm_slli_epi64,
  };

  let groups = out.len().min(input.len() / 8);
  let pairs = groups / 2;
  let ones = _mm_set1_epi8(1);
  // Reverse each 8-byte group so movemask (bit i = byte i) yields MSB-first
  // packed bytes.
  let rev = _mm_set_epi8(8, 9, 10, 11, 12, 13, 14, 15, 0, 1, 2, 3, 4, 5, 6, 7);

  let mut i = 0;
  // 16 unpacked bytes per iteration: mask to the LSBs, shift them into the
  // byte MSB position, reverse, and let movemask collect two packed bytes.
  while i < pairs {
    let v = _mm_loadu_si128(input.as_ptr().add(i * 16).cast::<__m128i>());
    let msbs = _mm_slli_epi64(_mm_and_si128(v, ones), 7);
    let mask = _mm_movemask_epi8(_mm_shuffle_epi8(msbs, rev));
    out[i * 2] = (mask & 0xff) as u8;
    out[i * 2 + 1] = ((mask >> 8) & 0xff) as u8;
    i += 1;
  }
  pack_generic(&mut out[pairs * 2..groups], &input[pairs * 16..groups * 8]);
}

#[cfg(target_arch = "x86_64")]
fn pack_ssse3(out: &mut [u8], input: &[u8]) {
  // SAFETY: the selector hands out this variant only when SSSE3 is present.
  unsafe { pack_ssse3_impl(out, input) }
}

#[cfg(target_arch = "x86_64")]
static PACK_VARIANTS: &[Variant<PackFn>] = &[
  Variant::new("ssse3", Some(Extension::Ssse3), Alignment::Any, pack_ssse3 as PackFn),
  Variant::new("generic", None, Alignment::Any, pack_generic as PackFn),
];

#[cfg(not(target_arch = "x86_64"))]
static PACK_VARIANTS: &[Variant<PackFn>] =
  &[Variant::new("generic", None, Alignment::Any, pack_generic as PackFn)];

static PACK_DESC: KernelDescriptor<PackFn> = KernelDescriptor::new(PACK_NAME, PACK_VARIANTS);

fn pack_puppet_generic(out: &mut [u8], ins: &[&[u8]], len: usize) {
  pack_generic(&mut out[..len / 8], &ins[0][..len]);
}

#[cfg(target_arch = "x86_64")]
fn pack_puppet_ssse3(out: &mut [u8], ins: &[&[u8]], len: usize) {
  pack_ssse3(&mut out[..len / 8], &ins[0][..len]);
}

#[cfg(target_arch = "x86_64")]
static PACK_PUPPETS: &[PuppetFn] = &[pack_puppet_ssse3, pack_puppet_generic];

#[cfg(not(target_arch = "x86_64"))]
static PACK_PUPPETS: &[PuppetFn] = &[pack_puppet_generic];

fn pack_in_bytes(_input: usize, len: usize) -> usize {
  len
}

fn pack_out_bytes(len: usize) -> usize {
  len / 8
}

// ─────────────────────────────────────────────────────────────────────────────
// unpack_bits
// ─────────────────────────────────────────────────────────────────────────────

fn unpack_generic(out: &mut [u8], input: &[u8]) {
  for (group, &byte) in out.chunks_exact_mut(8).zip(input) {
    for (j, o) in group.iter_mut().enumerate() {
      *o = (byte >> (7 - j)) & 1;
    }
  }
}

static UNPACK_VARIANTS: &[Variant<PackFn>] =
  &[Variant::new("generic", None, Alignment::Any, unpack_generic as PackFn)];

static UNPACK_DESC: KernelDescriptor<PackFn> = KernelDescriptor::new(UNPACK_NAME, UNPACK_VARIANTS);

fn unpack_puppet_generic(out: &mut [u8], ins: &[&[u8]], len: usize) {
  unpack_generic(&mut out[..len], &ins[0][..len / 8]);
}

static UNPACK_PUPPETS: &[PuppetFn] = &[unpack_puppet_generic];

fn unpack_in_bytes(_input: usize, len: usize) -> usize {
  len / 8
}

fn unpack_out_bytes(len: usize) -> usize {
  len
}

pub(crate) fn register(reg: &mut Registry) -> Result<(), DispatchError> {
  reg.register_descriptor(
    &PACK_DESC,
    PACK_PUPPETS,
    CanonShape {
      inputs: 1,
      in_bytes: pack_in_bytes,
      out_bytes: pack_out_bytes,
      check: CheckMode::Exact,
      fill: FillMode::Bytes,
    },
  )?;
  reg.register_descriptor(
    &UNPACK_DESC,
    UNPACK_PUPPETS,
    CanonShape {
      inputs: 1,
      in_bytes: unpack_in_bytes,
      out_bytes: unpack_out_bytes,
      check: CheckMode::Exact,
      fill: FillMode::Bytes,
    },
  )
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry points
// ─────────────────────────────────────────────────────────────────────────────

fn dispatch(name: &'static str, desc: &KernelDescriptor<PackFn>, generic: PackFn, hint: Alignment) -> PackFn {
  match crate::table().resolve(name, hint) {
    Ok(r) => desc.func(r.index).unwrap_or(generic),
    Err(err) => {
      // Both names are registered statically, so a failure here is a bug.
      debug_assert!(false, "resolve({name}) failed: {err}");
      generic
    }
  }
}

/// Pack the LSBs of `input` (one bit per byte, MSB first) into `out`.
/// `input.len()` should be a multiple of 8; a ragged tail is dropped.
pub fn pack_bits(out: &mut [u8], input: &[u8]) {
  dispatch(PACK_NAME, &PACK_DESC, pack_generic, Alignment::Any)(out, input);
}

/// Like [`pack_bits`], with the caller guaranteeing platform alignment.
pub fn pack_bits_aligned(out: &mut [u8], input: &[u8]) {
  dispatch(PACK_NAME, &PACK_DESC, pack_generic, Alignment::Required)(out, input);
}

/// Unpack each byte of `input` into 8 bytes of `out`, one bit per byte,
/// MSB first.
pub fn unpack_bits(out: &mut [u8], input: &[u8]) {
  dispatch(UNPACK_NAME, &UNPACK_DESC, unpack_generic, Alignment::Any)(out, input);
}

/// Like [`unpack_bits`], with the caller guaranteeing platform alignment.
pub fn unpack_bits_aligned(out: &mut [u8], input: &[u8]) {
  dispatch(UNPACK_NAME, &UNPACK_DESC, unpack_generic, Alignment::Required)(out, input);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn size_contract_is_eight_to_one() {
    assert_eq!(pack_out_bytes(64), 8);
    assert_eq!(pack_in_bytes(0, 64), 64);
    assert_eq!(unpack_in_bytes(0, 64), 8);
    assert_eq!(unpack_out_bytes(64), 64);
  }

  #[test]
  fn pack_is_msb_first() {
    let input = [1u8, 0, 0, 0, 0, 0, 0, 1];
    let mut out = [0u8; 1];
    pack_generic(&mut out, &input);
    assert_eq!(out[0], 0b1000_0001);
  }

  #[test]
  fn unpack_is_msb_first() {
    let mut out = [0u8; 8];
    unpack_generic(&mut out, &[0b1000_0001]);
    assert_eq!(out, [1, 0, 0, 0, 0, 0, 0, 1]);
  }

  #[test]
  fn pack_unpack_round_trip() {
    let bits: Vec<u8> = (0..256).map(|i| ((i * 7 + 3) % 5 == 0) as u8).collect();
    let mut packed = vec![0u8; 32];
    pack_generic(&mut packed, &bits);
    let mut unpacked = vec![0u8; 256];
    unpack_generic(&mut unpacked, &packed);
    assert_eq!(unpacked, bits);
  }

  #[cfg(target_arch = "x86_64")]
  #[test]
  fn ssse3_matches_generic_with_ragged_tail() {
    if !vlk_platform::detect().has(Extension::Ssse3) {
      return;
    }
    // 27 output bytes: 13 SIMD pairs plus one scalar group.
    let input: Vec<u8> = (0..216).map(|i| (i as u8).wrapping_mul(97)).collect();
    let mut expected = vec![0u8; 27];
    pack_generic(&mut expected, &input);
    let mut got = vec![0u8; 27];
    pack_ssse3(&mut got, &input);
    assert_eq!(got, expected);
  }

  #[test]
  fn entry_points_round_trip() {
    let bits: Vec<u8> = (0..128).map(|i| (i % 3 == 0) as u8).collect();
    let mut packed = vec![0u8; 16];
    pack_bits(&mut packed, &bits);
    let mut unpacked = vec![0u8; 128];
    unpack_bits(&mut unpacked, &packed);
    assert_eq!(unpacked, bits);
  }
}
