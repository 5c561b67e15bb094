//! `add_fc32`: add a real stream to a complex stream.
//!
//! The shape is irregular: input 0 and the output are 8 bytes per unit
//! (interleaved complex), input 1 is 4 bytes per unit. The puppets encode
//! that ratio through [`CanonShape`]'s per-input size functions.

use vlk_dispatch::{
  Alignment, CanonShape, CheckMode, DispatchError, FillMode, KernelDescriptor, PuppetFn, Registry,
  Variant, as_f32s,
};
#[cfg(target_arch = "x86_64")]
use vlk_platform::Extension;

pub const NAME: &str = "add_fc32";

/// Interleaved single-precision complex sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Cf32 {
  pub re: f32,
  pub im: f32,
}

type AddFn = fn(&mut [Cf32], &[Cf32], &[f32]);

fn generic(out: &mut [Cf32], a: &[Cf32], b: &[f32]) {
  for ((o, &x), &r) in out.iter_mut().zip(a).zip(b) {
    *o = Cf32 {
      re: x.re + r,
      im: x.im,
    };
  }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx")]
unsafe fn avx_impl(out: &mut [Cf32], a: &[Cf32], b: &[f32]) {
  use core::arch::x86_64::{
    _mm256_add_ps, _mm256_loadu_ps, _mm256_permute2f128_ps, _mm256_setzero_ps, _mm256_storeu_ps,
    _mm256_unpackhi_ps, _mm256_unpacklo_ps,
  };

  let n = out.len().min(a.len()).min(b.len());
  let zero = _mm256_setzero_ps();
  let mut i = 0;
  // Eight complex samples per iteration: spread eight reals into the
  // real lanes of two complex vectors, then add.
  while i + 8 <= n {
    let a_lo = _mm256_loadu_ps(a.as_ptr().add(i).cast::<f32>());
    let a_hi = _mm256_loadu_ps(a.as_ptr().add(i + 4).cast::<f32>());
    let reals = _mm256_loadu_ps(b.as_ptr().add(i));

    let lo = _mm256_unpacklo_ps(reals, zero);
    let hi = _mm256_unpackhi_ps(reals, zero);
    let b_lo = _mm256_permute2f128_ps(lo, hi, 0x20);
    let b_hi = _mm256_permute2f128_ps(lo, hi, 0x31);

    _mm256_storeu_ps(out.as_mut_ptr().add(i).cast::<f32>(), _mm256_add_ps(a_lo, b_lo));
    _mm256_storeu_ps(out.as_mut_ptr().add(i + 4).cast::<f32>(), _mm256_add_ps(a_hi, b_hi));
    i += 8;
  }
  while i < n {
    out[i] = Cf32 {
      re: a[i].re + b[i],
      im: a[i].im,
    };
    i += 1;
  }
}

#[cfg(target_arch = "x86_64")]
fn avx(out: &mut [Cf32], a: &[Cf32], b: &[f32]) {
  // SAFETY: the selector hands out this variant only when AVX is present.
  unsafe { avx_impl(out, a, b) }
}

#[cfg(target_arch = "x86_64")]
static VARIANTS: &[Variant<AddFn>] = &[
  Variant::new("avx", Some(Extension::Avx), Alignment::Any, avx as AddFn),
  Variant::new("generic", None, Alignment::Any, generic as AddFn),
];

#[cfg(not(target_arch = "x86_64"))]
static VARIANTS: &[Variant<AddFn>] =
  &[Variant::new("generic", None, Alignment::Any, generic as AddFn)];

static DESC: KernelDescriptor<AddFn> = KernelDescriptor::new(NAME, VARIANTS);

fn as_cf32s(bytes: &[u8]) -> &[Cf32] {
  // SAFETY: Cf32 is repr(C) over two f32 lanes; every bit pattern is valid.
  let (prefix, lanes, suffix) = unsafe { bytes.align_to::<Cf32>() };
  assert!(prefix.is_empty() && suffix.is_empty(), "buffer not complex-shaped");
  lanes
}

fn as_cf32s_mut(bytes: &mut [u8]) -> &mut [Cf32] {
  // SAFETY: as in `as_cf32s`.
  let (prefix, lanes, suffix) = unsafe { bytes.align_to_mut::<Cf32>() };
  assert!(prefix.is_empty() && suffix.is_empty(), "buffer not complex-shaped");
  lanes
}

fn puppet_generic(out: &mut [u8], ins: &[&[u8]], len: usize) {
  generic(&mut as_cf32s_mut(out)[..len], &as_cf32s(ins[0])[..len], &as_f32s(ins[1])[..len]);
}

#[cfg(target_arch = "x86_64")]
fn puppet_avx(out: &mut [u8], ins: &[&[u8]], len: usize) {
  avx(&mut as_cf32s_mut(out)[..len], &as_cf32s(ins[0])[..len], &as_f32s(ins[1])[..len]);
}

#[cfg(target_arch = "x86_64")]
static PUPPETS: &[PuppetFn] = &[puppet_avx, puppet_generic];

#[cfg(not(target_arch = "x86_64"))]
static PUPPETS: &[PuppetFn] = &[puppet_generic];

fn in_bytes(input: usize, len: usize) -> usize {
  // Input 0 is complex, input 1 is real.
  if input == 0 { len * 8 } else { len * 4 }
}

fn out_bytes(len: usize) -> usize {
  len * 8
}

pub(crate) fn register(reg: &mut Registry) -> Result<(), DispatchError> {
  reg.register_descriptor(
    &DESC,
    PUPPETS,
    CanonShape {
      inputs: 2,
      in_bytes,
      out_bytes,
      // Both variants perform the identical IEEE addition, so outputs
      // match bit for bit.
      check: CheckMode::Exact,
      fill: FillMode::F32Unit,
    },
  )
}

fn dispatch(hint: Alignment) -> AddFn {
  match crate::table().resolve(NAME, hint) {
    Ok(r) => DESC.func(r.index).unwrap_or(generic as AddFn),
    Err(err) => {
      // NAME is registered statically, so a failure here is a bug.
      debug_assert!(false, "resolve({NAME}) failed: {err}");
      generic
    }
  }
}

/// `out[i] = a[i] + b[i]` where `b` is real: the real parts move, the
/// imaginary parts pass through.
pub fn add_fc32(out: &mut [Cf32], a: &[Cf32], b: &[f32]) {
  dispatch(Alignment::Any)(out, a, b);
}

/// Like [`add_fc32`], with the caller guaranteeing platform alignment.
pub fn add_fc32_aligned(out: &mut [Cf32], a: &[Cf32], b: &[f32]) {
  dispatch(Alignment::Required)(out, a, b);
}

#[cfg(test)]
mod tests {
  use super::*;

  fn samples(n: usize) -> (Vec<Cf32>, Vec<f32>) {
    let a = (0..n)
      .map(|i| Cf32 {
        re: i as f32 * 0.25,
        im: -(i as f32) * 0.5,
      })
      .collect();
    let b = (0..n).map(|i| 1.0 - i as f32 * 0.125).collect();
    (a, b)
  }

  #[test]
  fn generic_adds_reals_and_preserves_imaginaries() {
    let (a, b) = samples(10);
    let mut out = vec![Cf32::default(); 10];
    generic(&mut out, &a, &b);
    for i in 0..10 {
      assert_eq!(out[i].re, a[i].re + b[i]);
      assert_eq!(out[i].im, a[i].im);
    }
  }

  #[cfg(target_arch = "x86_64")]
  #[test]
  fn avx_matches_generic_with_ragged_tail() {
    if !vlk_platform::detect().has(Extension::Avx) {
      return;
    }
    let (a, b) = samples(29);
    let mut expected = vec![Cf32::default(); 29];
    generic(&mut expected, &a, &b);
    let mut got = vec![Cf32::default(); 29];
    avx(&mut got, &a, &b);
    assert_eq!(got, expected);
  }

  #[test]
  fn entry_point_matches_generic() {
    let (a, b) = samples(64);
    let mut expected = vec![Cf32::default(); 64];
    generic(&mut expected, &a, &b);
    let mut got = vec![Cf32::default(); 64];
    add_fc32(&mut got, &a, &b);
    assert_eq!(got, expected);
  }
}
