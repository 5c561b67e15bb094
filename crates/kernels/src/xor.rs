//! `xor_u8`: element-wise XOR of two byte streams.
//!
//! The simplest possible multi-variant operation, and the one the bench
//! uses: regular shape (every buffer is `len` bytes), exact output
//! comparison, and both an unaligned and an aligned-only AVX2 variant to
//! exercise the alignment rule end to end.

use vlk_dispatch::{
  Alignment, CanonShape, CheckMode, DispatchError, FillMode, KernelDescriptor, PuppetFn, Registry,
  Variant,
};
#[cfg(target_arch = "x86_64")]
use vlk_platform::Extension;

pub const NAME: &str = "xor_u8";

type XorFn = fn(&mut [u8], &[u8], &[u8]);

// ─────────────────────────────────────────────────────────────────────────────
// Native variants
// ─────────────────────────────────────────────────────────────────────────────

fn generic(out: &mut [u8], a: &[u8], b: &[u8]) {
  for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
    *o = x ^ y;
  }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn avx2_impl(out: &mut [u8], a: &[u8], b: &[u8]) {
  use core::arch::x86_64::{__m256i, _mm256_loadu_si256, _mm256_storeu_si256, _mm256_xor_si256};

  let n = out.len().min(a.len()).min(b.len());
  let mut i = 0;
  while i + 32 <= n {
    let va = _mm256_loadu_si256(a.as_ptr().add(i).cast::<__m256i>());
    let vb = _mm256_loadu_si256(b.as_ptr().add(i).cast::<__m256i>());
    _mm256_storeu_si256(out.as_mut_ptr().add(i).cast::<__m256i>(), _mm256_xor_si256(va, vb));
    i += 32;
  }
  while i < n {
    out[i] = a[i] ^ b[i];
    i += 1;
  }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn avx2_aligned_impl(out: &mut [u8], a: &[u8], b: &[u8]) {
  use core::arch::x86_64::{__m256i, _mm256_load_si256, _mm256_store_si256, _mm256_xor_si256};

  let n = out.len().min(a.len()).min(b.len());
  let mut i = 0;
  while i + 32 <= n {
    let va = _mm256_load_si256(a.as_ptr().add(i).cast::<__m256i>());
    let vb = _mm256_load_si256(b.as_ptr().add(i).cast::<__m256i>());
    _mm256_store_si256(out.as_mut_ptr().add(i).cast::<__m256i>(), _mm256_xor_si256(va, vb));
    i += 32;
  }
  while i < n {
    out[i] = a[i] ^ b[i];
    i += 1;
  }
}

#[cfg(target_arch = "x86_64")]
fn avx2(out: &mut [u8], a: &[u8], b: &[u8]) {
  // SAFETY: the selector hands out this variant only when AVX2 is present.
  unsafe { avx2_impl(out, a, b) }
}

#[cfg(target_arch = "x86_64")]
fn avx2_aligned(out: &mut [u8], a: &[u8], b: &[u8]) {
  // SAFETY: AVX2 presence per the selector; the caller guarantees the
  // platform alignment boundary (Alignment::Required contract).
  unsafe { avx2_aligned_impl(out, a, b) }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registration
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(target_arch = "x86_64")]
static VARIANTS: &[Variant<XorFn>] = &[
  Variant::new("avx2_a", Some(Extension::Avx2), Alignment::Required, avx2_aligned as XorFn),
  Variant::new("avx2", Some(Extension::Avx2), Alignment::Any, avx2 as XorFn),
  Variant::new("generic", None, Alignment::Any, generic as XorFn),
];

#[cfg(not(target_arch = "x86_64"))]
static VARIANTS: &[Variant<XorFn>] =
  &[Variant::new("generic", None, Alignment::Any, generic as XorFn)];

static DESC: KernelDescriptor<XorFn> = KernelDescriptor::new(NAME, VARIANTS);

fn puppet_generic(out: &mut [u8], ins: &[&[u8]], len: usize) {
  generic(&mut out[..len], &ins[0][..len], &ins[1][..len]);
}

#[cfg(target_arch = "x86_64")]
fn puppet_avx2(out: &mut [u8], ins: &[&[u8]], len: usize) {
  avx2(&mut out[..len], &ins[0][..len], &ins[1][..len]);
}

#[cfg(target_arch = "x86_64")]
fn puppet_avx2_aligned(out: &mut [u8], ins: &[&[u8]], len: usize) {
  avx2_aligned(&mut out[..len], &ins[0][..len], &ins[1][..len]);
}

#[cfg(target_arch = "x86_64")]
static PUPPETS: &[PuppetFn] = &[puppet_avx2_aligned, puppet_avx2, puppet_generic];

#[cfg(not(target_arch = "x86_64"))]
static PUPPETS: &[PuppetFn] = &[puppet_generic];

fn in_bytes(_input: usize, len: usize) -> usize {
  len
}

fn out_bytes(len: usize) -> usize {
  len
}

pub(crate) fn register(reg: &mut Registry) -> Result<(), DispatchError> {
  reg.register_descriptor(
    &DESC,
    PUPPETS,
    CanonShape {
      inputs: 2,
      in_bytes,
      out_bytes,
      check: CheckMode::Exact,
      fill: FillMode::Bytes,
    },
  )
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry points
// ─────────────────────────────────────────────────────────────────────────────

fn dispatch(hint: Alignment) -> XorFn {
  match crate::table().resolve(NAME, hint) {
    Ok(r) => DESC.func(r.index).unwrap_or(generic as XorFn),
    Err(err) => {
      // NAME is registered statically, so a failure here is a bug.
      debug_assert!(false, "resolve({NAME}) failed: {err}");
      generic
    }
  }
}

/// XOR `a` and `b` element-wise into `out`. No alignment assumptions.
pub fn xor_u8(out: &mut [u8], a: &[u8], b: &[u8]) {
  dispatch(Alignment::Any)(out, a, b);
}

/// Like [`xor_u8`], with the caller guaranteeing every buffer sits on the
/// platform alignment boundary.
pub fn xor_u8_aligned(out: &mut [u8], a: &[u8], b: &[u8]) {
  dispatch(Alignment::Required)(out, a, b);
}
