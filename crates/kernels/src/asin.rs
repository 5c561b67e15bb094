//! `asin_f32`: element-wise arcsine over `[-1, 1]`.
//!
//! The accelerated variant is a polynomial approximation, not a
//! re-association of the same arithmetic, so its outputs differ from the
//! generic `f32::asin` in the last few bits. The operation therefore
//! registers with a float tolerance and a unit-interval fill rule, which is
//! exactly what [`CheckMode::F32Tol`] and [`FillMode::F32Unit`] exist for.

use vlk_dispatch::{
  Alignment, CanonShape, CheckMode, DispatchError, FillMode, KernelDescriptor, PuppetFn, Registry,
  Variant, as_f32s, as_f32s_mut,
};
#[cfg(target_arch = "x86_64")]
use vlk_platform::Extension;

pub const NAME: &str = "asin_f32";

/// Relative tolerance the polynomial variant is held to.
pub const TOLERANCE: f32 = 1e-3;

type AsinFn = fn(&mut [f32], &[f32]);

fn generic(out: &mut [f32], input: &[f32]) {
  for (o, &x) in out.iter_mut().zip(input) {
    *o = x.asin();
  }
}

#[cfg(target_arch = "x86_64")]
#[inline(always)]
fn asin_poly(x: f32) -> f32 {
  // Two half-angle reductions: asin(x) = 4 * atan(t) with |t| <= 0.415,
  // small enough for a short odd polynomial.
  let t = x / (1.0 + (1.0 - x * x).sqrt());
  let t = t / (1.0 + (1.0 + t * t).sqrt());
  let t2 = t * t;
  // atan(t) ~ t * (1 - t^2/3 + t^4/5 - t^6/7), Horner form.
  let p = t2.mul_add(-1.0 / 7.0, 1.0 / 5.0);
  let p = t2.mul_add(p, -1.0 / 3.0);
  let p = t2.mul_add(p, 1.0);
  4.0 * t * p
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "fma")]
unsafe fn fma_impl(out: &mut [f32], input: &[f32]) {
  // mul_add lowers to fused multiply-add under the enabled feature.
  for (o, &x) in out.iter_mut().zip(input) {
    *o = asin_poly(x);
  }
}

#[cfg(target_arch = "x86_64")]
fn fma(out: &mut [f32], input: &[f32]) {
  // SAFETY: the selector hands out this variant only when FMA is present.
  unsafe { fma_impl(out, input) }
}

#[cfg(target_arch = "x86_64")]
static VARIANTS: &[Variant<AsinFn>] = &[
  Variant::new("fma", Some(Extension::Fma), Alignment::Any, fma as AsinFn),
  Variant::new("generic", None, Alignment::Any, generic as AsinFn),
];

#[cfg(not(target_arch = "x86_64"))]
static VARIANTS: &[Variant<AsinFn>] =
  &[Variant::new("generic", None, Alignment::Any, generic as AsinFn)];

static DESC: KernelDescriptor<AsinFn> = KernelDescriptor::new(NAME, VARIANTS);

fn puppet_generic(out: &mut [u8], ins: &[&[u8]], len: usize) {
  generic(&mut as_f32s_mut(out)[..len], &as_f32s(ins[0])[..len]);
}

#[cfg(target_arch = "x86_64")]
fn puppet_fma(out: &mut [u8], ins: &[&[u8]], len: usize) {
  fma(&mut as_f32s_mut(out)[..len], &as_f32s(ins[0])[..len]);
}

#[cfg(target_arch = "x86_64")]
static PUPPETS: &[PuppetFn] = &[puppet_fma, puppet_generic];

#[cfg(not(target_arch = "x86_64"))]
static PUPPETS: &[PuppetFn] = &[puppet_generic];

fn in_bytes(_input: usize, len: usize) -> usize {
  len * 4
}

fn out_bytes(len: usize) -> usize {
  len * 4
}

pub(crate) fn register(reg: &mut Registry) -> Result<(), DispatchError> {
  reg.register_descriptor(
    &DESC,
    PUPPETS,
    CanonShape {
      inputs: 1,
      in_bytes,
      out_bytes,
      check: CheckMode::F32Tol(TOLERANCE),
      fill: FillMode::F32Unit,
    },
  )
}

fn dispatch(hint: Alignment) -> AsinFn {
  match crate::table().resolve(NAME, hint) {
    Ok(r) => DESC.func(r.index).unwrap_or(generic as AsinFn),
    Err(err) => {
      // NAME is registered statically, so a failure here is a bug.
      debug_assert!(false, "resolve({NAME}) failed: {err}");
      generic
    }
  }
}

/// Element-wise arcsine. Inputs outside `[-1, 1]` produce NaN, as
/// `f32::asin` does.
pub fn asin_f32(out: &mut [f32], input: &[f32]) {
  dispatch(Alignment::Any)(out, input);
}

/// Like [`asin_f32`], with the caller guaranteeing platform alignment.
pub fn asin_f32_aligned(out: &mut [f32], input: &[f32]) {
  dispatch(Alignment::Required)(out, input);
}
