//! `popcnt_u64`: population count over a stream of 64-bit words.
//!
//! Irregular in a different way than the others: the output is a single
//! scalar, which the puppet writes into an 8-byte canonical output buffer.

use vlk_dispatch::{
  Alignment, CanonShape, CheckMode, DispatchError, FillMode, KernelDescriptor, PuppetFn, Registry,
  Variant, as_u64s, as_u64s_mut,
};
#[cfg(target_arch = "x86_64")]
use vlk_platform::Extension;

pub const NAME: &str = "popcnt_u64";

type PopcntFn = fn(&[u64]) -> u64;

// SWAR bit count, one word at a time. The classic carry-save reduction:
// pairs, nibbles, bytes, then a multiply to sum the byte counts.
fn swar(mut w: u64) -> u64 {
  w -= (w >> 1) & 0x5555_5555_5555_5555;
  w = (w & 0x3333_3333_3333_3333) + ((w >> 2) & 0x3333_3333_3333_3333);
  w = (w + (w >> 4)) & 0x0f0f_0f0f_0f0f_0f0f;
  w.wrapping_mul(0x0101_0101_0101_0101) >> 56
}

fn generic(words: &[u64]) -> u64 {
  words.iter().copied().map(swar).sum()
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "popcnt")]
unsafe fn popcnt_hw_impl(words: &[u64]) -> u64 {
  // count_ones lowers to the POPCNT instruction under the enabled feature.
  words.iter().map(|&w| u64::from(w.count_ones())).sum()
}

#[cfg(target_arch = "x86_64")]
fn popcnt_hw(words: &[u64]) -> u64 {
  // SAFETY: the selector hands out this variant only when POPCNT is present.
  unsafe { popcnt_hw_impl(words) }
}

#[cfg(target_arch = "x86_64")]
static VARIANTS: &[Variant<PopcntFn>] = &[
  Variant::new("popcnt", Some(Extension::Popcnt), Alignment::Any, popcnt_hw as PopcntFn),
  Variant::new("generic", None, Alignment::Any, generic as PopcntFn),
];

#[cfg(not(target_arch = "x86_64"))]
static VARIANTS: &[Variant<PopcntFn>] =
  &[Variant::new("generic", None, Alignment::Any, generic as PopcntFn)];

static DESC: KernelDescriptor<PopcntFn> = KernelDescriptor::new(NAME, VARIANTS);

fn puppet_generic(out: &mut [u8], ins: &[&[u8]], len: usize) {
  as_u64s_mut(out)[0] = generic(as_u64s(&ins[0][..len * 8]));
}

#[cfg(target_arch = "x86_64")]
fn puppet_popcnt(out: &mut [u8], ins: &[&[u8]], len: usize) {
  as_u64s_mut(out)[0] = popcnt_hw(as_u64s(&ins[0][..len * 8]));
}

#[cfg(target_arch = "x86_64")]
static PUPPETS: &[PuppetFn] = &[puppet_popcnt, puppet_generic];

#[cfg(not(target_arch = "x86_64"))]
static PUPPETS: &[PuppetFn] = &[puppet_generic];

fn in_bytes(_input: usize, len: usize) -> usize {
  len * 8
}

fn out_bytes(_len: usize) -> usize {
  8
}

pub(crate) fn register(reg: &mut Registry) -> Result<(), DispatchError> {
  reg.register_descriptor(
    &DESC,
    PUPPETS,
    CanonShape {
      inputs: 1,
      in_bytes,
      out_bytes,
      check: CheckMode::Exact,
      fill: FillMode::Bytes,
    },
  )
}

fn dispatch(hint: Alignment) -> PopcntFn {
  match crate::table().resolve(NAME, hint) {
    Ok(r) => DESC.func(r.index).unwrap_or(generic as PopcntFn),
    Err(err) => {
      // NAME is registered statically, so a failure here is a bug.
      debug_assert!(false, "resolve({NAME}) failed: {err}");
      generic
    }
  }
}

/// Total number of set bits across `words`.
#[must_use]
pub fn popcnt_u64(words: &[u64]) -> u64 {
  dispatch(Alignment::Any)(words)
}

/// Like [`popcnt_u64`], with the caller guaranteeing platform alignment.
#[must_use]
pub fn popcnt_u64_aligned(words: &[u64]) -> u64 {
  dispatch(Alignment::Required)(words)
}
