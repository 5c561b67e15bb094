//! Variant selection: filter by capabilities and alignment, rank by
//! extension preference.
//!
//! Ranking is deterministic and cheap — it runs once per operation per
//! process, not per call:
//!
//! 1. keep variants whose required extension is absent (generic) or
//!    present in the capability set;
//! 2. if the caller cannot guarantee aligned pointers, drop aligned-only
//!    variants (a correctness rule, not a preference);
//! 3. stable-sort by descending extension preference weight. Stable
//!    sorting preserves declaration order among incomparable extensions
//!    and among equal weights, which makes selection reproducible across
//!    runs on identical hardware.
//!
//! The head of the result is the best legal choice absent benchmarking.

use vlk_platform::CapabilitySet;

use crate::descriptor::{Alignment, VariantMeta};
use crate::error::DispatchError;

#[inline]
fn weight(meta: &VariantMeta) -> u8 {
  // Generic sorts below every extension-tagged variant.
  meta.required.map_or(0, |ext| ext.preference_weight())
}

/// Rank the eligible variants of one operation, best first.
///
/// Returns indices into `metas` (declaration order). Given the registry's
/// generic-fallback invariant the result is never empty for
/// `hint == Alignment::Any`; a caller passing metas that violate that
/// invariant gets an empty list and should treat it as fatal (see
/// [`best`]).
#[must_use]
pub fn rank(metas: &[VariantMeta], caps: &CapabilitySet, hint: Alignment) -> Vec<usize> {
  let mut eligible: Vec<usize> = metas
    .iter()
    .enumerate()
    .filter(|(_, m)| caps.satisfies(m.required))
    .filter(|(_, m)| hint == Alignment::Required || m.alignment == Alignment::Any)
    .map(|(i, _)| i)
    .collect();

  eligible.sort_by_key(|&i| core::cmp::Reverse(metas.get(i).map_or(0, weight)));
  eligible
}

/// The single best legal variant, or a fatal invariant error if nothing is
/// eligible (impossible for a registry-validated descriptor).
pub fn best(op: &'static str, metas: &[VariantMeta], caps: &CapabilitySet, hint: Alignment) -> Result<usize, DispatchError> {
  rank(metas, caps, hint)
    .first()
    .copied()
    .ok_or(DispatchError::RegistryInvariant {
      op,
      reason: "no eligible implementation",
    })
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;
  use vlk_platform::{CapabilitySet, ExtSet, Extension};

  use super::*;

  fn meta(name: &'static str, required: Option<Extension>, alignment: Alignment) -> VariantMeta {
    VariantMeta {
      name,
      required,
      alignment,
    }
  }

  fn caps_with(exts: &[Extension]) -> CapabilitySet {
    let mut set = ExtSet::NONE;
    for &ext in exts {
      set = set.with(ext);
    }
    CapabilitySet::new(set, 64)
  }

  #[test]
  fn generic_only_host_gets_generic() {
    let metas = vec![
      meta("avx2", Some(Extension::Avx2), Alignment::Any),
      meta("generic", None, Alignment::Any),
    ];
    let order = rank(&metas, &CapabilitySet::minimal(), Alignment::Any);
    assert_eq!(order, vec![1]);
  }

  #[test]
  fn dominant_extension_ranks_first() {
    let metas = vec![
      meta("generic", None, Alignment::Any),
      meta("sse2", Some(Extension::Sse2), Alignment::Any),
      meta("avx2", Some(Extension::Avx2), Alignment::Any),
    ];
    let caps = caps_with(&[Extension::Sse2, Extension::Avx2]);
    let order = rank(&metas, &caps, Alignment::Any);
    assert_eq!(order, vec![2, 1, 0]);
  }

  #[test]
  fn unaligned_hint_excludes_aligned_only_variants() {
    let metas = vec![
      meta("avx2_a", Some(Extension::Avx2), Alignment::Required),
      meta("avx2_u", Some(Extension::Avx2), Alignment::Any),
      meta("generic", None, Alignment::Any),
    ];
    let caps = caps_with(&[Extension::Avx2]);

    let unaligned = rank(&metas, &caps, Alignment::Any);
    assert_eq!(unaligned, vec![1, 2]);

    // With guaranteed alignment the aligned variant is eligible, and
    // declaration order breaks the weight tie.
    let aligned = rank(&metas, &caps, Alignment::Required);
    assert_eq!(aligned, vec![0, 1, 2]);
  }

  #[test]
  fn incomparable_extensions_keep_declaration_order() {
    let metas = vec![
      meta("popcnt", Some(Extension::Popcnt), Alignment::Any),
      meta("fma", Some(Extension::Fma), Alignment::Any),
      meta("generic", None, Alignment::Any),
    ];
    let caps = caps_with(&[Extension::Popcnt, Extension::Fma]);
    assert_eq!(rank(&metas, &caps, Alignment::Any), vec![0, 1, 2]);

    let swapped = vec![
      meta("fma", Some(Extension::Fma), Alignment::Any),
      meta("popcnt", Some(Extension::Popcnt), Alignment::Any),
      meta("generic", None, Alignment::Any),
    ];
    assert_eq!(rank(&swapped, &caps, Alignment::Any), vec![0, 1, 2]);
  }

  #[test]
  fn best_fails_without_eligible_variant() {
    // Unreachable through the registry; exercised directly.
    let metas = vec![meta("avx2", Some(Extension::Avx2), Alignment::Any)];
    let err = best("op", &metas, &CapabilitySet::minimal(), Alignment::Any).unwrap_err();
    assert!(matches!(err, DispatchError::RegistryInvariant { .. }));
  }

  fn arb_extension() -> impl Strategy<Value = Option<Extension>> {
    prop::sample::select(vec![
      None,
      Some(Extension::Sse2),
      Some(Extension::Ssse3),
      Some(Extension::Sse42),
      Some(Extension::Avx),
      Some(Extension::Avx2),
      Some(Extension::Avx512f),
      Some(Extension::Popcnt),
      Some(Extension::Fma),
      Some(Extension::Neon),
    ])
  }

  fn arb_caps() -> impl Strategy<Value = CapabilitySet> {
    (0u32..(1 << 11)).prop_map(|bits| {
      let mut set = ExtSet::NONE;
      for ext in Extension::ALL {
        if bits & ext.bit() != 0 {
          set = set.with(ext);
        }
      }
      CapabilitySet::new(set, 64)
    })
  }

  proptest! {
    // Whenever a generic variant exists, ranking under any capability set
    // is non-empty and the head's requirement is satisfied.
    #[test]
    fn rank_head_is_always_legal(
      required in prop::collection::vec(arb_extension(), 1..6),
      caps in arb_caps(),
    ) {
      let mut metas: Vec<VariantMeta> = required
        .iter()
        .map(|&req| meta("v", req, Alignment::Any))
        .collect();
      metas.push(meta("generic", None, Alignment::Any));

      let order = rank(&metas, &caps, Alignment::Any);
      prop_assert!(!order.is_empty());
      let head = &metas[order[0]];
      prop_assert!(caps.satisfies(head.required));

      // No later entry outranks the head.
      for &i in &order {
        prop_assert!(weight(&metas[order[0]]) >= weight(&metas[i]));
      }
    }

    // An unaligned hint never yields an aligned-only variant.
    #[test]
    fn unaligned_rank_never_contains_aligned_only(
      flags in prop::collection::vec(any::<bool>(), 1..6),
      caps in arb_caps(),
    ) {
      let mut metas: Vec<VariantMeta> = flags
        .iter()
        .map(|&aligned| meta(
          "v",
          Some(Extension::Sse2),
          if aligned { Alignment::Required } else { Alignment::Any },
        ))
        .collect();
      metas.push(meta("generic", None, Alignment::Any));

      for i in rank(&metas, &caps, Alignment::Any) {
        prop_assert_eq!(metas[i].alignment, Alignment::Any);
      }
    }
  }
}
