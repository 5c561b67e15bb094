//! The operation registry.
//!
//! Kernel modules register their descriptors here during single-threaded
//! initialization; the registry is immutable afterwards and shared
//! read-only. Registration enforces the structural invariants the rest of
//! the system relies on:
//!
//! - operation names are globally unique;
//! - every operation has **exactly one** generic fallback (a variant with
//!   no required extension), so selection can never come up empty;
//! - every variant carries a puppet adapter, so the harness can drive it.
//!
//! Violations are [`DispatchError::RegistryInvariant`] — configuration
//! bugs, surfaced at startup, never at call time.

use std::collections::HashMap;

use crate::adapter::{CanonShape, PuppetFn};
use crate::descriptor::{KernelDescriptor, VariantMeta};
use crate::error::DispatchError;

/// One registered operation: metadata, puppets, and size contract.
pub struct OpEntry {
  name: &'static str,
  metas: Vec<VariantMeta>,
  puppets: Vec<PuppetFn>,
  shape: CanonShape,
}

impl OpEntry {
  /// Operation name.
  #[inline]
  #[must_use]
  pub fn name(&self) -> &'static str {
    self.name
  }

  /// Variant metadata in declaration order.
  #[inline]
  #[must_use]
  pub fn metas(&self) -> &[VariantMeta] {
    &self.metas
  }

  /// Puppet adapter of the variant at `index`.
  #[inline]
  #[must_use]
  pub fn puppet(&self, index: usize) -> Option<PuppetFn> {
    self.puppets.get(index).copied()
  }

  /// Canonical size contract shared by all variants.
  #[inline]
  #[must_use]
  pub fn shape(&self) -> &CanonShape {
    &self.shape
  }

  /// Index of the generic fallback variant.
  #[must_use]
  pub fn generic_index(&self) -> usize {
    // The registration invariant guarantees exactly one generic variant.
    self.metas.iter().position(VariantMeta::is_generic).unwrap_or(0)
  }

  /// Find a variant index by name.
  #[must_use]
  pub fn variant_index(&self, variant: &str) -> Option<usize> {
    self.metas.iter().position(|m| m.name == variant)
  }
}

/// Process-wide set of registered operations.
///
/// Built once during initialization, then treated as immutable.
#[derive(Default)]
pub struct Registry {
  entries: Vec<OpEntry>,
  by_name: HashMap<&'static str, usize>,
}

impl Registry {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Register an operation from raw parts.
  ///
  /// # Errors
  ///
  /// Returns [`DispatchError::RegistryInvariant`] on a duplicate operation
  /// name, a puppet/variant count mismatch, or a descriptor that does not
  /// have exactly one generic fallback.
  pub fn register(
    &mut self,
    name: &'static str,
    metas: Vec<VariantMeta>,
    puppets: Vec<PuppetFn>,
    shape: CanonShape,
  ) -> Result<(), DispatchError> {
    if self.by_name.contains_key(name) {
      return Err(DispatchError::RegistryInvariant {
        op: name,
        reason: "duplicate operation name",
      });
    }
    if metas.is_empty() {
      return Err(DispatchError::RegistryInvariant {
        op: name,
        reason: "descriptor has no variants",
      });
    }
    if metas.len() != puppets.len() {
      return Err(DispatchError::RegistryInvariant {
        op: name,
        reason: "variant and puppet counts differ",
      });
    }
    match metas.iter().filter(|m| m.is_generic()).count() {
      0 => {
        return Err(DispatchError::RegistryInvariant {
          op: name,
          reason: "missing generic fallback",
        });
      }
      1 => {}
      _ => {
        return Err(DispatchError::RegistryInvariant {
          op: name,
          reason: "more than one generic fallback",
        });
      }
    }

    self.by_name.insert(name, self.entries.len());
    self.entries.push(OpEntry {
      name,
      metas,
      puppets,
      shape,
    });
    Ok(())
  }

  /// Register a typed descriptor together with its puppets.
  ///
  /// The puppet slice must parallel the descriptor's declaration order.
  ///
  /// # Errors
  ///
  /// Same invariants as [`Registry::register`].
  pub fn register_descriptor<F: Copy + 'static>(
    &mut self,
    desc: &KernelDescriptor<F>,
    puppets: &[PuppetFn],
    shape: CanonShape,
  ) -> Result<(), DispatchError> {
    self.register(desc.name, desc.metas(), puppets.to_vec(), shape)
  }

  /// Look up an operation, or `None`.
  #[must_use]
  pub fn get(&self, name: &str) -> Option<&OpEntry> {
    self.by_name.get(name).and_then(|&i| self.entries.get(i))
  }

  /// Look up an operation, failing with [`DispatchError::UnknownOperation`].
  pub fn lookup(&self, name: &str) -> Result<&OpEntry, DispatchError> {
    self.get(name).ok_or_else(|| DispatchError::UnknownOperation(name.to_owned()))
  }

  /// Iterate over all operations in registration order.
  pub fn iter(&self) -> impl Iterator<Item = &OpEntry> {
    self.entries.iter()
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use vlk_platform::Extension;

  use super::*;
  use crate::adapter::{CheckMode, FillMode};
  use crate::descriptor::Alignment;

  fn noop_puppet(_out: &mut [u8], _ins: &[&[u8]], _len: usize) {}

  fn meta(name: &'static str, required: Option<Extension>) -> VariantMeta {
    VariantMeta {
      name,
      required,
      alignment: Alignment::Any,
    }
  }

  fn byte_shape() -> CanonShape {
    fn in_bytes(_input: usize, len: usize) -> usize {
      len
    }
    fn out_bytes(len: usize) -> usize {
      len
    }
    CanonShape {
      inputs: 1,
      in_bytes,
      out_bytes,
      check: CheckMode::Exact,
      fill: FillMode::Bytes,
    }
  }

  #[test]
  fn register_and_lookup() {
    let mut reg = Registry::new();
    reg
      .register(
        "op",
        vec![meta("fast", Some(Extension::Avx2)), meta("generic", None)],
        vec![noop_puppet, noop_puppet],
        byte_shape(),
      )
      .unwrap();

    let entry = reg.lookup("op").unwrap();
    assert_eq!(entry.name(), "op");
    assert_eq!(entry.generic_index(), 1);
    assert_eq!(entry.variant_index("fast"), Some(0));
    assert!(entry.puppet(1).is_some());
    assert!(entry.puppet(2).is_none());

    assert!(matches!(
      reg.lookup("nope"),
      Err(DispatchError::UnknownOperation(_))
    ));
  }

  #[test]
  fn duplicate_name_is_rejected() {
    let mut reg = Registry::new();
    reg
      .register("op", vec![meta("generic", None)], vec![noop_puppet], byte_shape())
      .unwrap();
    let err = reg
      .register("op", vec![meta("generic", None)], vec![noop_puppet], byte_shape())
      .unwrap_err();
    assert!(matches!(err, DispatchError::RegistryInvariant { op: "op", .. }));
  }

  #[test]
  fn missing_generic_fallback_is_rejected() {
    let mut reg = Registry::new();
    let err = reg
      .register(
        "op",
        vec![meta("fast", Some(Extension::Avx2))],
        vec![noop_puppet],
        byte_shape(),
      )
      .unwrap_err();
    assert!(matches!(
      err,
      DispatchError::RegistryInvariant {
        reason: "missing generic fallback",
        ..
      }
    ));
  }

  #[test]
  fn double_generic_is_rejected() {
    let mut reg = Registry::new();
    let err = reg
      .register(
        "op",
        vec![meta("a", None), meta("b", None)],
        vec![noop_puppet, noop_puppet],
        byte_shape(),
      )
      .unwrap_err();
    assert!(matches!(
      err,
      DispatchError::RegistryInvariant {
        reason: "more than one generic fallback",
        ..
      }
    ));
  }

  #[test]
  fn puppet_count_mismatch_is_rejected() {
    let mut reg = Registry::new();
    let err = reg
      .register("op", vec![meta("generic", None)], vec![], byte_shape())
      .unwrap_err();
    assert!(matches!(
      err,
      DispatchError::RegistryInvariant {
        reason: "variant and puppet counts differ",
        ..
      }
    ));
  }
}
