//! Kernel descriptors: one logical operation, many interchangeable variants.
//!
//! A [`KernelDescriptor`] is static metadata declared by each kernel module
//! at build time: the operation name plus an ordered list of [`Variant`]s.
//! Declaration order matters — it is the registration order the selector
//! uses to break ties among incomparable extensions.

use vlk_platform::Extension;

/// Pointer-alignment assumption of a variant.
///
/// `Required` means every buffer handed to the variant must sit on the
/// platform alignment boundary. An aligned-only variant must never be
/// called with unguaranteed pointers; that is a correctness constraint,
/// not a performance preference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Alignment {
  /// Works with any pointer.
  Any,
  /// All buffers must be aligned to the platform boundary.
  Required,
}

/// Capability and alignment metadata of one variant, without the function
/// handle. This is what the registry and selector operate on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VariantMeta {
  /// Variant name for diagnostics and persisted profiles (e.g. "avx2").
  pub name: &'static str,
  /// Required extension; `None` marks the universal generic fallback.
  pub required: Option<Extension>,
  /// Pointer-alignment assumption.
  pub alignment: Alignment,
}

impl VariantMeta {
  /// Whether this is the generic fallback (no required extension).
  #[inline]
  #[must_use]
  pub const fn is_generic(&self) -> bool {
    self.required.is_none()
  }
}

/// One concrete implementation of an operation, tagged with its
/// preconditions.
///
/// `F` is the operation's native function-pointer type; all variants of one
/// descriptor share it.
#[derive(Clone, Copy, Debug)]
pub struct Variant<F> {
  pub meta: VariantMeta,
  pub func: F,
}

impl<F> Variant<F> {
  /// Declare a variant.
  #[inline]
  #[must_use]
  pub const fn new(name: &'static str, required: Option<Extension>, alignment: Alignment, func: F) -> Self {
    Self {
      meta: VariantMeta {
        name,
        required,
        alignment,
      },
      func,
    }
  }
}

/// Static descriptor of one logical operation.
pub struct KernelDescriptor<F: 'static> {
  /// Globally unique operation name (e.g. "xor_u8").
  pub name: &'static str,
  /// Variants in declaration order.
  pub variants: &'static [Variant<F>],
}

impl<F: Copy + 'static> KernelDescriptor<F> {
  #[inline]
  #[must_use]
  pub const fn new(name: &'static str, variants: &'static [Variant<F>]) -> Self {
    Self { name, variants }
  }

  /// Metadata of every variant, in declaration order.
  #[must_use]
  pub fn metas(&self) -> Vec<VariantMeta> {
    self.variants.iter().map(|v| v.meta).collect()
  }

  /// Function handle of the variant at `index`, if in range.
  #[inline]
  #[must_use]
  pub fn func(&self, index: usize) -> Option<F> {
    self.variants.get(index).map(|v| v.func)
  }

  /// The generic fallback's function handle.
  ///
  /// Returns the first variant with no required extension; descriptors
  /// registered through the registry are guaranteed to have exactly one.
  #[must_use]
  pub fn generic_func(&self) -> Option<F> {
    self.variants.iter().find(|v| v.meta.is_generic()).map(|v| v.func)
  }
}
