//! Dispatch error taxonomy.
//!
//! Two very different kinds of failure live here:
//!
//! - [`DispatchError::RegistryInvariant`] is a build-time bug surfacing at
//!   startup (a descriptor without its generic fallback, a duplicate
//!   operation name). The process should not proceed with an unusable
//!   registry, so callers are expected to treat it as fatal.
//! - [`DispatchError::UnknownOperation`] / [`DispatchError::UnknownVariant`]
//!   are programmer errors on the caller's side, surfaced immediately
//!   rather than silently ignored.
//!
//! Recoverable conditions (a corrupt preferences file, detection being
//! unavailable) are deliberately *not* errors anywhere in this crate; they
//! degrade to safe defaults in the layers that own them.

use core::fmt;

/// Errors produced by the registry, selector, and dispatch table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
  /// A descriptor violated a registration invariant. Fatal.
  RegistryInvariant {
    op: &'static str,
    reason: &'static str,
  },

  /// No operation registered under this name.
  UnknownOperation(String),

  /// The operation exists but has no variant with this name.
  UnknownVariant { op: String, variant: String },
}

impl fmt::Display for DispatchError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::RegistryInvariant { op, reason } => {
        write!(f, "registry invariant violated for operation `{op}`: {reason}")
      }
      Self::UnknownOperation(op) => write!(f, "unknown operation `{op}`"),
      Self::UnknownVariant { op, variant } => {
        write!(f, "operation `{op}` has no variant `{variant}`")
      }
    }
  }
}

impl std::error::Error for DispatchError {}
