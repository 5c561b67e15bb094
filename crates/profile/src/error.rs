//! Harness error taxonomy.
//!
//! Unlike the dispatch core, the harness does real I/O and real output
//! comparison, so it has genuinely recoverable failures. A corrupt or
//! missing prefs file is still *not* an error (loading degrades to the
//! empty mapping); these variants cover what cannot be papered over.

use core::fmt;
use std::io;

use vlk_dispatch::DispatchError;

/// Errors produced by verification, benchmarking, and profile persistence.
#[derive(Debug)]
pub enum ProfileError {
  /// Filesystem failure while persisting a profile.
  Io(String),

  /// The registry or table rejected an operation or variant name.
  Dispatch(DispatchError),

  /// An operation had no variant legal on this host. Unreachable for a
  /// registry-validated descriptor; kept so the engine never panics.
  NoKernels(&'static str),

  /// A variant disagreed with the generic reference output.
  Mismatch {
    op: &'static str,
    variant: &'static str,
    detail: String,
  },
}

impl fmt::Display for ProfileError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Io(msg) => write!(f, "profile i/o failure: {msg}"),
      Self::Dispatch(err) => write!(f, "dispatch failure: {err}"),
      Self::NoKernels(op) => write!(f, "operation `{op}` has no legal variant on this host"),
      Self::Mismatch { op, variant, detail } => {
        write!(f, "operation `{op}` variant `{variant}` diverges from the generic reference: {detail}")
      }
    }
  }
}

impl std::error::Error for ProfileError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Dispatch(err) => Some(err),
      _ => None,
    }
  }
}

impl From<io::Error> for ProfileError {
  fn from(err: io::Error) -> Self {
    Self::Io(err.to_string())
  }
}

impl From<DispatchError> for ProfileError {
  fn from(err: DispatchError) -> Self {
    Self::Dispatch(err)
  }
}
