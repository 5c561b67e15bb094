//! Facade over the vlk workspace: detection, dispatch, kernels, profiles.
//!
//! Most programs need three things from here:
//!
//! ```no_run
//! vlk::init_with_prefs(&vlk::profile_path());
//!
//! let (a, b) = (vec![1u8; 1024], vec![2u8; 1024]);
//! let mut out = vec![0u8; 1024];
//! vlk::kernels::xor::xor_u8(&mut out, &a, &b);
//! ```
//!
//! [`init`] forces detection and registration up front (otherwise both
//! happen lazily on the first kernel call); [`init_with_prefs`] also loads
//! this host's persisted profile into the dispatch table. Profiles are
//! produced by the `vlk-profile` binary.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use std::path::{Path, PathBuf};

pub use vlk_dispatch::{
  Alignment, DispatchError, DispatchTable, KernelDescriptor, Registry, Resolved, Variant,
  VariantMeta,
};
pub use vlk_kernels as kernels;
pub use vlk_kernels::{Cf32, build_registry, table};
pub use vlk_platform::{CapabilitySet, ExtSet, Extension, detect};
pub use vlk_profile as profile;
pub use vlk_profile::{HostId, ProfileError};

/// Force capability detection and kernel registration now instead of on
/// the first kernel call.
pub fn init() {
  let _ = table();
}

/// [`init`], plus this host's persisted profile.
///
/// Must run before the first kernel call to take full effect: preferences
/// only steer resolutions that have not been cached yet. A missing or
/// unreadable profile is not an error; dispatch falls back to the static
/// preference order.
pub fn init_with_prefs(path: &Path) {
  let table = table();
  let host = HostId::of(&table.caps());
  table.apply_prefs(vlk_profile::prefs::load(path, &host));
}

/// The default profile location used by `vlk-profile`.
#[must_use]
pub fn profile_path() -> PathBuf {
  vlk_profile::prefs::default_path()
}
