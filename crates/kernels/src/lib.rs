//! Sample vector kernels wired through the dispatch core.
//!
//! Each module declares one operation (descriptor, puppets, size contract)
//! and exposes `<op>` / `<op>_aligned` entry points that resolve through
//! the shared [`DispatchTable`]. The set deliberately covers the awkward
//! shapes the adapter layer exists for: scalar outputs (`popcnt_u64`),
//! mixed element widths (`add_fc32`), approximate variants (`asin_f32`),
//! and 8:1 size ratios (`pack_bits`).

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use std::sync::{Arc, OnceLock};

use vlk_dispatch::{DispatchError, DispatchTable, Registry};

pub mod add;
pub mod asin;
pub mod pack;
pub mod popcnt;
pub mod xor;

pub use add::Cf32;

/// Build a registry holding every sample operation.
///
/// # Errors
///
/// [`DispatchError::RegistryInvariant`] if a descriptor is malformed; the
/// descriptors here are static, so a failure is a code bug.
pub fn build_registry() -> Result<Registry, DispatchError> {
  let mut reg = Registry::new();
  xor::register(&mut reg)?;
  popcnt::register(&mut reg)?;
  asin::register(&mut reg)?;
  add::register(&mut reg)?;
  pack::register(&mut reg)?;
  Ok(reg)
}

static TABLE: OnceLock<DispatchTable> = OnceLock::new();

/// The process-wide dispatch table over the detected capability set.
///
/// Built lazily on first use; preferences loaded from a profile must be
/// applied (via [`DispatchTable::apply_prefs`]) before the first kernel
/// call resolves anything.
///
/// # Panics
///
/// Panics if registration fails, which means a static descriptor violates
/// a registry invariant. The process cannot run without a usable registry.
pub fn table() -> &'static DispatchTable {
  TABLE.get_or_init(|| {
    let registry = match build_registry() {
      Ok(reg) => reg,
      Err(err) => panic!("kernel registration failed: {err}"),
    };
    DispatchTable::new(Arc::new(registry), vlk_platform::detect())
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn registry_holds_every_operation() {
    let reg = build_registry().unwrap();
    for name in [
      xor::NAME,
      popcnt::NAME,
      asin::NAME,
      add::NAME,
      pack::PACK_NAME,
      pack::UNPACK_NAME,
    ] {
      assert!(reg.get(name).is_some(), "missing {name}");
    }
    assert_eq!(reg.len(), 6);
  }

  #[test]
  fn every_operation_resolves_on_this_host() {
    let table = table();
    for entry in table.registry().iter() {
      let resolved = table.resolve(entry.name(), vlk_dispatch::Alignment::Any).unwrap();
      assert!(entry.puppet(resolved.index).is_some());
    }
  }
}
