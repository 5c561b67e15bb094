//! The dispatch table: lazy, memoized operation → variant resolution.
//!
//! One table serves a whole process (or one simulated host in tests). It
//! owns the registry, a capability snapshot, and two caches:
//!
//! - `prefs`: the persisted per-host choices injected once at startup
//!   (the table itself never touches the filesystem — resolution sits on
//!   latency-critical paths and must not block on I/O);
//! - `entries`: the resolved `(operation, alignment hint)` slots.
//!
//! Resolution is compute-outside-lock, publish-once: concurrent first
//! calls may rank redundantly, but ranking is pure and deterministic, so
//! whichever insert wins publishes the same answer every later call
//! observes. Entries are never deleted; [`DispatchTable::pin`] overwrites
//! them explicitly.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use vlk_platform::CapabilitySet;

use crate::descriptor::Alignment;
use crate::error::DispatchError;
use crate::registry::Registry;
use crate::select;

/// A resolved choice: variant name plus its index in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolved {
  pub impl_name: &'static str,
  pub index: usize,
}

/// Process-wide dispatch cache. See the module docs.
pub struct DispatchTable {
  registry: Arc<Registry>,
  caps: CapabilitySet,
  prefs: RwLock<BTreeMap<String, String>>,
  entries: RwLock<HashMap<(&'static str, Alignment), Resolved>>,
}

impl DispatchTable {
  /// Build a table over a validated registry and a capability snapshot.
  #[must_use]
  pub fn new(registry: Arc<Registry>, caps: CapabilitySet) -> Self {
    Self {
      registry,
      caps,
      prefs: RwLock::new(BTreeMap::new()),
      entries: RwLock::new(HashMap::new()),
    }
  }

  /// The capability snapshot this table selects against.
  #[inline]
  #[must_use]
  pub fn caps(&self) -> CapabilitySet {
    self.caps
  }

  /// The registry behind this table.
  #[inline]
  #[must_use]
  pub fn registry(&self) -> &Registry {
    &self.registry
  }

  /// Seed persisted per-operation preferences.
  ///
  /// Call during startup, before first resolution: preferences only
  /// influence slots that have not been resolved yet. A preferred variant
  /// is honored only if ranking deems it legal for the host and hint;
  /// anything else (stale profile, renamed variant) silently falls back
  /// to the ranked choice.
  pub fn apply_prefs(&self, prefs: BTreeMap<String, String>) {
    if let Ok(mut guard) = self.prefs.write() {
      guard.extend(prefs);
    }
  }

  /// Resolve an operation for the given alignment guarantee.
  ///
  /// First call per `(op, hint)` consults the preferences, then the
  /// selector; every later call is a cache hit.
  ///
  /// # Errors
  ///
  /// [`DispatchError::UnknownOperation`] for an unregistered name;
  /// [`DispatchError::RegistryInvariant`] if no variant is eligible
  /// (impossible for a registry-validated descriptor).
  pub fn resolve(&self, op: &str, hint: Alignment) -> Result<Resolved, DispatchError> {
    let entry = self.registry.lookup(op)?;
    let key = (entry.name(), hint);

    if let Ok(guard) = self.entries.read() {
      if let Some(resolved) = guard.get(&key) {
        return Ok(*resolved);
      }
    }

    // Slow path: rank outside the lock (pure, so redundant concurrent
    // computation is harmless) and publish once.
    let order = select::rank(entry.metas(), &self.caps, hint);
    let head = *order.first().ok_or(DispatchError::RegistryInvariant {
      op: entry.name(),
      reason: "no eligible implementation",
    })?;

    let preferred = self
      .prefs
      .read()
      .ok()
      .and_then(|prefs| prefs.get(entry.name()).cloned())
      .and_then(|name| {
        order
          .iter()
          .copied()
          .find(|&i| entry.metas().get(i).is_some_and(|m| m.name == name))
      });

    let index = preferred.unwrap_or(head);
    let resolved = Resolved {
      impl_name: entry.metas().get(index).map_or("generic", |m| m.name),
      index,
    };

    match self.entries.write() {
      Ok(mut guard) => Ok(*guard.entry(key).or_insert(resolved)),
      // A poisoned lock means another thread panicked mid-insert; the
      // computed choice is still valid for this call.
      Err(_) => Ok(resolved),
    }
  }

  /// Force an operation to a specific variant, bypassing ranking.
  ///
  /// Used by the harness to exercise every variant and by advanced users
  /// pinning a known-good implementation. The pin fills both alignment
  /// slots, except that an aligned-only variant is never installed into
  /// the unaligned slot — that rule is a correctness constraint and
  /// outranks the pin. Pins last until process end (or table drop).
  ///
  /// # Errors
  ///
  /// [`DispatchError::UnknownOperation`] / [`DispatchError::UnknownVariant`]
  /// for bad names; both are programmer errors.
  pub fn pin(&self, op: &str, variant: &str) -> Result<(), DispatchError> {
    let entry = self.registry.lookup(op)?;
    let index = entry
      .variant_index(variant)
      .ok_or_else(|| DispatchError::UnknownVariant {
        op: op.to_owned(),
        variant: variant.to_owned(),
      })?;
    let meta = entry.metas().get(index).copied().ok_or_else(|| DispatchError::UnknownVariant {
      op: op.to_owned(),
      variant: variant.to_owned(),
    })?;

    let resolved = Resolved {
      impl_name: meta.name,
      index,
    };

    if let Ok(mut guard) = self.entries.write() {
      guard.insert((entry.name(), Alignment::Required), resolved);
      if meta.alignment == Alignment::Any {
        guard.insert((entry.name(), Alignment::Any), resolved);
      }
    }
    Ok(())
  }

  /// The cached choice for `(op, hint)`, if one has been published.
  #[must_use]
  pub fn chosen(&self, op: &str, hint: Alignment) -> Option<Resolved> {
    let entry = self.registry.get(op)?;
    self
      .entries
      .read()
      .ok()
      .and_then(|guard| guard.get(&(entry.name(), hint)).copied())
  }
}
