//! End-to-end scenarios over the real kernel registry with simulated
//! hosts. Each test builds its own `DispatchTable` so the scenarios stay
//! independent of the process-global table and of each other.

use std::collections::BTreeMap;
use std::sync::Arc;

use vlk::{Alignment, CapabilitySet, DispatchTable, Extension, build_registry};

fn table_for(caps: CapabilitySet) -> DispatchTable {
  DispatchTable::new(Arc::new(build_registry().unwrap()), caps)
}

fn caps_with(exts: &[Extension]) -> CapabilitySet {
  let mut caps = CapabilitySet::new(vlk::ExtSet::NONE, 64);
  for &ext in exts {
    caps = caps.with_extension(ext);
  }
  caps
}

#[test]
fn capable_host_gets_the_accelerated_variant() {
  let table = table_for(caps_with(&[Extension::Avx2]));
  assert_eq!(table.resolve("xor_u8", Alignment::Any).unwrap().impl_name, "avx2");
  // Alignment guaranteed: the aligned-only variant wins (declared first).
  assert_eq!(table.resolve("xor_u8", Alignment::Required).unwrap().impl_name, "avx2_a");
}

#[test]
fn minimal_host_gets_generic_everywhere() {
  let table = table_for(CapabilitySet::minimal());
  for op in ["xor_u8", "popcnt_u64", "asin_f32", "add_fc32", "pack_bits", "unpack_bits"] {
    assert_eq!(
      table.resolve(op, Alignment::Any).unwrap().impl_name,
      "generic",
      "operation {op}"
    );
  }
}

#[test]
fn incomparable_extensions_coexist() {
  // Popcnt and Fma do not dominate each other; each op picks its own.
  let table = table_for(caps_with(&[Extension::Popcnt, Extension::Fma]));
  assert_eq!(table.resolve("popcnt_u64", Alignment::Any).unwrap().impl_name, "popcnt");
  assert_eq!(table.resolve("asin_f32", Alignment::Any).unwrap().impl_name, "fma");
  // No Avx2, so xor falls back.
  assert_eq!(table.resolve("xor_u8", Alignment::Any).unwrap().impl_name, "generic");
}

#[test]
fn pin_lasts_until_the_table_goes_away() {
  let caps = caps_with(&[Extension::Avx2]);

  let table = table_for(caps);
  assert_eq!(table.resolve("xor_u8", Alignment::Any).unwrap().impl_name, "avx2");
  table.pin("xor_u8", "generic").unwrap();
  assert_eq!(table.resolve("xor_u8", Alignment::Any).unwrap().impl_name, "generic");
  assert_eq!(table.resolve("xor_u8", Alignment::Required).unwrap().impl_name, "generic");
  drop(table);

  // A fresh table (new process) ranks from scratch.
  let fresh = table_for(caps);
  assert_eq!(fresh.resolve("xor_u8", Alignment::Any).unwrap().impl_name, "avx2");
}

#[test]
fn persisted_prefs_steer_resolution() {
  let mut prefs = BTreeMap::new();
  prefs.insert("xor_u8".to_owned(), "generic".to_owned());

  let table = table_for(caps_with(&[Extension::Avx2]));
  table.apply_prefs(prefs);
  assert_eq!(table.resolve("xor_u8", Alignment::Any).unwrap().impl_name, "generic");
  // Untouched operations still follow ranking.
  assert_eq!(table.resolve("pack_bits", Alignment::Any).unwrap().impl_name, "generic");
}

#[test]
fn prefs_round_trip_through_the_store() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("profile.json");

  let caps = caps_with(&[Extension::Avx2]);
  let host = vlk::HostId::of(&caps);
  let mut chosen = BTreeMap::new();
  chosen.insert("xor_u8".to_owned(), "avx2".to_owned());
  vlk::profile::prefs::save(&path, &host, &chosen).unwrap();

  let table = table_for(caps);
  table.apply_prefs(vlk::profile::prefs::load(&path, &host));
  assert_eq!(table.resolve("xor_u8", Alignment::Any).unwrap().impl_name, "avx2");

  // Another host's record does not leak in.
  let other = vlk::HostId::of(&CapabilitySet::minimal());
  assert!(vlk::profile::prefs::load(&path, &other).is_empty());
}

#[test]
fn concurrent_first_use_converges() {
  let table = Arc::new(table_for(caps_with(&[Extension::Avx2, Extension::Popcnt])));

  let mut handles = Vec::new();
  for _ in 0..8 {
    let table = Arc::clone(&table);
    handles.push(std::thread::spawn(move || {
      (
        table.resolve("xor_u8", Alignment::Any).unwrap(),
        table.resolve("popcnt_u64", Alignment::Any).unwrap(),
      )
    }));
  }

  let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
  for r in &results {
    assert_eq!(*r, results[0]);
  }
}

#[test]
fn entry_points_work_through_the_global_table() {
  vlk::init();

  let a: Vec<u8> = (0..1024).map(|i| i as u8).collect();
  let b: Vec<u8> = (0..1024).map(|i| (i as u8).wrapping_mul(7)).collect();
  let mut out = vec![0u8; 1024];
  vlk::kernels::xor::xor_u8(&mut out, &a, &b);
  for i in 0..1024 {
    assert_eq!(out[i], a[i] ^ b[i]);
  }

  let words = [0xffu64, 0, u64::MAX];
  assert_eq!(vlk::kernels::popcnt::popcnt_u64(&words), 72);
}
