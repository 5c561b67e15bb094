//! `xor_u8` variant benchmarks.
//!
//! Run: `cargo bench -p vlk-kernels -- xor`
//!
//! Compares the dispatched entry point against the pinned generic variant
//! to show what selection buys on this host.

use core::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use vlk_kernels::xor::{NAME, xor_u8};

const CASES: &[(&str, usize)] = &[
  ("s", 256),
  ("m", 4 * 1024),
  ("l", 64 * 1024),
];

fn make_data(len: usize, seed: u8) -> Vec<u8> {
  (0..len)
    .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
    .collect()
}

fn bench_xor_dispatched(c: &mut Criterion) {
  let mut group = c.benchmark_group("xor/dispatched");
  for &(tag, len) in CASES {
    let a = make_data(len, 1);
    let b = make_data(len, 77);
    let mut out = vec![0u8; len];

    group.throughput(Throughput::Bytes(len as u64));
    group.bench_with_input(BenchmarkId::from_parameter(tag), &len, |bench, _| {
      bench.iter(|| {
        xor_u8(black_box(&mut out), black_box(&a), black_box(&b));
      });
    });
  }
  group.finish();
}

fn bench_xor_generic(c: &mut Criterion) {
  // Pin the generic variant so the same entry point runs scalar code.
  vlk_kernels::table().pin(NAME, "generic").unwrap();

  let mut group = c.benchmark_group("xor/generic");
  for &(tag, len) in CASES {
    let a = make_data(len, 1);
    let b = make_data(len, 77);
    let mut out = vec![0u8; len];

    group.throughput(Throughput::Bytes(len as u64));
    group.bench_with_input(BenchmarkId::from_parameter(tag), &len, |bench, _| {
      bench.iter(|| {
        xor_u8(black_box(&mut out), black_box(&a), black_box(&b));
      });
    });
  }
  group.finish();
}

criterion_group!(benches, bench_xor_dispatched, bench_xor_generic);
criterion_main!(benches);
