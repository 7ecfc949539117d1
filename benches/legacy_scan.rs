//! Benchmarks for the tolerant RAR 1.5-2.x header scanner.
//!
//! Run with: `cargo bench --bench legacy_scan`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rar_index::parsing::legacy::scan_window;
use rar_index::NameLengthLayout;

/// `junk` bytes of noise (with stray file-type tags) followed by a file header.
fn window(junk: usize) -> Vec<u8> {
    let mut out: Vec<u8> = (0..junk)
        .map(|i| if i % 97 == 0 { 0x74 } else { (i % 113) as u8 })
        .collect();
    let name = b"legacy.dat";
    out.extend_from_slice(&[0x00, 0x00, 0x74, 0x00, 0x00]);
    out.extend_from_slice(&((7 + 25 + name.len()) as u16).to_le_bytes());
    let mut fixed = [0u8; 25];
    fixed[0] = 0x10;
    fixed[4] = 0x10;
    fixed[18] = 0x30;
    fixed[19] = name.len() as u8;
    out.extend_from_slice(&fixed);
    out.extend_from_slice(name);
    out
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("legacy_scan");
    for junk in [64usize, 4 * 1024, 60 * 1024] {
        let data = window(junk);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(junk), &data, |b, data| {
            b.iter(|| scan_window(black_box(data), 7, NameLengthLayout::Canonical));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_scan);
criterion_main!(benches);
