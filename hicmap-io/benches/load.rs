use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use hicmap_io::{load_contact_map_from_reader, LoadConfig, RecordFormat};
use hicmap_matrix::Layout;

fn random_pairs(records: usize, span: u64, seed: u64) -> String {
    let mut state = seed;
    let mut next = || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (state >> 33) % span
    };
    let mut out = String::with_capacity(records * 32);
    for i in 0..records {
        let a = next();
        let b = (a + next() / 16).min(span - 1);
        out.push_str(&format!("r{i} chr1 {a} chr1 {b} 1\n"));
    }
    out
}

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");
    let text = random_pairs(100_000, 10_000_000, 42);
    group.throughput(Throughput::Elements(100_000));

    for layout in [Layout::Dense, Layout::Sparse] {
        let config = LoadConfig::new(RecordFormat::Long, 50_000)
            .with_chromosome("chr1")
            .with_layout(layout);
        group.bench_function(format!("long_100k_{layout}"), |b| {
            b.iter(|| load_contact_map_from_reader(Cursor::new(black_box(text.as_bytes())), &config))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_load);
criterion_main!(benches);
