use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hicmap_matrix::{ContactMatrix, DenseMatrix, Layout};
use hicmap_stats::{compartments, normalize, reproducibility, smooth, Normalization};

fn random_map(n: usize, seed: u64) -> DenseMatrix {
    let mut state = seed;
    let mut m = DenseMatrix::zeros(n);
    for i in 0..n {
        for j in i..n {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let noise = (state >> 11) as f64 / (1u64 << 53) as f64;
            let v = 100.0 / (1.0 + i.abs_diff(j) as f64) * (0.5 + noise);
            m[(i, j)] = v;
            m[(j, i)] = v;
        }
    }
    m
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    let matrix = ContactMatrix::Dense(random_map(200, 42)).into_layout(Layout::Sparse);

    for name in ["log", "oe", "vc", "ic", "kr"] {
        let method = match Normalization::from_name(name) {
            Ok(method) => method,
            Err(_) => continue,
        };
        group.bench_with_input(BenchmarkId::new("sparse_200", name), &method, |b, method| {
            b.iter(|| normalize(black_box(&matrix), method))
        });
    }

    group.finish();
}

fn bench_reproducibility(c: &mut Criterion) {
    let mut group = c.benchmark_group("reproducibility");
    let a = ContactMatrix::Dense(random_map(500, 1));
    let b = ContactMatrix::Dense(random_map(500, 2));

    for &h in &[0usize, 3, 11] {
        group.bench_with_input(BenchmarkId::new("500_bins", h), &h, |bench, &h| {
            bench.iter(|| reproducibility(black_box(&a), black_box(&b), 100, h))
        });
    }

    group.bench_function("smooth_500_h11", |bench| bench.iter(|| smooth(black_box(&a), 11)));
    group.finish();
}

fn bench_compartments(c: &mut Criterion) {
    let m = ContactMatrix::Dense(random_map(100, 7));
    c.bench_function("compartments_100", |b| b.iter(|| compartments(black_box(&m), 1)));
}

criterion_group!(benches, bench_normalize, bench_reproducibility, bench_compartments);
criterion_main!(benches);
