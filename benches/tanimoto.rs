//! Tanimoto Benchmarks
//!
//! Run with: cargo bench --bench tanimoto

use std::sync::atomic::AtomicBool;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use morgan_fps::fingerprint::{counts_scalar, intersection_union};
use morgan_fps::{tanimoto, Fingerprint, FingerprintBatch, SimilarityStore};

fn random_fingerprint(rng: &mut StdRng) -> Fingerprint {
    let mut words = [0u64; 32];
    for w in &mut words {
        // roughly 1 in 8 bits set, close to real Morgan density
        *w = rng.gen::<u64>() & rng.gen::<u64>() & rng.gen::<u64>();
    }
    Fingerprint::from_words(words)
}

fn bench_kernel(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let a = random_fingerprint(&mut rng);
    let b = random_fingerprint(&mut rng);

    let mut group = c.benchmark_group("tanimoto_kernel");
    group.throughput(Throughput::Elements(1));
    group.bench_function("dispatch", |bencher| {
        bencher.iter(|| tanimoto(black_box(&a), black_box(&b)))
    });
    group.bench_function("counts", |bencher| {
        bencher.iter(|| intersection_union(black_box(&a), black_box(&b)))
    });
    group.bench_function("counts_scalar", |bencher| {
        bencher.iter(|| counts_scalar(black_box(a.words()), black_box(b.words())))
    });
    group.finish();
}

fn bench_threshold(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(2);
    let sizes = [250usize, 1_000];

    let mut group = c.benchmark_group("tanimoto_threshold");
    group.sample_size(10);

    for n in sizes {
        let encoded: Vec<String> = (0..n)
            .map(|_| random_fingerprint(&mut rng).to_hex())
            .collect();
        let store = SimilarityStore::from_batch(&FingerprintBatch::new(encoded)).unwrap();
        let cancel = AtomicBool::new(false);

        group.throughput(Throughput::Elements((n * (n - 1) / 2) as u64));
        group.bench_function(format!("n_{}", n), |bencher| {
            bencher.iter(|| store.tanimoto_threshold(black_box(0.7), &cancel).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_kernel, bench_threshold);
criterion_main!(benches);
