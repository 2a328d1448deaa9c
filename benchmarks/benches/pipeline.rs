use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cytoscan::{
    DatasetProvider, EmbeddedCorpus, FittingStage, MemoryArtifactStore, Pipeline, N_FEATURES,
};

fn reference_rows(n: usize) -> Vec<Vec<f64>> {
    let corpus = EmbeddedCorpus.load().expect("embedded corpus");
    (0..n.min(corpus.len()))
        .map(|i| corpus.row(i).to_vec())
        .collect()
}

fn bench_predict_single(c: &mut Criterion) {
    let pipeline = Pipeline::new(MemoryArtifactStore::new(), EmbeddedCorpus);
    let sample = reference_rows(1).remove(0);
    pipeline.predict(&sample).expect("warm-up prediction");

    c.bench_function("predict_single", |b| {
        b.iter(|| {
            let p = pipeline.predict(black_box(&sample)).unwrap();
            black_box(p);
        });
    });
}

fn bench_predict_many(c: &mut Criterion) {
    let pipeline = Pipeline::new(MemoryArtifactStore::new(), EmbeddedCorpus);
    pipeline.resolve().expect("fitted pipeline");

    for n in [10usize, 100, 569].iter() {
        let rows = reference_rows(*n);
        c.bench_with_input(BenchmarkId::new("predict_rows", n), &rows, |b, rows| {
            b.iter(|| {
                for row in rows {
                    black_box(pipeline.predict(black_box(row)).unwrap());
                }
            });
        });
    }
}

fn bench_validation_only(c: &mut Criterion) {
    let pipeline = Pipeline::new(MemoryArtifactStore::new(), EmbeddedCorpus);
    let short = vec![1.0; N_FEATURES - 1];

    c.bench_function("reject_wrong_length", |b| {
        b.iter(|| {
            black_box(pipeline.predict(black_box(&short)).unwrap_err());
        });
    });
}

fn bench_fit(c: &mut Criterion) {
    let corpus = EmbeddedCorpus.load().expect("embedded corpus");
    let stage = FittingStage::default();

    let mut group = c.benchmark_group("fit");
    group.sample_size(10);
    group.bench_function("reference_corpus", |b| {
        b.iter(|| black_box(stage.fit(black_box(&corpus)).unwrap()));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_predict_single,
    bench_predict_many,
    bench_validation_only,
    bench_fit
);
criterion_main!(benches);
