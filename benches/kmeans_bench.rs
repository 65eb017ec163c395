use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use survey_cluster::{AttributeValue, CentroidAlgorithm, CentroidInit, Comparator, KMeans, Response};

fn generate_survey(n_responses: usize, n_groups: usize) -> Vec<Response> {
    let mut rng = StdRng::seed_from_u64(42);

    (0..n_responses)
        .map(|i| {
            let group = (i % n_groups) as i64;
            let age = 18 + group * 10 + rng.gen_range(0..5);
            let devices: Vec<usize> = (0..5).filter(|_| rng.gen_bool(0.4)).collect();
            Response::synthetic(vec![
                AttributeValue::numeric(age, 18, 90),
                AttributeValue::single_choice(rng.gen_range(0..6), false, 6),
                AttributeValue::single_choice(rng.gen_range(0..5), true, 5),
                AttributeValue::multi_choice(devices, 5),
            ])
        })
        .collect()
}

fn bench_naive_vs_optimized(c: &mut Criterion) {
    let responses = generate_survey(500, 6);

    let mut group = c.benchmark_group("kmeans_variants");

    for &n_clusters in &[3, 6, 12] {
        for algorithm in [CentroidAlgorithm::NaiveKMeans, CentroidAlgorithm::OptimizedKMeans] {
            group.bench_with_input(
                BenchmarkId::new(format!("{algorithm:?}"), n_clusters),
                &n_clusters,
                |b, &k| {
                    let kmeans = KMeans::new(algorithm).max_iter(100);

                    b.iter(|| {
                        let mut rng = StdRng::seed_from_u64(7);
                        black_box(kmeans.fit(black_box(&responses), k, &Comparator, &mut rng).unwrap())
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_initialization_methods(c: &mut Criterion) {
    let responses = generate_survey(300, 4);

    let mut group = c.benchmark_group("kmeans_initialization");

    for (name, method) in [("random", CentroidInit::Random), ("kmeans++", CentroidInit::KMeansPlusPlus)] {
        group.bench_function(name, |b| {
            let kmeans = KMeans::new(CentroidAlgorithm::OptimizedKMeans)
                .init_method(method)
                .max_iter(50);

            b.iter(|| {
                let mut rng = StdRng::seed_from_u64(42);
                black_box(kmeans.fit(black_box(&responses), 4, &Comparator, &mut rng).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_data_size_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("kmeans_scaling");
    group.sample_size(20);

    for &n_responses in &[100, 500, 2000] {
        let responses = generate_survey(n_responses, 5);

        group.bench_with_input(BenchmarkId::from_parameter(n_responses), &responses, |b, responses| {
            let kmeans = KMeans::new(CentroidAlgorithm::OptimizedKMeans).max_iter(50);

            b.iter(|| {
                let mut rng = StdRng::seed_from_u64(42);
                black_box(kmeans.fit(black_box(responses), 5, &Comparator, &mut rng).unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_naive_vs_optimized,
    bench_initialization_methods,
    bench_data_size_scaling
);
criterion_main!(benches);
