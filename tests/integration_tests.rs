use rand::prelude::*;
use std::collections::HashSet;
use survey_cluster::{
    AlgorithmFamily, AnalysisConfig, Analyzer, AttributeValue, CentroidAlgorithm, CentroidInit,
    Cluster, Comparator, Error, KMeans, KMedoids, MedoidAlgorithm, MedoidInit, QualityEvaluator,
    Response, ResponseId, ResponseMetric,
};

fn numeric_responses(values: &[i64], max: i64) -> Vec<Response> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            Response::new(
                ResponseId::new("itest", format!("r{i}")),
                vec![AttributeValue::numeric(v, 0, max)],
            )
        })
        .collect()
}

/// Responses to a four-question survey: age, favourite colour, owned devices, ordered rating
fn random_survey(n: usize, seed: u64) -> Vec<Response> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let devices: Vec<usize> = (0..4).filter(|_| rng.gen_bool(0.5)).collect();
            let devices = if devices.is_empty() { vec![rng.gen_range(0..4)] } else { devices };
            Response::new(
                ResponseId::new("random", i.to_string()),
                vec![
                    AttributeValue::numeric(rng.gen_range(18..80), 18, 80),
                    AttributeValue::single_choice(rng.gen_range(0..5), false, 5),
                    AttributeValue::multi_choice(devices, 4),
                    AttributeValue::numeric(rng.gen_range(1..=5), 1, 5),
                ],
            )
        })
        .collect()
}

/// Short comments over a two-letter alphabet, where normalized edit
/// distance often breaks the triangle inequality
fn random_comments(n: usize, seed: u64) -> Vec<Response> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let words: Vec<String> = (0..rng.gen_range(1..=4))
                .map(|_| {
                    (0..rng.gen_range(1..=4))
                        .map(|_| if rng.gen_bool(0.5) { 'a' } else { 'b' })
                        .collect()
                })
                .collect();
            Response::new(
                ResponseId::new("comments", i.to_string()),
                vec![
                    AttributeValue::numeric(rng.gen_range(0..10), 0, 10),
                    AttributeValue::text(words.join(" ")),
                ],
            )
        })
        .collect()
}

/// Three well separated age groups of twenty
fn separated_groups() -> Vec<Response> {
    let values: Vec<i64> = (0..20).chain(500..520).chain(980..1000).collect();
    numeric_responses(&values, 1000)
}

#[test]
fn test_two_groups_end_to_end() {
    let responses = numeric_responses(&[0, 1, 2, 3, 7, 8, 9, 10], 10);

    for algorithm in [CentroidAlgorithm::NaiveKMeans, CentroidAlgorithm::OptimizedKMeans] {
        let seeds = vec![responses[1].clone(), responses[6].clone()];
        let result = KMeans::new(algorithm)
            .fit_from_seeds(&responses, seeds, &Comparator)
            .unwrap();

        assert!(result.converged);
        assert_eq!(result.labels.to_vec(), vec![0, 0, 0, 0, 1, 1, 1, 1]);

        let clusters = result.to_clusters(&responses).unwrap();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].members(), &responses[..4]);
        assert_eq!(clusters[1].members(), &responses[4..]);
    }
}

#[test]
fn test_naive_and_optimized_kmeans_agree() {
    for seed in 0..8 {
        let responses = random_survey(40, seed);

        for k in [2, 3, 5] {
            let naive = KMeans::new(CentroidAlgorithm::NaiveKMeans)
                .fit(&responses, k, &Comparator, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            let optimized = KMeans::new(CentroidAlgorithm::OptimizedKMeans)
                .fit(&responses, k, &Comparator, &mut StdRng::seed_from_u64(seed))
                .unwrap();

            assert_eq!(naive.labels, optimized.labels, "seed {seed}, k {k}");
            assert_eq!(naive.n_iter, optimized.n_iter, "seed {seed}, k {k}");
            assert_eq!(naive.converged, optimized.converged);
            assert_eq!(naive.representatives, optimized.representatives);
        }
    }
}

#[test]
fn test_naive_and_optimized_kmeans_agree_with_free_text() {
    for seed in 0..300 {
        let responses = random_comments(8, seed);
        let k = 2 + (seed % 2) as usize;

        let naive = KMeans::new(CentroidAlgorithm::NaiveKMeans)
            .fit(&responses, k, &Comparator, &mut StdRng::seed_from_u64(seed))
            .unwrap();
        let optimized = KMeans::new(CentroidAlgorithm::OptimizedKMeans)
            .fit(&responses, k, &Comparator, &mut StdRng::seed_from_u64(seed))
            .unwrap();

        assert_eq!(naive.labels, optimized.labels, "seed {seed}, k {k}");
        assert_eq!(naive.n_iter, optimized.n_iter, "seed {seed}, k {k}");
    }
}

#[test]
fn test_optimized_kmeans_prunes_distance_evaluations() {
    let responses = separated_groups();
    let seeds = vec![responses[0].clone(), responses[20].clone(), responses[40].clone()];

    let naive = KMeans::new(CentroidAlgorithm::NaiveKMeans)
        .fit_from_seeds(&responses, seeds.clone(), &Comparator)
        .unwrap();
    let optimized = KMeans::new(CentroidAlgorithm::OptimizedKMeans)
        .fit_from_seeds(&responses, seeds, &Comparator)
        .unwrap();

    assert_eq!(naive.labels, optimized.labels);
    assert!(
        optimized.distance_evaluations < naive.distance_evaluations,
        "optimized {} vs naive {}",
        optimized.distance_evaluations,
        naive.distance_evaluations
    );
}

#[test]
fn test_kmedoids_never_increases_cost() {
    for seed in 0..5 {
        let responses = random_survey(30, seed);
        let mut rng = StdRng::seed_from_u64(seed);
        let start: Vec<usize> = rand::seq::index::sample(&mut rng, responses.len(), 4).into_vec();

        let initial_cost: f64 = responses
            .iter()
            .map(|response| {
                start
                    .iter()
                    .map(|&m| Comparator.distance(response, &responses[m]))
                    .fold(f64::INFINITY, f64::min)
            })
            .sum();

        for algorithm in [MedoidAlgorithm::NaivePam, MedoidAlgorithm::FasterPam] {
            let result = KMedoids::new(algorithm)
                .fit_from_medoids(&responses, start.clone(), &Comparator)
                .unwrap();

            assert!(result.cost <= initial_cost + 1e-9, "{algorithm:?} seed {seed}");

            let medoids = result.medoid_indices.clone().unwrap();
            let unique: HashSet<_> = medoids.iter().collect();
            assert_eq!(unique.len(), 4);
            for (representative, &m) in result.representatives.iter().zip(&medoids) {
                assert_eq!(representative, &responses[m]);
            }
        }
    }
}

#[test]
fn test_kmedoids_finds_separated_groups() {
    let responses = separated_groups();

    for algorithm in [MedoidAlgorithm::NaivePam, MedoidAlgorithm::FasterPam] {
        let result = KMedoids::new(algorithm)
            .fit(&responses, 3, &Comparator, &mut StdRng::seed_from_u64(5))
            .unwrap();

        assert!(result.converged);
        let clusters = result.to_clusters(&responses).unwrap();
        let mut sizes: Vec<usize> = clusters.iter().map(Cluster::len).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![20, 20, 20]);
    }
}

#[test]
fn test_analyzer_every_family() {
    let responses = separated_groups();
    let families = [
        AlgorithmFamily::centroid(CentroidAlgorithm::NaiveKMeans, CentroidInit::KMeansPlusPlus),
        AlgorithmFamily::centroid(CentroidAlgorithm::OptimizedKMeans, CentroidInit::Random),
        AlgorithmFamily::medoid(MedoidAlgorithm::NaivePam, MedoidInit::GreedyMedoid),
        AlgorithmFamily::medoid(MedoidAlgorithm::FasterPam, MedoidInit::KMeansPlusPlus),
    ];

    for family in families {
        let mut analyzer = Analyzer::new(AnalysisConfig::new(3).family(family).random_state(11));
        analyzer.analyze(&responses).unwrap();

        let clusters = analyzer.resulting_clusters();
        assert_eq!(clusters.len(), 3, "{family:?}");
        assert_eq!(clusters.iter().map(Cluster::len).sum::<usize>(), 60);

        for evaluator in [
            QualityEvaluator::Silhouette,
            QualityEvaluator::DaviesBouldin,
            QualityEvaluator::CalinskiHarabasz,
        ] {
            analyzer.select_quality_evaluator(evaluator);
            let score = analyzer.evaluate_quality().unwrap();
            assert!(score.is_finite(), "{family:?} {evaluator:?}");
        }
    }
}

#[test]
fn test_quality_prefers_true_partition() {
    let responses = separated_groups();
    let good = vec![
        Cluster::new(responses[..20].to_vec()),
        Cluster::new(responses[20..40].to_vec()),
        Cluster::new(responses[40..].to_vec()),
    ];
    let shuffled = vec![
        Cluster::new(responses.iter().step_by(3).cloned().collect()),
        Cluster::new(responses.iter().skip(1).step_by(3).cloned().collect()),
        Cluster::new(responses.iter().skip(2).step_by(3).cloned().collect()),
    ];

    for evaluator in [
        QualityEvaluator::Silhouette,
        QualityEvaluator::DaviesBouldin,
        QualityEvaluator::CalinskiHarabasz,
    ] {
        let good_score = evaluator.evaluate(&good, &Comparator).unwrap();
        let bad_score = evaluator.evaluate(&shuffled, &Comparator).unwrap();
        if evaluator.higher_is_better() {
            assert!(good_score > bad_score, "{evaluator:?}");
        } else {
            assert!(good_score < bad_score, "{evaluator:?}");
        }
    }
}

#[test]
fn test_analyzer_errors() {
    let mut analyzer = Analyzer::new(AnalysisConfig::new(4).random_state(1));
    let responses = numeric_responses(&[1, 2, 3], 10);

    assert_eq!(analyzer.evaluate_quality(), Err(Error::NotAnalyzed));
    assert_eq!(analyzer.analyze(&[]), Err(Error::EmptyResponseSet));
    assert_eq!(
        analyzer.analyze(&responses),
        Err(Error::TooManyClusters { k: 4, n: 3 })
    );

    analyzer.set_cluster_count(0);
    assert_eq!(analyzer.analyze(&responses), Err(Error::KTooSmall { k: 0 }));
    assert!(analyzer.resulting_clusters().is_empty());
}

#[test]
fn test_auto_select_then_analyze() {
    let responses = separated_groups();
    let family = AlgorithmFamily::medoid(MedoidAlgorithm::FasterPam, MedoidInit::GreedyMedoid);
    let mut analyzer = Analyzer::new(
        AnalysisConfig::default()
            .family(family)
            .random_state(3)
            .elbow_threshold(0.3),
    );

    let k = analyzer.auto_select_cluster_count(&responses).unwrap();
    assert_eq!(k, 3);

    analyzer.analyze(&responses).unwrap();
    assert_eq!(analyzer.resulting_clusters().len(), 3);
}

#[test]
fn test_free_text_answers_cluster_by_wording() {
    let answers = [
        "servicio excelente",
        "servicio excelente!!",
        "el servicio excelente",
        "comida fria",
        "la comida fria",
        "comida muy fria",
    ];
    let responses: Vec<Response> = answers
        .iter()
        .enumerate()
        .map(|(i, text)| {
            Response::new(
                ResponseId::new("text", i.to_string()),
                vec![AttributeValue::text(*text)],
            )
        })
        .collect();

    let result = KMedoids::new(MedoidAlgorithm::NaivePam)
        .fit_from_medoids(&responses, vec![0, 3], &Comparator)
        .unwrap();

    assert_eq!(result.labels.to_vec(), vec![0, 0, 0, 1, 1, 1]);
}

#[test]
fn test_independent_sessions_do_not_interfere() {
    let responses = separated_groups();
    let config = AnalysisConfig::new(3).random_state(21);

    let mut first = Analyzer::new(config.clone());
    let mut second = Analyzer::new(config);
    first.analyze(&responses).unwrap();
    second.analyze(&responses[..40]).unwrap();
    let again = {
        let mut third = Analyzer::new(AnalysisConfig::new(3).random_state(21));
        third.analyze(&responses).unwrap();
        third.last_result().unwrap().labels.clone()
    };

    assert_eq!(first.last_result().unwrap().labels, again);
    assert_eq!(second.resulting_clusters().iter().map(Cluster::len).sum::<usize>(), 40);
}
