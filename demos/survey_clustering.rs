//! Survey clustering walkthrough
//!
//! Builds a small customer-satisfaction survey, picks a cluster count with
//! the elbow heuristic, then compares every algorithm family by quality score.
//! Run with `RUST_LOG=debug` to watch the iterations.

use survey_cluster::{
    AlgorithmFamily, AnalysisConfig, Analyzer, AttributeValue, CentroidAlgorithm, CentroidInit,
    MedoidAlgorithm, MedoidInit, QualityEvaluator, Response, ResponseId,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let responses = build_survey();
    println!("Loaded {} responses", responses.len());
    println!();

    // Example 1: choose k
    println!("=== Example 1: Choosing the number of clusters ===");
    let mut analyzer = Analyzer::new(AnalysisConfig::default().random_state(42).elbow_threshold(0.2));
    let k = analyzer.auto_select_cluster_count(&responses)?;
    println!("Elbow heuristic picked k = {k}");
    println!();

    // Example 2: compare families
    println!("=== Example 2: Comparing algorithms ===");
    let families = [
        ("Lloyd + K-Means++", AlgorithmFamily::centroid(CentroidAlgorithm::NaiveKMeans, CentroidInit::KMeansPlusPlus)),
        ("Elkan + K-Means++", AlgorithmFamily::centroid(CentroidAlgorithm::OptimizedKMeans, CentroidInit::KMeansPlusPlus)),
        ("PAM + greedy", AlgorithmFamily::medoid(MedoidAlgorithm::NaivePam, MedoidInit::GreedyMedoid)),
        ("FasterPAM + greedy", AlgorithmFamily::medoid(MedoidAlgorithm::FasterPam, MedoidInit::GreedyMedoid)),
    ];

    for (name, family) in families {
        analyzer.select_algorithm_family(family);
        analyzer.analyze(&responses)?;

        let result = analyzer.last_result().ok_or("no result stored")?;
        print!(
            "{name:20} iterations={:2} distances={:5} cost={:7.3}",
            result.n_iter, result.distance_evaluations, result.cost
        );
        for evaluator in [
            QualityEvaluator::Silhouette,
            QualityEvaluator::DaviesBouldin,
            QualityEvaluator::CalinskiHarabasz,
        ] {
            analyzer.select_quality_evaluator(evaluator);
            print!(" {evaluator:?}={:.3}", analyzer.evaluate_quality()?);
        }
        println!();
    }
    println!();

    // Example 3: inspect clusters
    println!("=== Example 3: Cluster contents ===");
    for (i, cluster) in analyzer.resulting_clusters().iter().enumerate() {
        let respondents: Vec<&str> = cluster
            .iter()
            .filter_map(|r| r.id().map(|id| id.respondent.as_str()))
            .collect();
        println!("Cluster {i}: {respondents:?}");
    }

    Ok(())
}

fn build_survey() -> Vec<Response> {
    // (age, visits per month, preferred channel, satisfaction 1-5, services used, comment)
    let rows: [(i64, i64, usize, usize, &[usize], &str); 12] = [
        (22, 12, 0, 4, &[0, 1], "la app es muy rapida"),
        (25, 10, 0, 5, &[0, 1, 2], "app rapida y comoda"),
        (19, 15, 0, 4, &[0, 1], "me encanta la app"),
        (28, 9, 0, 3, &[0, 2], "la app se cuelga a veces"),
        (45, 3, 1, 2, &[3], "el telefono siempre esta ocupado"),
        (52, 2, 1, 1, &[3, 4], "nadie contesta el telefono"),
        (48, 4, 1, 2, &[3], "espera larga al telefono"),
        (67, 1, 2, 5, &[4], "atencion en la oficina excelente"),
        (71, 1, 2, 4, &[4], "la oficina es muy amable"),
        (63, 2, 2, 5, &[3, 4], "excelente atencion personal"),
        (34, 6, 0, 3, &[0, 3], "app bien pero lenta"),
        (58, 2, 2, 4, &[4], "prefiero la oficina"),
    ];

    rows.iter()
        .enumerate()
        .map(|(i, &(age, visits, channel, satisfaction, services, comment))| {
            Response::new(
                ResponseId::new("satisfaction-2024", format!("respondent-{i:02}")),
                vec![
                    AttributeValue::numeric(age, 18, 90),
                    AttributeValue::numeric(visits, 0, 20),
                    AttributeValue::single_choice(channel, false, 3),
                    AttributeValue::single_choice(satisfaction - 1, true, 5),
                    AttributeValue::multi_choice(services.iter().copied(), 5),
                    AttributeValue::text(comment),
                ],
            )
        })
        .collect()
}
