//! Analysis sessions: algorithm selection, partition storage and automatic k

use crate::distance::{Comparator, ResponseMetric};
use crate::error::{Error, Result};
use crate::initialization::{CentroidInit, MedoidInit};
use crate::kmeans::{CentroidAlgorithm, KMeans};
use crate::kmedoids::{KMedoids, MedoidAlgorithm};
use crate::partition::{Cluster, ClusteringResult};
use crate::quality::QualityEvaluator;
use crate::response::Response;
use crate::utils::{cluster_sizes, validate_input, validate_max_iter, within_cluster_sum_of_squares};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A partitioning algorithm paired with an initializer of the same family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AlgorithmFamily {
    /// K-Means variants, represented by synthetic centroids
    Centroid {
        /// Iteration strategy
        algorithm: CentroidAlgorithm,
        /// Seed selection
        init: CentroidInit,
    },
    /// K-Medoids variants, represented by actual responses
    Medoid {
        /// Swap strategy
        algorithm: MedoidAlgorithm,
        /// Seed selection
        init: MedoidInit,
    },
}

impl Default for AlgorithmFamily {
    fn default() -> Self {
        Self::Centroid {
            algorithm: CentroidAlgorithm::default(),
            init: CentroidInit::default(),
        }
    }
}

impl AlgorithmFamily {
    /// Pair a centroid-based algorithm with its initializer
    pub fn centroid(algorithm: CentroidAlgorithm, init: CentroidInit) -> Self {
        Self::Centroid { algorithm, init }
    }

    /// Pair a medoid-based algorithm with its initializer
    pub fn medoid(algorithm: MedoidAlgorithm, init: MedoidInit) -> Self {
        Self::Medoid { algorithm, init }
    }

    /// Partition `responses` into `n_clusters` groups
    pub fn run<D, R>(
        &self,
        responses: &[Response],
        n_clusters: usize,
        max_iter: usize,
        metric: &D,
        rng: &mut R,
    ) -> Result<ClusteringResult>
    where
        D: ResponseMetric + ?Sized,
        R: Rng + ?Sized,
    {
        match *self {
            Self::Centroid { algorithm, init } => KMeans::new(algorithm)
                .init_method(init)
                .max_iter(max_iter)
                .fit(responses, n_clusters, metric, rng),
            Self::Medoid { algorithm, init } => KMedoids::new(algorithm)
                .init_method(init)
                .max_iter(max_iter)
                .fit(responses, n_clusters, metric, rng),
        }
    }
}

/// Settings of an analysis session
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalysisConfig {
    /// Number of clusters used by [`Analyzer::analyze`]
    pub n_clusters: usize,
    /// Algorithm and initializer
    pub family: AlgorithmFamily,
    /// Quality metric used by [`Analyzer::evaluate_quality`]
    pub evaluator: QualityEvaluator,
    /// Maximum number of passes per partitioning run
    pub max_iter: usize,
    /// Random seed for reproducibility
    pub random_state: Option<u64>,
    /// Relative WCSS improvement below which the k sweep stops
    pub elbow_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            n_clusters: 2,
            family: AlgorithmFamily::default(),
            evaluator: QualityEvaluator::default(),
            max_iter: 300,
            random_state: None,
            elbow_threshold: 0.1,
        }
    }
}

impl AnalysisConfig {
    /// Create a configuration with the given number of clusters
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            ..Default::default()
        }
    }

    /// Set the algorithm family
    pub fn family(mut self, family: AlgorithmFamily) -> Self {
        self.family = family;
        self
    }

    /// Set the quality evaluator
    pub fn evaluator(mut self, evaluator: QualityEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Set the maximum number of passes per run
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the random seed for reproducibility
    pub fn random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Set the elbow threshold used when choosing k automatically
    pub fn elbow_threshold(mut self, threshold: f64) -> Self {
        self.elbow_threshold = threshold;
        self
    }

    /// Check that the settings can drive an analysis
    pub fn validate(&self) -> Result<()> {
        if self.n_clusters == 0 {
            return Err(Error::KTooSmall { k: 0 });
        }
        validate_max_iter(self.max_iter)?;
        if !(0.0..1.0).contains(&self.elbow_threshold) {
            return Err(Error::invalid_parameter("elbow_threshold must be in [0, 1)"));
        }
        Ok(())
    }
}

/// One analysis session over a survey's responses.
///
/// The session owns its configuration, its random source and the last
/// partition it produced; independent sessions share nothing.
#[derive(Debug, Clone)]
pub struct Analyzer<R = StdRng> {
    config: AnalysisConfig,
    rng: R,
    metric: Comparator,
    clusters: Vec<Cluster>,
    last_result: Option<ClusteringResult>,
}

impl Analyzer<StdRng> {
    /// Create a session; seeded from `random_state` when set, from entropy otherwise
    pub fn new(config: AnalysisConfig) -> Self {
        let rng = match config.random_state {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> Analyzer<R> {
    /// Create a session drawing seeds from the given random source
    pub fn with_rng(config: AnalysisConfig, rng: R) -> Self {
        Self {
            config,
            rng,
            metric: Comparator,
            clusters: Vec::new(),
            last_result: None,
        }
    }

    /// Current configuration
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Set the number of clusters used by [`analyze`](Self::analyze)
    pub fn set_cluster_count(&mut self, n_clusters: usize) {
        self.config.n_clusters = n_clusters;
    }

    /// Number of clusters used by [`analyze`](Self::analyze)
    pub fn cluster_count(&self) -> usize {
        self.config.n_clusters
    }

    /// Choose the algorithm and its initializer
    pub fn select_algorithm_family(&mut self, family: AlgorithmFamily) {
        self.config.family = family;
    }

    /// Choose the quality metric
    pub fn select_quality_evaluator(&mut self, evaluator: QualityEvaluator) {
        self.config.evaluator = evaluator;
    }

    /// Partition `responses` into the configured number of clusters and store the result
    pub fn analyze(&mut self, responses: &[Response]) -> Result<()> {
        self.config.validate()?;
        let result = self.partition(responses, self.config.n_clusters)?;
        let clusters = result.to_clusters(responses)?;

        info!(
            n_responses = responses.len(),
            n_clusters = self.config.n_clusters,
            sizes = ?cluster_sizes(result.labels.view(), result.n_clusters()),
            cost = result.cost,
            "partition stored"
        );

        self.clusters = clusters;
        self.last_result = Some(result);
        Ok(())
    }

    /// Clusters of the last analysis, empty clusters included
    pub fn resulting_clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Full result of the last analysis
    pub fn last_result(&self) -> Option<&ClusteringResult> {
        self.last_result.as_ref()
    }

    /// Score the stored partition with the selected evaluator.
    ///
    /// Silhouette and Calinski-Harabasz grow with quality; Davies-Bouldin shrinks.
    pub fn evaluate_quality(&self) -> Result<f64> {
        if self.last_result.is_none() {
            return Err(Error::NotAnalyzed);
        }
        self.config.evaluator.evaluate(&self.clusters, &self.metric)
    }

    /// Pick k with the elbow heuristic and store it as the cluster count.
    ///
    /// k grows from 1 while each step still cuts the within-cluster sum of
    /// squares by at least `elbow_threshold` of its previous value.
    pub fn auto_select_cluster_count(&mut self, responses: &[Response]) -> Result<usize> {
        self.config.validate()?;
        validate_input(responses.len(), 1)?;

        if responses.len() == 1 {
            self.config.n_clusters = 1;
            return Ok(1);
        }

        let mut k = 1;
        let mut previous = self.wcss(responses, k)?;

        while k < responses.len() {
            let wcss = self.wcss(responses, k + 1)?;
            if previous == 0.0 || wcss == previous {
                break;
            }
            let improvement = (previous - wcss) / previous;
            debug!(k = k + 1, wcss, improvement, "elbow step");
            if improvement < self.config.elbow_threshold {
                break;
            }
            previous = wcss;
            k += 1;
        }

        info!(n_responses = responses.len(), k, "cluster count selected");
        self.config.n_clusters = k;
        Ok(k)
    }

    fn partition(&mut self, responses: &[Response], n_clusters: usize) -> Result<ClusteringResult> {
        self.config.family.run(
            responses,
            n_clusters,
            self.config.max_iter,
            &self.metric,
            &mut self.rng,
        )
    }

    fn wcss(&mut self, responses: &[Response], n_clusters: usize) -> Result<f64> {
        let result = self.partition(responses, n_clusters)?;
        within_cluster_sum_of_squares(
            responses,
            &result.representatives,
            result.labels.view(),
            &self.metric,
        )
    }
}
