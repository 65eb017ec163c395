//! K-Medoids clustering: every cluster is represented by one of its own responses

use crate::distance::{first_kind_mismatch, CountingMetric, DistanceMatrix, ResponseMetric};
use crate::error::{Error, Result};
use crate::initialization::{initialize_seeds, MedoidInit};
use crate::partition::ClusteringResult;
use crate::response::Response;
use crate::utils::{validate_input, validate_max_iter};
use ndarray::Array1;
use rand::Rng;
use tracing::{debug, trace, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A cached swap must lower the cost by more than this to be committed
const SWAP_TOLERANCE: f64 = 1e-12;

/// Medoid-based partitioning algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MedoidAlgorithm {
    /// Partitioning Around Medoids: every swap is priced by a full cost recomputation
    #[default]
    NaivePam,
    /// Swaps priced in O(n) from cached nearest and second-nearest medoid distances
    FasterPam,
}

/// K-Medoids clustering for survey responses
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KMedoids {
    /// Swap strategy
    pub algorithm: MedoidAlgorithm,
    /// Seed selection strategy
    pub init_method: MedoidInit,
    /// Maximum number of swap passes
    pub max_iter: usize,
}

impl Default for KMedoids {
    fn default() -> Self {
        Self {
            algorithm: MedoidAlgorithm::NaivePam,
            init_method: MedoidInit::GreedyMedoid,
            max_iter: 300,
        }
    }
}

/// Per-response nearest and second-nearest medoid
struct NearestCache {
    nearest: Vec<usize>,
    near: Vec<f64>,
    second: Vec<f64>,
}

impl NearestCache {
    fn build(matrix: &DistanceMatrix, medoids: &[usize]) -> Self {
        let n = matrix.len();
        let mut cache = Self {
            nearest: vec![0; n],
            near: vec![f64::INFINITY; n],
            second: vec![f64::INFINITY; n],
        };

        for i in 0..n {
            for (slot, &m) in medoids.iter().enumerate() {
                let d = matrix.get(i, m);
                if d < cache.near[i] {
                    cache.second[i] = cache.near[i];
                    cache.near[i] = d;
                    cache.nearest[i] = slot;
                } else if d < cache.second[i] {
                    cache.second[i] = d;
                }
            }
        }

        cache
    }

    fn cost(&self) -> f64 {
        self.near.iter().sum()
    }
}

impl KMedoids {
    /// Create a new k-medoids clusterer using the given swap strategy
    pub fn new(algorithm: MedoidAlgorithm) -> Self {
        Self {
            algorithm,
            ..Default::default()
        }
    }

    /// Set the initialization method
    pub fn init_method(mut self, method: MedoidInit) -> Self {
        self.init_method = method;
        self
    }

    /// Set the maximum number of swap passes
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Seed `n_clusters` medoids with the configured initializer and improve them by swapping
    pub fn fit<D, R>(
        &self,
        responses: &[Response],
        n_clusters: usize,
        metric: &D,
        rng: &mut R,
    ) -> Result<ClusteringResult>
    where
        D: ResponseMetric + ?Sized,
        R: Rng + ?Sized,
    {
        validate_input(responses.len(), n_clusters)?;
        validate_max_iter(self.max_iter)?;

        let medoids = initialize_seeds(responses, n_clusters, self.init_method.into(), metric, rng)?;
        self.fit_from_medoids(responses, medoids, metric)
    }

    /// Improve explicit starting medoids, given as positions in `responses`
    pub fn fit_from_medoids<D>(
        &self,
        responses: &[Response],
        medoids: Vec<usize>,
        metric: &D,
    ) -> Result<ClusteringResult>
    where
        D: ResponseMetric + ?Sized,
    {
        validate_input(responses.len(), medoids.len())?;
        validate_max_iter(self.max_iter)?;
        validate_medoids(&medoids, responses.len())?;

        if let Some(question) = first_kind_mismatch(responses) {
            warn!(question, "answer kinds differ between responses; those answers count as equal");
        }

        let counting = CountingMetric::new(metric);
        let matrix = DistanceMatrix::compute(responses, &counting);
        let initial_cost = NearestCache::build(&matrix, &medoids).cost();

        let (medoids, n_iter, converged) = match self.algorithm {
            MedoidAlgorithm::NaivePam => self.naive_pam(&matrix, medoids),
            MedoidAlgorithm::FasterPam => self.faster_pam(&matrix, medoids),
        };

        let cache = NearestCache::build(&matrix, &medoids);
        let cost = cache.cost();

        if converged {
            debug!(
                algorithm = ?self.algorithm,
                n_iter,
                initial_cost,
                cost,
                "k-medoids converged"
            );
        } else {
            warn!(
                algorithm = ?self.algorithm,
                max_iter = self.max_iter,
                "k-medoids stopped at the iteration cap without converging"
            );
        }

        Ok(ClusteringResult {
            labels: Array1::from(cache.nearest),
            representatives: medoids.iter().map(|&m| responses[m].clone()).collect(),
            medoid_indices: Some(medoids),
            n_iter,
            cost,
            converged,
            distance_evaluations: counting.evaluations(),
        })
    }

    fn naive_pam(&self, matrix: &DistanceMatrix, mut medoids: Vec<usize>) -> (Vec<usize>, usize, bool) {
        let n = matrix.len();
        let mut cost = total_cost(matrix, &medoids);
        let mut n_iter = 0;

        loop {
            if n_iter >= self.max_iter {
                return (medoids, n_iter, false);
            }
            n_iter += 1;

            let mut swaps = 0;
            for candidate in 0..n {
                if medoids.contains(&candidate) {
                    continue;
                }
                for slot in 0..medoids.len() {
                    let previous = medoids[slot];
                    medoids[slot] = candidate;
                    let trial = total_cost(matrix, &medoids);
                    if trial < cost {
                        trace!(slot, removed = previous, added = candidate, cost = trial, "pam swap");
                        cost = trial;
                        swaps += 1;
                        break;
                    }
                    medoids[slot] = previous;
                }
            }

            debug!(pass = n_iter, swaps, cost, "pam pass");
            if swaps == 0 {
                return (medoids, n_iter, true);
            }
        }
    }

    fn faster_pam(&self, matrix: &DistanceMatrix, mut medoids: Vec<usize>) -> (Vec<usize>, usize, bool) {
        let n = matrix.len();
        let k = medoids.len();
        let mut cache = NearestCache::build(matrix, &medoids);
        let mut n_iter = 0;

        loop {
            if n_iter >= self.max_iter {
                return (medoids, n_iter, false);
            }
            n_iter += 1;

            // cost lost by each medoid if its members fall back to their second choice
            let mut removal_loss = vec![0.0; k];
            for i in 0..n {
                removal_loss[cache.nearest[i]] += cache.second[i] - cache.near[i];
            }

            let mut best: Option<(f64, usize, usize)> = None;
            for candidate in 0..n {
                if medoids.contains(&candidate) {
                    continue;
                }

                let deltas = if k == 1 {
                    vec![(0..n).map(|i| matrix.get(i, candidate) - cache.near[i]).sum::<f64>()]
                } else {
                    swap_deltas(matrix, &cache, &removal_loss, candidate)
                };

                for (slot, delta) in deltas.into_iter().enumerate() {
                    if delta < -SWAP_TOLERANCE && best.map_or(true, |(b, _, _)| delta < b) {
                        best = Some((delta, slot, candidate));
                    }
                }
            }

            match best {
                Some((delta, slot, candidate)) => {
                    trace!(slot, removed = medoids[slot], added = candidate, delta, "fasterpam swap");
                    medoids[slot] = candidate;
                    cache = NearestCache::build(matrix, &medoids);
                    debug!(pass = n_iter, cost = cache.cost(), "fasterpam pass");
                }
                None => return (medoids, n_iter, true),
            }
        }
    }

    /// Fit the model and return only the cluster labels
    pub fn fit_predict<D, R>(
        &self,
        responses: &[Response],
        n_clusters: usize,
        metric: &D,
        rng: &mut R,
    ) -> Result<Array1<usize>>
    where
        D: ResponseMetric + ?Sized,
        R: Rng + ?Sized,
    {
        Ok(self.fit(responses, n_clusters, metric, rng)?.labels)
    }
}

/// Cost change of replacing each medoid slot by `candidate`, for two or more medoids
fn swap_deltas(
    matrix: &DistanceMatrix,
    cache: &NearestCache,
    removal_loss: &[f64],
    candidate: usize,
) -> Vec<f64> {
    let mut deltas = removal_loss.to_vec();
    // gain every response gets from the candidate regardless of which medoid leaves
    let mut shared = 0.0;

    for i in 0..matrix.len() {
        let d = matrix.get(i, candidate);
        let owner = cache.nearest[i];
        if d < cache.near[i] {
            shared += d - cache.near[i];
            deltas[owner] += cache.near[i] - cache.second[i];
        } else if d < cache.second[i] {
            deltas[owner] += d - cache.second[i];
        }
    }

    for delta in deltas.iter_mut() {
        *delta += shared;
    }
    deltas
}

fn total_cost(matrix: &DistanceMatrix, medoids: &[usize]) -> f64 {
    (0..matrix.len())
        .map(|i| {
            medoids
                .iter()
                .map(|&m| matrix.get(i, m))
                .fold(f64::INFINITY, f64::min)
        })
        .sum()
}

fn validate_medoids(medoids: &[usize], n_responses: usize) -> Result<()> {
    for (position, &m) in medoids.iter().enumerate() {
        if m >= n_responses {
            return Err(Error::invalid_parameter(format!(
                "Medoid index {m} is out of bounds for {n_responses} responses"
            )));
        }
        if medoids[..position].contains(&m) {
            return Err(Error::invalid_parameter(format!("Medoid index {m} is repeated")));
        }
    }
    Ok(())
}
