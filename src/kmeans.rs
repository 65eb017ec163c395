//! K-Means clustering over survey responses, with synthetic centroids

use crate::distance::{centroid, first_kind_mismatch, CountingMetric, ResponseMetric};
use crate::error::Result;
use crate::initialization::{initialize_seeds, CentroidInit};
use crate::partition::ClusteringResult;
use crate::response::Response;
use crate::utils::{
    assign_to_representatives, calculate_cost, get_cluster_indices, validate_input,
    validate_max_iter,
};
use ndarray::{Array1, Array2};
use rand::Rng;
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Float slack applied to every pruning test so that near-ties are always
/// settled by an exact distance
const BOUND_SLACK: f64 = 1e-9;

/// Centroid-based partitioning algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CentroidAlgorithm {
    /// Lloyd iteration: every response is compared with every centroid
    #[default]
    NaiveKMeans,
    /// Elkan iteration: triangle-inequality bounds skip most comparisons
    OptimizedKMeans,
}

/// K-Means clustering for survey responses
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KMeans {
    /// Iteration strategy
    pub algorithm: CentroidAlgorithm,
    /// Seed selection strategy
    pub init_method: CentroidInit,
    /// Maximum number of assignment passes
    pub max_iter: usize,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            algorithm: CentroidAlgorithm::NaiveKMeans,
            init_method: CentroidInit::KMeansPlusPlus,
            max_iter: 300,
        }
    }
}

/// Final state of one K-Means run
struct Outcome {
    labels: Array1<usize>,
    centroids: Vec<Response>,
    n_iter: usize,
    converged: bool,
}

impl KMeans {
    /// Create a new k-means clusterer using the given iteration strategy
    pub fn new(algorithm: CentroidAlgorithm) -> Self {
        Self {
            algorithm,
            ..Default::default()
        }
    }

    /// Set the initialization method
    pub fn init_method(mut self, method: CentroidInit) -> Self {
        self.init_method = method;
        self
    }

    /// Set the maximum number of iterations
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Seed `n_clusters` centroids with the configured initializer and run to convergence
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

        let seeds = initialize_seeds(responses, n_clusters, self.init_method.into(), metric, rng)?;
        let seeds = seeds.into_iter().map(|i| responses[i].clone()).collect();
        self.fit_from_seeds(responses, seeds, metric)
    }

    /// Run to convergence from explicit starting centroids
    pub fn fit_from_seeds<D>(
        &self,
        responses: &[Response],
        seeds: Vec<Response>,
        metric: &D,
    ) -> Result<ClusteringResult>
    where
        D: ResponseMetric + ?Sized,
    {
        validate_input(responses.len(), seeds.len())?;
        validate_max_iter(self.max_iter)?;

        if let Some(question) = first_kind_mismatch(responses.iter().chain(&seeds)) {
            warn!(question, "answer kinds differ between responses; those answers count as equal");
        }

        let counting = CountingMetric::new(metric);
        let outcome = match self.algorithm {
            CentroidAlgorithm::NaiveKMeans => self.lloyd(responses, seeds, &counting)?,
            CentroidAlgorithm::OptimizedKMeans => self.elkan(responses, seeds, &counting)?,
        };

        if outcome.converged {
            debug!(
                algorithm = ?self.algorithm,
                n_iter = outcome.n_iter,
                evaluations = counting.evaluations(),
                "k-means converged"
            );
        } else {
            warn!(
                algorithm = ?self.algorithm,
                max_iter = self.max_iter,
                "k-means stopped at the iteration cap without converging"
            );
        }

        let cost = calculate_cost(responses, &outcome.centroids, outcome.labels.view(), metric)?;

        Ok(ClusteringResult {
            labels: outcome.labels,
            representatives: outcome.centroids,
            medoid_indices: None,
            n_iter: outcome.n_iter,
            cost,
            converged: outcome.converged,
            distance_evaluations: counting.evaluations(),
        })
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

    fn lloyd<D>(&self, responses: &[Response], seeds: Vec<Response>, metric: &D) -> Result<Outcome>
    where
        D: ResponseMetric + ?Sized,
    {
        let mut centroids = seeds;
        let mut labels = assign_to_representatives(responses, &centroids, metric)?;
        let mut n_iter = 1;

        loop {
            let updated = update_centroids(responses, &labels, &centroids)?;
            if centroids_unchanged(&centroids, &updated) {
                return Ok(Outcome {
                    labels,
                    centroids,
                    n_iter,
                    converged: true,
                });
            }
            if n_iter >= self.max_iter {
                return Ok(Outcome {
                    labels,
                    centroids,
                    n_iter,
                    converged: false,
                });
            }

            centroids = updated;
            let next = assign_to_representatives(responses, &centroids, metric)?;
            let moved = next.iter().zip(labels.iter()).filter(|(a, b)| a != b).count();
            labels = next;
            n_iter += 1;
            debug!(iteration = n_iter, moved, "lloyd pass");
        }
    }

    fn elkan<D>(&self, responses: &[Response], seeds: Vec<Response>, metric: &D) -> Result<Outcome>
    where
        D: ResponseMetric + ?Sized,
    {
        let n = responses.len();
        let k = seeds.len();

        // bounds are sound only where the triangle inequality holds
        let all: Vec<&Response> = responses.iter().chain(&seeds).collect();
        let prune = metric.obeys_triangle_inequality(&all);
        if !prune {
            debug!("triangle inequality does not hold; elkan computes every distance");
        }
        let mut centroids = seeds;

        // lower[[i, j]] <= d(response i, centroid j); upper[i] >= d(response i, its centroid)
        let mut lower = Array2::<f64>::zeros((n, k));
        let mut upper = vec![0.0; n];
        let mut labels = Array1::<usize>::zeros(n);

        for (i, response) in responses.iter().enumerate() {
            let mut best = 0;
            let mut best_distance = f64::INFINITY;
            for (j, c) in centroids.iter().enumerate() {
                let d = metric.distance(response, c);
                lower[[i, j]] = d;
                if d < best_distance {
                    best_distance = d;
                    best = j;
                }
            }
            labels[i] = best;
            upper[i] = best_distance;
        }

        let mut n_iter = 1;

        loop {
            let updated = update_centroids(responses, &labels, &centroids)?;
            if centroids_unchanged(&centroids, &updated) {
                return Ok(Outcome {
                    labels,
                    centroids,
                    n_iter,
                    converged: true,
                });
            }
            if n_iter >= self.max_iter {
                return Ok(Outcome {
                    labels,
                    centroids,
                    n_iter,
                    converged: false,
                });
            }

            if prune {
                let shifts: Vec<f64> = centroids
                    .iter()
                    .zip(&updated)
                    .map(|(old, new)| metric.distance(old, new))
                    .collect();
                for i in 0..n {
                    upper[i] += shifts[labels[i]];
                    for (j, shift) in shifts.iter().enumerate() {
                        lower[[i, j]] = (lower[[i, j]] - shift).max(0.0);
                    }
                }
            }
            centroids = updated;

            let separation = prune.then(|| CentroidSeparation::compute(&centroids, metric));
            let mut skipped = 0;
            let mut moved = 0;

            for (i, response) in responses.iter().enumerate() {
                let mut assigned = labels[i];
                if let Some(separation) = &separation {
                    if upper[i] + BOUND_SLACK < separation.half_gap[assigned] {
                        skipped += 1;
                        continue;
                    }
                }

                let mut stale = true;
                for j in 0..k {
                    if j == assigned || ruled_out(separation.as_ref(), upper[i], lower[[i, j]], assigned, j) {
                        continue;
                    }

                    if stale {
                        let d = metric.distance(response, &centroids[assigned]);
                        upper[i] = d;
                        lower[[i, assigned]] = d;
                        stale = false;
                        if ruled_out(separation.as_ref(), upper[i], lower[[i, j]], assigned, j) {
                            continue;
                        }
                    }

                    let d = metric.distance(response, &centroids[j]);
                    lower[[i, j]] = d;
                    if d < upper[i] || (d == upper[i] && j < assigned) {
                        assigned = j;
                        upper[i] = d;
                    }
                }

                if assigned != labels[i] {
                    labels[i] = assigned;
                    moved += 1;
                }
            }

            n_iter += 1;
            debug!(iteration = n_iter, skipped, moved, "elkan pass");
        }
    }
}

/// Pairwise centroid distances and, per centroid, half the distance to its
/// nearest neighbour
struct CentroidSeparation {
    between: Array2<f64>,
    half_gap: Vec<f64>,
}

impl CentroidSeparation {
    fn compute<D: ResponseMetric + ?Sized>(centroids: &[Response], metric: &D) -> Self {
        let k = centroids.len();
        let mut between = Array2::<f64>::zeros((k, k));
        for a in 0..k {
            for b in (a + 1)..k {
                let d = metric.distance(&centroids[a], &centroids[b]);
                between[[a, b]] = d;
                between[[b, a]] = d;
            }
        }

        let half_gap = (0..k)
            .map(|a| {
                (0..k)
                    .filter(|&b| b != a)
                    .map(|b| 0.5 * between[[a, b]])
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();

        Self { between, half_gap }
    }
}

/// Whether the bounds prove centroid `j` strictly farther than the assigned
/// centroid; never without a separation table
fn ruled_out(
    separation: Option<&CentroidSeparation>,
    upper: f64,
    lower: f64,
    assigned: usize,
    j: usize,
) -> bool {
    separation.map_or(false, |s| {
        upper + BOUND_SLACK < lower || upper + BOUND_SLACK < 0.5 * s.between[[assigned, j]]
    })
}

/// Recompute every centroid from its members; an empty cluster keeps its
/// previous centroid
fn update_centroids(
    responses: &[Response],
    labels: &Array1<usize>,
    previous: &[Response],
) -> Result<Vec<Response>> {
    get_cluster_indices(labels.view(), previous.len())
        .into_iter()
        .zip(previous)
        .map(|(indices, old)| {
            if indices.is_empty() {
                Ok(old.clone())
            } else {
                centroid(indices.iter().map(|&i| &responses[i]))
            }
        })
        .collect()
}

fn centroids_unchanged(old: &[Response], new: &[Response]) -> bool {
    old.len() == new.len() && old.iter().zip(new).all(|(a, b)| a.same_answers(b))
}
