//! Seed selection for the partitioning algorithms

use crate::distance::ResponseMetric;
use crate::error::{Error, Result};
use crate::response::Response;
use crate::utils::validate_input;
use rand::distributions::{Distribution, WeightedIndex};
use rand::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Seed selection strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InitMethod {
    /// Distinct responses drawn uniformly at random
    Random,
    /// K-Means++: each new seed is drawn with probability proportional to the
    /// squared distance to the nearest seed already chosen
    KMeansPlusPlus,
    /// Greedy construction that adds the medoid lowering total cost the most
    GreedyMedoid,
}

/// Initializers usable with centroid-based algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CentroidInit {
    /// Uniform random seeds
    Random,
    /// K-Means++ seeds
    #[default]
    KMeansPlusPlus,
}

/// Initializers usable with medoid-based algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MedoidInit {
    /// Uniform random seeds
    Random,
    /// K-Means++ seeds
    KMeansPlusPlus,
    /// Greedy cost-minimizing medoids
    #[default]
    GreedyMedoid,
}

impl From<CentroidInit> for InitMethod {
    fn from(init: CentroidInit) -> Self {
        match init {
            CentroidInit::Random => InitMethod::Random,
            CentroidInit::KMeansPlusPlus => InitMethod::KMeansPlusPlus,
        }
    }
}

impl From<MedoidInit> for InitMethod {
    fn from(init: MedoidInit) -> Self {
        match init {
            MedoidInit::Random => InitMethod::Random,
            MedoidInit::KMeansPlusPlus => InitMethod::KMeansPlusPlus,
            MedoidInit::GreedyMedoid => InitMethod::GreedyMedoid,
        }
    }
}

/// Choose `n_clusters` distinct responses to seed a partitioning run.
///
/// Returns their positions in `responses`.
pub fn initialize_seeds<D, R>(
    responses: &[Response],
    n_clusters: usize,
    method: InitMethod,
    metric: &D,
    rng: &mut R,
) -> Result<Vec<usize>>
where
    D: ResponseMetric + ?Sized,
    R: Rng + ?Sized,
{
    validate_input(responses.len(), n_clusters)?;

    match method {
        InitMethod::Random => Ok(random_init(responses.len(), n_clusters, rng)),
        InitMethod::KMeansPlusPlus => kmeans_plus_plus_init(responses, n_clusters, metric, rng),
        InitMethod::GreedyMedoid => greedy_medoid_init(responses, n_clusters, metric, rng),
    }
}

/// Random initialization: k indices drawn without replacement
fn random_init<R: Rng + ?Sized>(n_responses: usize, n_clusters: usize, rng: &mut R) -> Vec<usize> {
    rand::seq::index::sample(rng, n_responses, n_clusters).into_vec()
}

/// K-Means++ initialization: D²-weighted sampling
fn kmeans_plus_plus_init<D, R>(
    responses: &[Response],
    n_clusters: usize,
    metric: &D,
    rng: &mut R,
) -> Result<Vec<usize>>
where
    D: ResponseMetric + ?Sized,
    R: Rng + ?Sized,
{
    let n = responses.len();
    let mut chosen = vec![false; n];
    let mut seeds = Vec::with_capacity(n_clusters);
    let mut nearest = vec![f64::INFINITY; n];

    let first = rng.gen_range(0..n);
    chosen[first] = true;
    seeds.push(first);

    while seeds.len() < n_clusters {
        let last = &responses[seeds[seeds.len() - 1]];
        for (i, response) in responses.iter().enumerate() {
            if !chosen[i] {
                nearest[i] = nearest[i].min(metric.distance(response, last));
            }
        }

        let weights: Vec<f64> = nearest
            .iter()
            .zip(&chosen)
            .map(|(&d, &taken)| if taken { 0.0 } else { d * d })
            .collect();

        let next = match WeightedIndex::new(&weights) {
            Ok(distribution) => distribution.sample(rng),
            // every remaining response coincides with a seed
            Err(_) => pick_unchosen(&chosen, rng)?,
        };

        chosen[next] = true;
        seeds.push(next);
    }

    Ok(seeds)
}

/// Greedy initialization: random first medoid, then the candidate that
/// minimizes the total distance to the nearest medoid
fn greedy_medoid_init<D, R>(
    responses: &[Response],
    n_clusters: usize,
    metric: &D,
    rng: &mut R,
) -> Result<Vec<usize>>
where
    D: ResponseMetric + ?Sized,
    R: Rng + ?Sized,
{
    let n = responses.len();
    let mut chosen = vec![false; n];
    let mut seeds = Vec::with_capacity(n_clusters);

    let first = rng.gen_range(0..n);
    chosen[first] = true;
    seeds.push(first);
    let mut nearest: Vec<f64> = responses
        .iter()
        .map(|response| metric.distance(response, &responses[first]))
        .collect();

    while seeds.len() < n_clusters {
        let mut best: Option<(usize, f64, Vec<f64>)> = None;

        for candidate in (0..n).filter(|&c| !chosen[c]) {
            let column: Vec<f64> = responses
                .iter()
                .map(|response| metric.distance(response, &responses[candidate]))
                .collect();
            let total: f64 = nearest.iter().zip(&column).map(|(a, b)| a.min(*b)).sum();

            if best.as_ref().map_or(true, |(_, best_total, _)| total < *best_total) {
                best = Some((candidate, total, column));
            }
        }

        let (candidate, _, column) =
            best.ok_or_else(|| Error::invalid_data("No candidate medoid left"))?;
        for (current, d) in nearest.iter_mut().zip(column) {
            *current = current.min(d);
        }
        chosen[candidate] = true;
        seeds.push(candidate);
    }

    Ok(seeds)
}

fn pick_unchosen<R: Rng + ?Sized>(chosen: &[bool], rng: &mut R) -> Result<usize> {
    let remaining: Vec<usize> = (0..chosen.len()).filter(|&i| !chosen[i]).collect();
    remaining
        .choose(rng)
        .copied()
        .ok_or_else(|| Error::invalid_data("No response left to seed from"))
}
