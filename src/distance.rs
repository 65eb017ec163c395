//! Whole-response distance and cluster aggregation

use crate::attribute::AttributeValue;
use crate::error::{Error, Result};
use crate::response::Response;
use ndarray::Array2;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::trace;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Trait for computing distances between survey responses
pub trait ResponseMetric: Sync {
    /// Compute distance between two responses
    fn distance(&self, a: &Response, b: &Response) -> f64;

    /// Compute distances between a single response and several representatives
    fn distances_to_representatives(&self, response: &Response, representatives: &[Response]) -> Vec<f64> {
        representatives
            .iter()
            .map(|representative| self.distance(response, representative))
            .collect()
    }

    /// Whether the triangle inequality holds between any of `responses` and
    /// any aggregate of them.
    ///
    /// Algorithms that prune with distance bounds compute every distance
    /// exactly when this is false.
    fn obeys_triangle_inequality(&self, _responses: &[&Response]) -> bool {
        true
    }
}

/// Mean of per-question distances.
///
/// A question whose metric is degenerate (identical bounds, a single ordered
/// option, two empty selections or two empty texts) contributes 0 instead of
/// failing the whole comparison. So does a question answered with different
/// kinds of value.
///
/// Normalized edit distance is not a metric (`"ab"`, `"aba"`, `"ba"` break the
/// triangle inequality), so neither is the comparator once a free-text
/// question is involved.
#[derive(Debug, Clone, Copy, Default)]
pub struct Comparator;

impl ResponseMetric for Comparator {
    fn distance(&self, a: &Response, b: &Response) -> f64 {
        let questions = a.len().min(b.len());
        if questions == 0 {
            return 0.0;
        }

        let total: f64 = a
            .answers()
            .iter()
            .zip(b.answers())
            .enumerate()
            .map(|(i, (x, y))| match x.distance(y) {
                Ok(d) => d,
                Err(err) => {
                    trace!(question = i + 1, left = x.kind(), right = y.kind(), %err, "question counted as zero");
                    0.0
                }
            })
            .sum();

        total / questions as f64
    }

    fn obeys_triangle_inequality(&self, responses: &[&Response]) -> bool {
        let Some(first) = responses.first() else {
            return true;
        };
        let has_text = first
            .answers()
            .iter()
            .any(|answer| matches!(answer, AttributeValue::FreeText(_)));

        !has_text
            && responses.iter().all(|r| r.len() == first.len())
            && first_kind_mismatch(responses.iter().copied()).is_none()
    }
}

/// First question (1-based) whose answers are of different kinds across `responses`
pub fn first_kind_mismatch<'a, I>(responses: I) -> Option<usize>
where
    I: IntoIterator<Item = &'a Response>,
{
    let mut responses = responses.into_iter();
    let first = responses.next()?;

    responses.find_map(|response| {
        first
            .answers()
            .iter()
            .zip(response.answers())
            .position(|(a, b)| a.kind() != b.kind())
            .map(|question| question + 1)
    })
}

/// Wraps a metric and counts how many exact distances it computed
#[derive(Debug)]
pub struct CountingMetric<'a, D: ?Sized> {
    inner: &'a D,
    evaluations: AtomicUsize,
}

impl<'a, D: ResponseMetric + ?Sized> CountingMetric<'a, D> {
    /// Start counting distance evaluations of `inner`
    pub fn new(inner: &'a D) -> Self {
        Self {
            inner,
            evaluations: AtomicUsize::new(0),
        }
    }

    /// Number of distances computed so far
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }
}

impl<D: ResponseMetric + ?Sized> ResponseMetric for CountingMetric<'_, D> {
    fn distance(&self, a: &Response, b: &Response) -> f64 {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        self.inner.distance(a, b)
    }

    fn obeys_triangle_inequality(&self, responses: &[&Response]) -> bool {
        self.inner.obeys_triangle_inequality(responses)
    }
}

/// Synthetic response whose every answer aggregates the members' answers
pub fn centroid<'a, I>(members: I) -> Result<Response>
where
    I: IntoIterator<Item = &'a Response>,
{
    let members: Vec<&Response> = members.into_iter().collect();
    let first = members
        .first()
        .ok_or_else(|| Error::invalid_data("Cannot compute centroid of empty cluster"))?;

    let mut answers = Vec::with_capacity(first.len());
    for question in 0..first.len() {
        let values: Vec<&AttributeValue> = members
            .iter()
            .filter_map(|member| member.answers().get(question))
            .collect();
        answers.push(AttributeValue::aggregate(&values)?);
    }

    Ok(Response::synthetic(answers))
}

/// All pairwise distances between a set of responses
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    distances: Array2<f64>,
}

impl DistanceMatrix {
    /// Compute the symmetric distance matrix of `responses`
    pub fn compute<D: ResponseMetric + ?Sized>(responses: &[Response], metric: &D) -> Self {
        let n = responses.len();
        let mut distances = Array2::zeros((n, n));

        #[cfg(feature = "parallel")]
        let upper: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| {
                ((i + 1)..n)
                    .map(|j| metric.distance(&responses[i], &responses[j]))
                    .collect()
            })
            .collect();

        #[cfg(not(feature = "parallel"))]
        let upper: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                ((i + 1)..n)
                    .map(|j| metric.distance(&responses[i], &responses[j]))
                    .collect()
            })
            .collect();

        for (i, row) in upper.into_iter().enumerate() {
            for (offset, d) in row.into_iter().enumerate() {
                let j = i + 1 + offset;
                distances[[i, j]] = d;
                distances[[j, i]] = d;
            }
        }

        Self { distances }
    }

    /// Distance between responses `i` and `j`
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.distances[[i, j]]
    }

    /// Number of responses covered by the matrix
    pub fn len(&self) -> usize {
        self.distances.nrows()
    }

    /// Whether the matrix covers no responses
    pub fn is_empty(&self) -> bool {
        self.distances.nrows() == 0
    }
}
