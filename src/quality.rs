//! Unsupervised partition quality scores
//!
//! Every evaluator ignores empty clusters and scores a partition with fewer
//! than two non-empty clusters as 0.

use crate::distance::{centroid, ResponseMetric};
use crate::error::Result;
use crate::partition::Cluster;
use crate::response::Response;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Partition quality metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum QualityEvaluator {
    /// Mean silhouette coefficient, in `[-1, 1]`
    #[default]
    Silhouette,
    /// Davies-Bouldin index, 0 at best
    DaviesBouldin,
    /// Calinski-Harabasz variance ratio
    CalinskiHarabasz,
}

impl QualityEvaluator {
    /// Score a partition
    pub fn evaluate<D: ResponseMetric + ?Sized>(&self, clusters: &[Cluster], metric: &D) -> Result<f64> {
        match self {
            Self::Silhouette => Ok(silhouette(clusters, metric)),
            Self::DaviesBouldin => davies_bouldin(clusters, metric),
            Self::CalinskiHarabasz => calinski_harabasz(clusters, metric),
        }
    }

    /// Whether larger scores mean better partitions
    pub fn higher_is_better(&self) -> bool {
        !matches!(self, Self::DaviesBouldin)
    }
}

fn non_empty(clusters: &[Cluster]) -> Vec<&Cluster> {
    clusters.iter().filter(|c| !c.is_empty()).collect()
}

fn mean_distance<D: ResponseMetric + ?Sized>(response: &Response, others: &[Response], metric: &D) -> f64 {
    let total: f64 = others.iter().map(|other| metric.distance(response, other)).sum();
    total / others.len() as f64
}

/// Mean silhouette coefficient over every response.
///
/// A response alone in its cluster has a cohesion of 0.
pub fn silhouette<D: ResponseMetric + ?Sized>(clusters: &[Cluster], metric: &D) -> f64 {
    let clusters = non_empty(clusters);
    if clusters.len() < 2 {
        return 0.0;
    }

    let mut total = 0.0;
    let mut count = 0;

    for (own, cluster) in clusters.iter().enumerate() {
        for (i, response) in cluster.iter().enumerate() {
            let a = if cluster.len() == 1 {
                0.0
            } else {
                let peers: f64 = cluster
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, peer)| metric.distance(response, peer))
                    .sum();
                peers / (cluster.len() - 1) as f64
            };

            let b = clusters
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != own)
                .map(|(_, other)| mean_distance(response, other.members(), metric))
                .fold(f64::INFINITY, f64::min);

            let scale = a.max(b);
            if scale > 0.0 {
                total += (b - a) / scale;
            }
            count += 1;
        }
    }

    total / count as f64
}

/// Davies-Bouldin index: mean over clusters of the worst dispersion-to-separation ratio
pub fn davies_bouldin<D: ResponseMetric + ?Sized>(clusters: &[Cluster], metric: &D) -> Result<f64> {
    let clusters = non_empty(clusters);
    if clusters.len() < 2 {
        return Ok(0.0);
    }

    let centroids = clusters
        .iter()
        .map(|cluster| centroid(cluster.iter()))
        .collect::<Result<Vec<_>>>()?;
    let dispersions: Vec<f64> = clusters
        .iter()
        .zip(&centroids)
        .map(|(cluster, c)| mean_distance(c, cluster.members(), metric))
        .collect();

    let mut total = 0.0;
    for i in 0..clusters.len() {
        let mut worst = 0.0_f64;
        for j in 0..clusters.len() {
            if i == j {
                continue;
            }
            let separation = metric.distance(&centroids[i], &centroids[j]);
            if separation == 0.0 {
                continue;
            }
            worst = worst.max((dispersions[i] + dispersions[j]) / separation);
        }
        total += worst;
    }

    Ok(total / clusters.len() as f64)
}

/// Calinski-Harabasz index: between-cluster over within-cluster dispersion,
/// each normalized by its degrees of freedom
pub fn calinski_harabasz<D: ResponseMetric + ?Sized>(clusters: &[Cluster], metric: &D) -> Result<f64> {
    let clusters = non_empty(clusters);
    let k = clusters.len();
    let n: usize = clusters.iter().map(|c| c.len()).sum();
    if k < 2 || n <= k {
        return Ok(0.0);
    }

    let overall = centroid(clusters.iter().flat_map(|c| c.iter()))?;

    let mut between = 0.0;
    let mut within = 0.0;
    for cluster in &clusters {
        let c = centroid(cluster.iter())?;
        let separation = metric.distance(&c, &overall);
        between += cluster.len() as f64 * separation * separation;
        within += cluster
            .iter()
            .map(|member| {
                let d = metric.distance(member, &c);
                d * d
            })
            .sum::<f64>();
    }

    if within == 0.0 {
        return Ok(0.0);
    }

    Ok((between / (k - 1) as f64) / (within / (n - k) as f64))
}
