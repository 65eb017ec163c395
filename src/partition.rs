//! Clusters and the outcome of one partitioning run

use crate::error::{Error, Result};
use crate::response::Response;
use crate::utils::get_cluster_indices;
use ndarray::Array1;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Responses assigned to the same group
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cluster {
    members: Vec<Response>,
}

impl Cluster {
    /// Create a cluster from its members
    pub fn new(members: Vec<Response>) -> Self {
        Self { members }
    }

    /// Members of the cluster
    pub fn members(&self) -> &[Response] {
        &self.members
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the cluster has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterate over the members
    pub fn iter(&self) -> std::slice::Iter<'_, Response> {
        self.members.iter()
    }
}

impl<'a> IntoIterator for &'a Cluster {
    type Item = &'a Response;
    type IntoIter = std::slice::Iter<'a, Response>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

/// Result of a partitioning run
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusteringResult {
    /// Cluster index of each response
    pub labels: Array1<usize>,
    /// Final centroids or medoids, one per cluster
    pub representatives: Vec<Response>,
    /// Input positions of the medoids; `None` for centroid-based runs
    pub medoid_indices: Option<Vec<usize>>,
    /// Number of assignment passes (K-Means) or swap passes (K-Medoids)
    pub n_iter: usize,
    /// Total distance between responses and their representatives
    pub cost: f64,
    /// Whether the run stopped on its own rather than at the iteration cap
    pub converged: bool,
    /// Exact response-to-response distances computed during the run
    pub distance_evaluations: usize,
}

impl ClusteringResult {
    /// Number of clusters, including empty ones
    pub fn n_clusters(&self) -> usize {
        self.representatives.len()
    }

    /// Response indices grouped by cluster
    pub fn cluster_indices(&self) -> Vec<Vec<usize>> {
        get_cluster_indices(self.labels.view(), self.n_clusters())
    }

    /// Materialize the partition by cloning the responses into their clusters
    pub fn to_clusters(&self, responses: &[Response]) -> Result<Vec<Cluster>> {
        if responses.len() != self.labels.len() {
            return Err(Error::invalid_data(
                "Responses do not match the partitioned set",
            ));
        }

        Ok(self
            .cluster_indices()
            .into_iter()
            .map(|indices| Cluster::new(indices.into_iter().map(|i| responses[i].clone()).collect()))
            .collect())
    }
}
