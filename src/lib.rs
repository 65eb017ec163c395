//! # Survey response clustering
//!
//! This crate groups survey responses into clusters of similar respondents
//! and scores how good a grouping is.
//!
//! ## Features
//!
//! - **Mixed answers**: numeric, single and multiple choice, and free text
//! - **K-Means**: Lloyd iteration or Elkan's triangle-inequality pruning
//! - **K-Medoids**: naive PAM or FasterPAM-style swaps
//! - Random, K-Means++ and greedy medoid initialization
//! - Silhouette, Davies-Bouldin and Calinski-Harabasz scores
//! - Elbow-based selection of the cluster count
//! - Parallel distance matrices via Rayon (`parallel` feature)
//!
//! ## Example
//!
//! ```rust
//! use survey_cluster::{AnalysisConfig, Analyzer, AttributeValue, Response, ResponseId};
//!
//! let responses: Vec<Response> = [1, 2, 3, 8, 9, 10]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, &age)| {
//!         Response::new(
//!             ResponseId::new("demo", i.to_string()),
//!             vec![AttributeValue::numeric(age, 0, 10)],
//!         )
//!     })
//!     .collect();
//!
//! let mut analyzer = Analyzer::new(AnalysisConfig::new(2).random_state(42));
//! analyzer.analyze(&responses).unwrap();
//!
//! for cluster in analyzer.resulting_clusters() {
//!     println!("{} responses", cluster.len());
//! }
//! println!("silhouette: {}", analyzer.evaluate_quality().unwrap());
//! ```

#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod analysis;
pub mod attribute;
pub mod distance;
pub mod error;
pub mod initialization;
pub mod kmeans;
pub mod kmedoids;
pub mod partition;
pub mod quality;
pub mod response;
pub mod text;
pub mod utils;

pub use analysis::{AlgorithmFamily, AnalysisConfig, Analyzer};
pub use attribute::AttributeValue;
pub use distance::{centroid, Comparator, CountingMetric, DistanceMatrix, ResponseMetric};
pub use error::{Error, MetricError, Result};
pub use initialization::{initialize_seeds, CentroidInit, InitMethod, MedoidInit};
pub use kmeans::{CentroidAlgorithm, KMeans};
pub use kmedoids::{KMedoids, MedoidAlgorithm};
pub use partition::{Cluster, ClusteringResult};
pub use quality::QualityEvaluator;
pub use response::{Response, ResponseId};

/// Re-export commonly used types from ndarray
pub use ndarray::{Array1, Array2, ArrayView1};
