//! Error types for the survey clustering crate

use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during clustering and evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// No responses were supplied
    #[error("Response set is empty")]
    EmptyResponseSet,

    /// Fewer than one cluster was requested
    #[error("Number of clusters must be at least 1, got {k}")]
    KTooSmall {
        /// Requested number of clusters
        k: usize,
    },

    /// More clusters than responses were requested
    #[error("Number of clusters ({k}) cannot exceed number of responses ({n})")]
    TooManyClusters {
        /// Requested number of clusters
        k: usize,
        /// Number of responses available
        n: usize,
    },

    /// Invalid input parameters
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Error message
        message: String,
    },

    /// Empty or inconsistent data
    #[error("Invalid data: {message}")]
    InvalidData {
        /// Error message
        message: String,
    },

    /// Quality was requested before any partition was stored
    #[error("No partition available; run an analysis first")]
    NotAnalyzed,

    /// A per-question metric could not be evaluated
    #[error(transparent)]
    Metric(#[from] MetricError),
}

impl Error {
    /// Create a new InvalidParameter error
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create a new InvalidData error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }
}

/// Degenerate cases of a single question's distance.
///
/// The comparator folds every one of these into a zero contribution, so they
/// only surface when [`AttributeValue::distance`](crate::AttributeValue::distance)
/// is called directly.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricError {
    /// Numeric bounds are identical, so the range is zero
    #[error("numeric bounds are identical")]
    DivisionDegenerate,

    /// Ordered categorical question with fewer than two options
    #[error("ordered question needs at least two options")]
    TooFewModalities,

    /// Both selection sets are empty
    #[error("both selections are empty")]
    EmptyUnion,

    /// Both texts are empty
    #[error("both texts are empty")]
    BothEmpty,

    /// The two answers are of different kinds
    #[error("answers of different kinds cannot be compared")]
    KindMismatch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::TooManyClusters { k: 5, n: 2 }.to_string(),
            "Number of clusters (5) cannot exceed number of responses (2)"
        );
        assert_eq!(
            Error::invalid_parameter("max_iter must be > 0").to_string(),
            "Invalid parameter: max_iter must be > 0"
        );
    }

    #[test]
    fn test_metric_error_conversion() {
        let err: Error = MetricError::BothEmpty.into();
        assert_eq!(err, Error::Metric(MetricError::BothEmpty));
        assert_eq!(err.to_string(), "both texts are empty");
    }
}
