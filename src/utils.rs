//! Utility functions shared by the partitioning algorithms

use crate::distance::ResponseMetric;
use crate::error::{Error, Result};
use crate::response::Response;
use ndarray::{Array1, ArrayView1};

/// Find the closest representative for a response.
///
/// Ties go to the representative listed first.
pub fn find_closest_representative<D: ResponseMetric + ?Sized>(
    response: &Response,
    representatives: &[Response],
    metric: &D,
) -> Result<(usize, f64)> {
    if representatives.is_empty() {
        return Err(Error::invalid_data("No representatives provided"));
    }

    let mut min_distance = f64::INFINITY;
    let mut closest = 0;

    for (i, distance) in metric
        .distances_to_representatives(response, representatives)
        .into_iter()
        .enumerate()
    {
        if distance < min_distance {
            min_distance = distance;
            closest = i;
        }
    }

    Ok((closest, min_distance))
}

/// Assign all responses to their closest representatives
pub fn assign_to_representatives<D: ResponseMetric + ?Sized>(
    responses: &[Response],
    representatives: &[Response],
    metric: &D,
) -> Result<Array1<usize>> {
    let mut assignments = Array1::zeros(responses.len());

    for (i, response) in responses.iter().enumerate() {
        assignments[i] = find_closest_representative(response, representatives, metric)?.0;
    }

    Ok(assignments)
}

/// Total distance between every response and its assigned representative
pub fn calculate_cost<D: ResponseMetric + ?Sized>(
    responses: &[Response],
    representatives: &[Response],
    assignments: ArrayView1<usize>,
    metric: &D,
) -> Result<f64> {
    within_cluster_sum(responses, representatives, assignments, metric, |d| d)
}

/// Within-cluster sum of squared distances to the assigned representatives
pub fn within_cluster_sum_of_squares<D: ResponseMetric + ?Sized>(
    responses: &[Response],
    representatives: &[Response],
    assignments: ArrayView1<usize>,
    metric: &D,
) -> Result<f64> {
    within_cluster_sum(responses, representatives, assignments, metric, |d| d * d)
}

fn within_cluster_sum<D, F>(
    responses: &[Response],
    representatives: &[Response],
    assignments: ArrayView1<usize>,
    metric: &D,
    transform: F,
) -> Result<f64>
where
    D: ResponseMetric + ?Sized,
    F: Fn(f64) -> f64,
{
    if assignments.len() != responses.len() {
        return Err(Error::invalid_data("One assignment per response is required"));
    }

    let mut total = 0.0;
    for (response, &cluster_id) in responses.iter().zip(assignments.iter()) {
        let representative = representatives
            .get(cluster_id)
            .ok_or_else(|| Error::invalid_data("Invalid cluster assignment"))?;
        total += transform(metric.distance(response, representative));
    }

    Ok(total)
}

/// Get indices of responses assigned to each cluster
pub fn get_cluster_indices(assignments: ArrayView1<usize>, n_clusters: usize) -> Vec<Vec<usize>> {
    let mut cluster_indices = vec![Vec::new(); n_clusters];

    for (response_idx, &cluster_id) in assignments.iter().enumerate() {
        if cluster_id < n_clusters {
            cluster_indices[cluster_id].push(response_idx);
        }
    }

    cluster_indices
}

/// Calculate cluster sizes
pub fn cluster_sizes(assignments: ArrayView1<usize>, n_clusters: usize) -> Vec<usize> {
    let mut sizes = vec![0; n_clusters];

    for &cluster_id in assignments.iter() {
        if cluster_id < n_clusters {
            sizes[cluster_id] += 1;
        }
    }

    sizes
}

/// Validate the response set and cluster count shared by every algorithm
pub fn validate_input(n_responses: usize, n_clusters: usize) -> Result<()> {
    if n_responses == 0 {
        return Err(Error::EmptyResponseSet);
    }

    if n_clusters < 1 {
        return Err(Error::KTooSmall { k: n_clusters });
    }

    if n_clusters > n_responses {
        return Err(Error::TooManyClusters {
            k: n_clusters,
            n: n_responses,
        });
    }

    Ok(())
}

/// Validate the iteration cap
pub fn validate_max_iter(max_iter: usize) -> Result<()> {
    if max_iter == 0 {
        return Err(Error::invalid_parameter("max_iter must be > 0"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeValue;
    use crate::distance::Comparator;

    fn numeric(values: &[i64]) -> Vec<Response> {
        values
            .iter()
            .map(|&v| Response::synthetic(vec![AttributeValue::numeric(v, 0, 10)]))
            .collect()
    }

    #[test]
    fn test_find_closest_representative() {
        let response = &numeric(&[4])[0];
        let representatives = numeric(&[0, 5, 9]);

        let (closest, distance) =
            find_closest_representative(response, &representatives, &Comparator).unwrap();

        assert_eq!(closest, 1);
        assert!((distance - 0.1).abs() < 1e-10);
    }

    #[test]
    fn test_find_closest_prefers_first_on_tie() {
        let response = &numeric(&[5])[0];
        let representatives = numeric(&[7, 3, 7]);

        let (closest, _) =
            find_closest_representative(response, &representatives, &Comparator).unwrap();

        assert_eq!(closest, 0);
    }

    #[test]
    fn test_assign_to_representatives() {
        let responses = numeric(&[0, 9, 1]);
        let representatives = numeric(&[0, 10]);

        let assignments = assign_to_representatives(&responses, &representatives, &Comparator).unwrap();

        assert_eq!(assignments.to_vec(), vec![0, 1, 0]);
    }

    #[test]
    fn test_calculate_cost_and_wcss() {
        let responses = numeric(&[0, 2, 10]);
        let representatives = numeric(&[1, 10]);
        let assignments = ndarray::arr1(&[0, 0, 1]);

        let cost = calculate_cost(&responses, &representatives, assignments.view(), &Comparator).unwrap();
        let wcss =
            within_cluster_sum_of_squares(&responses, &representatives, assignments.view(), &Comparator)
                .unwrap();

        assert!((cost - 0.2).abs() < 1e-10);
        assert!((wcss - 0.02).abs() < 1e-10);
    }

    #[test]
    fn test_calculate_cost_rejects_bad_assignment() {
        let responses = numeric(&[0]);
        let representatives = numeric(&[1]);
        let assignments = ndarray::arr1(&[3]);
        assert!(calculate_cost(&responses, &representatives, assignments.view(), &Comparator).is_err());
    }

    #[test]
    fn test_get_cluster_indices() {
        let assignments = ndarray::arr1(&[0, 1, 0, 1, 2]);
        let indices = get_cluster_indices(assignments.view(), 4);

        assert_eq!(indices[0], vec![0, 2]);
        assert_eq!(indices[1], vec![1, 3]);
        assert_eq!(indices[2], vec![4]);
        assert!(indices[3].is_empty());
    }

    #[test]
    fn test_cluster_sizes() {
        let assignments = ndarray::arr1(&[0, 1, 0, 1, 2]);
        let sizes = cluster_sizes(assignments.view(), 3);

        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_validate_input() {
        assert!(validate_input(5, 2).is_ok());
        assert_eq!(validate_input(0, 2), Err(Error::EmptyResponseSet));
        assert_eq!(validate_input(5, 0), Err(Error::KTooSmall { k: 0 }));
        assert_eq!(validate_input(2, 3), Err(Error::TooManyClusters { k: 3, n: 2 }));
        assert!(validate_max_iter(0).is_err());
    }
}
