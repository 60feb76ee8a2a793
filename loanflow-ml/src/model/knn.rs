//! k-nearest-neighbour classifier.

use crate::error::ErrorKind;
use crate::model::neighbors::{Neighbor, NeighborIndex};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// How neighbour votes are weighted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnnWeights {
    /// Every neighbour counts once.
    Uniform,
    /// Neighbours count by inverse distance.
    #[default]
    Distance,
}

/// Neighbour search algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnnAlgorithm {
    /// kd-tree for low-dimensional data, brute force otherwise.
    #[default]
    Auto,
    Brute,
    KdTree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnnParams {
    pub n_neighbors: usize,
    pub weights: KnnWeights,
    pub algorithm: KnnAlgorithm,
}

impl Default for KnnParams {
    fn default() -> Self {
        Self {
            n_neighbors: 3,
            weights: KnnWeights::Distance,
            algorithm: KnnAlgorithm::Auto,
        }
    }
}

/// A fitted classifier. It memorises the training matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnClassifier {
    params: KnnParams,
    /// Sorted distinct labels.
    classes: Vec<f64>,
    fit_x: Array2<f64>,
    /// Index into `classes` for every training row.
    fit_y: Vec<usize>,
    index: NeighborIndex,
}

impl KnnClassifier {
    pub fn fit(params: KnnParams, x: &Array2<f64>, y: &Array1<f64>) -> Result<Self, ErrorKind> {
        if x.nrows() != y.len() {
            return Err(ErrorKind::invalid_data(format!(
                "feature rows ({}) and labels ({}) differ",
                x.nrows(),
                y.len()
            )));
        }
        if params.n_neighbors == 0 {
            return Err(ErrorKind::invalid_data("n_neighbors must be at least 1"));
        }
        if params.n_neighbors > x.nrows() {
            return Err(ErrorKind::invalid_data(format!(
                "n_neighbors ({}) exceeds training rows ({})",
                params.n_neighbors,
                x.nrows()
            )));
        }
        if y.iter().any(|v| !v.is_finite()) || x.iter().any(|v| !v.is_finite()) {
            return Err(ErrorKind::invalid_data("training data contains non-finite values"));
        }

        let classes = distinct_labels(y.iter().copied());
        let fit_y = y
            .iter()
            .map(|label| class_position(&classes, *label))
            .collect();
        let prefer_tree = match params.algorithm {
            KnnAlgorithm::Auto => None,
            KnnAlgorithm::Brute => Some(false),
            KnnAlgorithm::KdTree => Some(true),
        };
        let index = NeighborIndex::build(x, prefer_tree);
        tracing::debug!(
            rows = x.nrows(),
            features = x.ncols(),
            classes = classes.len(),
            "Fitted k-nearest-neighbour classifier"
        );

        Ok(Self {
            params,
            classes,
            fit_x: x.clone(),
            fit_y,
            index,
        })
    }

    pub fn params(&self) -> KnnParams {
        self.params
    }

    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.fit_x.ncols()
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ErrorKind> {
        if x.ncols() != self.n_features() {
            return Err(ErrorKind::invalid_data(format!(
                "expected {} features, got {}",
                self.n_features(),
                x.ncols()
            )));
        }
        Ok(x.rows().into_iter().map(|row| self.predict_row(row)).collect())
    }

    fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let neighbors = self
            .index
            .query(&self.fit_x, row, self.params.n_neighbors, None);
        let weights = vote_weights(&neighbors, self.params.weights);

        let mut votes = vec![0.0; self.classes.len()];
        for (neighbor, weight) in neighbors.iter().zip(weights) {
            votes[self.fit_y[neighbor.index]] += weight;
        }
        // First maximum wins, so ties go to the smallest label.
        let mut best = 0;
        for (i, v) in votes.iter().enumerate() {
            if *v > votes[best] {
                best = i;
            }
        }
        self.classes[best]
    }
}

fn vote_weights(neighbors: &[Neighbor], weights: KnnWeights) -> Vec<f64> {
    match weights {
        KnnWeights::Uniform => vec![1.0; neighbors.len()],
        KnnWeights::Distance => {
            if neighbors.iter().any(|n| n.distance == 0.0) {
                neighbors
                    .iter()
                    .map(|n| if n.distance == 0.0 { 1.0 } else { 0.0 })
                    .collect()
            } else {
                neighbors.iter().map(|n| 1.0 / n.distance).collect()
            }
        }
    }
}

/// Sorted distinct values.
pub fn distinct_labels(labels: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut classes: Vec<f64> = labels.collect();
    classes.sort_by(f64::total_cmp);
    classes.dedup();
    classes
}

fn class_position(classes: &[f64], label: f64) -> usize {
    classes
        .binary_search_by(|c| c.total_cmp(&label))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn params(n_neighbors: usize, weights: KnnWeights, algorithm: KnnAlgorithm) -> KnnParams {
        KnnParams {
            n_neighbors,
            weights,
            algorithm,
        }
    }

    #[test]
    fn test_predicts_nearest_cluster() {
        let x = array![[0.0, 0.0], [0.1, 0.2], [0.2, 0.1], [5.0, 5.0], [5.1, 4.9], [4.8, 5.2]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        for algorithm in [KnnAlgorithm::Auto, KnnAlgorithm::Brute, KnnAlgorithm::KdTree] {
            let clf = KnnClassifier::fit(params(3, KnnWeights::Distance, algorithm), &x, &y).unwrap();
            let pred = clf.predict(&array![[0.3, 0.3], [4.5, 4.5]]).unwrap();
            assert_eq!(pred, array![0.0, 1.0]);
        }
    }

    #[test]
    fn test_distance_weighting_reproduces_training_labels() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0.0, 1.0, 0.0, 1.0];
        let clf = KnnClassifier::fit(params(3, KnnWeights::Distance, KnnAlgorithm::Brute), &x, &y)
            .unwrap();
        assert_eq!(clf.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_uniform_tie_goes_to_smallest_label() {
        let x = array![[0.0], [2.0]];
        let y = array![1.0, 0.0];
        let clf =
            KnnClassifier::fit(params(2, KnnWeights::Uniform, KnnAlgorithm::Brute), &x, &y).unwrap();
        assert_eq!(clf.predict(&array![[1.0]]).unwrap(), array![0.0]);
    }

    #[test]
    fn test_rejects_too_many_neighbors() {
        let x = array![[0.0], [1.0]];
        let y = array![0.0, 1.0];
        let err = KnnClassifier::fit(params(3, KnnWeights::Uniform, KnnAlgorithm::Auto), &x, &y)
            .unwrap_err();
        assert!(matches!(err, ErrorKind::InvalidData(_)));
    }

    #[test]
    fn test_feature_count_mismatch() {
        let x = array![[0.0, 1.0], [1.0, 0.0]];
        let y = array![0.0, 1.0];
        let clf = KnnClassifier::fit(KnnParams { n_neighbors: 1, ..Default::default() }, &x, &y)
            .unwrap();
        assert!(clf.predict(&array![[1.0]]).is_err());
    }

    #[test]
    fn test_serde_roundtrip_predicts_the_same() {
        let x = array![[0.0, 0.0], [1.0, 1.0], [4.0, 4.0], [5.0, 5.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let clf = KnnClassifier::fit(KnnParams::default(), &x, &y).unwrap();
        let json = serde_json::to_string(&clf).unwrap();
        let back: KnnClassifier = serde_json::from_str(&json).unwrap();
        let q = array![[0.5, 0.2], [4.4, 4.9]];
        assert_eq!(back.predict(&q).unwrap(), clf.predict(&q).unwrap());
    }
}
