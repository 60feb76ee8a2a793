//! Class rebalancing: SMOTE oversampling of the minority class followed by
//! Edited Nearest Neighbours cleaning.

use crate::error::ErrorKind;
use crate::model::knn::distinct_labels;
use crate::model::neighbors::{NeighborIndex, brute_force};
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand::rngs::StdRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmoteEnn {
    /// Neighbours SMOTE interpolates towards.
    pub k_neighbors: usize,
    /// Neighbours ENN checks for agreement.
    pub n_neighbors: usize,
}

impl Default for SmoteEnn {
    fn default() -> Self {
        Self {
            k_neighbors: 5,
            n_neighbors: 3,
        }
    }
}

impl SmoteEnn {
    pub fn new(k_neighbors: usize, n_neighbors: usize) -> Self {
        Self {
            k_neighbors,
            n_neighbors,
        }
    }

    /// Oversample then clean. Returns the resampled features and labels.
    pub fn fit_resample(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rng: &mut StdRng,
    ) -> Result<(Array2<f64>, Array1<f64>), ErrorKind> {
        if x.nrows() != y.len() {
            return Err(ErrorKind::invalid_data(format!(
                "feature rows ({}) and labels ({}) differ",
                x.nrows(),
                y.len()
            )));
        }
        let (x_over, y_over) = smote(x, y, self.k_neighbors, rng)?;
        let (x_clean, y_clean) = edited_nearest_neighbours(&x_over, &y_over, self.n_neighbors)?;
        tracing::debug!(
            before = x.nrows(),
            oversampled = x_over.nrows(),
            after = x_clean.nrows(),
            "Resampled with SMOTE-ENN"
        );
        Ok((x_clean, y_clean))
    }
}

fn class_counts(y: &Array1<f64>) -> Vec<(f64, usize)> {
    distinct_labels(y.iter().copied())
        .into_iter()
        .map(|c| (c, y.iter().filter(|v| **v == c).count()))
        .collect()
}

/// Grow the minority class to the majority count with synthetic samples.
pub fn smote(
    x: &Array2<f64>,
    y: &Array1<f64>,
    k_neighbors: usize,
    rng: &mut StdRng,
) -> Result<(Array2<f64>, Array1<f64>), ErrorKind> {
    let counts = class_counts(y);
    if counts.len() < 2 {
        return Ok((x.clone(), y.clone()));
    }
    let majority = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
    // Smallest count, ties to the smallest label.
    let Some(&(minority_label, minority_count)) = counts.iter().min_by_key(|(_, n)| *n) else {
        return Ok((x.clone(), y.clone()));
    };
    let k = k_neighbors.min(minority_count.saturating_sub(1));
    let n_new = majority - minority_count;
    if k < 1 || n_new == 0 {
        return Ok((x.clone(), y.clone()));
    }

    let minority_rows: Vec<usize> = (0..y.len()).filter(|&i| y[i] == minority_label).collect();
    let minority = x.select(Axis(0), &minority_rows);

    let mut synthetic = Array2::<f64>::zeros((n_new, x.ncols()));
    for mut out in synthetic.rows_mut() {
        let base = rng.gen_range(0..minority_count);
        let neighbors = brute_force(&minority, minority.row(base), k, Some(base));
        let pick = neighbors[rng.gen_range(0..neighbors.len())].index;
        let gap: f64 = rng.gen_range(0.0..1.0);
        let a = minority.row(base);
        let b = minority.row(pick);
        for j in 0..x.ncols() {
            out[j] = a[j] + gap * (b[j] - a[j]);
        }
    }

    let x_out = ndarray::concatenate(Axis(0), &[x.view(), synthetic.view()])
        .map_err(|e| ErrorKind::invalid_data(format!("cannot append synthetic rows: {e}")))?;
    let y_out = y
        .iter()
        .copied()
        .chain(std::iter::repeat_n(minority_label, n_new))
        .collect();
    Ok((x_out, y_out))
}

/// Drop every sample whose `n_neighbors` nearest neighbours do not all share its label.
pub fn edited_nearest_neighbours(
    x: &Array2<f64>,
    y: &Array1<f64>,
    n_neighbors: usize,
) -> Result<(Array2<f64>, Array1<f64>), ErrorKind> {
    if n_neighbors == 0 || x.nrows() <= n_neighbors {
        return Ok((x.clone(), y.clone()));
    }
    let index = NeighborIndex::build(x, None);
    let keep: Vec<usize> = (0..x.nrows())
        .filter(|&i| {
            index
                .query(x, x.row(i), n_neighbors, Some(i))
                .iter()
                .all(|n| y[n.index] == y[i])
        })
        .collect();
    Ok((x.select(Axis(0), &keep), y.select(Axis(0), &keep)))
}
