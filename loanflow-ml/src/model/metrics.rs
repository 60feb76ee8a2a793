//! Binary classification metrics.

use crate::error::ErrorKind;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Label treated as the positive class.
pub const POSITIVE_LABEL: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub f1: f64,
    pub precision: f64,
    pub recall: f64,
}

fn check_lengths(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<(), ErrorKind> {
    if y_true.len() != y_pred.len() {
        return Err(ErrorKind::invalid_data(format!(
            "label count {} differs from prediction count {}",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(ErrorKind::invalid_data("cannot score an empty evaluation set"));
    }
    Ok(())
}

pub fn accuracy_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64, ErrorKind> {
    check_lengths(y_true, y_pred)?;
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Accuracy plus precision, recall and F1 for [`POSITIVE_LABEL`]. A zero
/// denominator yields 0.
pub fn classification_metrics(
    y_true: &Array1<f64>,
    y_pred: &Array1<f64>,
) -> Result<ClassificationMetrics, ErrorKind> {
    let accuracy = accuracy_score(y_true, y_pred)?;

    let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        match (*t == POSITIVE_LABEL, *p == POSITIVE_LABEL) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }

    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = ratio(2 * tp, 2 * tp + fp + fn_);
    Ok(ClassificationMetrics {
        accuracy,
        f1,
        precision,
        recall,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_metrics_known_values() {
        let y_true = array![1.0, 1.0, 0.0, 0.0, 1.0];
        let y_pred = array![1.0, 0.0, 0.0, 1.0, 1.0];
        let m = classification_metrics(&y_true, &y_pred).unwrap();
        assert!((m.accuracy - 0.6).abs() < 1e-12);
        assert!((m.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.f1 - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_positive_predictions_gives_zero() {
        let y_true = array![1.0, 0.0];
        let y_pred = array![0.0, 0.0];
        let m = classification_metrics(&y_true, &y_pred).unwrap();
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1, 0.0);
        assert_eq!(m.accuracy, 0.5);
    }

    #[test]
    fn test_empty_set_is_error() {
        let empty = Array1::<f64>::zeros(0);
        assert!(classification_metrics(&empty, &empty).is_err());
    }
}
