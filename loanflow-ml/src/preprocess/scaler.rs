//! Column statistics: mean imputation and standard scaling.

use serde::{Deserialize, Serialize};

/// Mean of `values`, or 0 when empty.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Population standard deviation around `mean`.
pub fn population_std(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// `(x - mean) / scale`. A constant column gets scale 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: f64,
    pub scale: f64,
}

impl StandardScaler {
    pub fn fit(values: &[f64]) -> Self {
        let mean = mean(values);
        let std = population_std(values, mean);
        let scale = if std > f64::EPSILON { std } else { 1.0 };
        Self { mean, scale }
    }

    pub fn transform(&self, x: f64) -> f64 {
        (x - self.mean) / self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardizes() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let scaler = StandardScaler::fit(&values);
        let out: Vec<f64> = values.iter().map(|v| scaler.transform(*v)).collect();
        assert!(mean(&out).abs() < 1e-12);
        assert!((population_std(&out, 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_scale_one() {
        let scaler = StandardScaler::fit(&[5.0, 5.0, 5.0]);
        assert_eq!(scaler.scale, 1.0);
        assert_eq!(scaler.transform(5.0), 0.0);
    }
}
