//! Yeo-Johnson power transform followed by standardisation.
//!
//! The exponent λ is chosen per column by maximising the Yeo-Johnson
//! log-likelihood with a golden-section search over `[-5, 5]`.

use crate::preprocess::scaler::{StandardScaler, mean, population_std};
use serde::{Deserialize, Serialize};

const LAMBDA_BOUNDS: (f64, f64) = (-5.0, 5.0);
const SEARCH_TOLERANCE: f64 = 1e-8;
const SEARCH_MAX_ITER: usize = 200;
const ZERO: f64 = 1e-10;

/// Apply the Yeo-Johnson transform with exponent `lambda` to one value.
pub fn yeo_johnson(y: f64, lambda: f64) -> f64 {
    if y >= 0.0 {
        if lambda.abs() < ZERO {
            y.ln_1p()
        } else {
            ((y + 1.0).powf(lambda) - 1.0) / lambda
        }
    } else if (lambda - 2.0).abs() < ZERO {
        -(-y).ln_1p()
    } else {
        -((1.0 - y).powf(2.0 - lambda) - 1.0) / (2.0 - lambda)
    }
}

/// Profile log-likelihood of `lambda` for the sample `values`.
pub fn log_likelihood(values: &[f64], lambda: f64) -> f64 {
    let n = values.len() as f64;
    let transformed: Vec<f64> = values.iter().map(|y| yeo_johnson(*y, lambda)).collect();
    let m = mean(&transformed);
    let var = population_std(&transformed, m).powi(2);
    if !(var > 0.0) || !var.is_finite() {
        return f64::NEG_INFINITY;
    }
    let jacobian: f64 = values
        .iter()
        .map(|y| y.signum() * y.abs().ln_1p())
        .sum();
    -n / 2.0 * var.ln() + (lambda - 1.0) * jacobian
}

/// Maximise a unimodal `f` on `[lo, hi]`.
fn golden_section_max(f: impl Fn(f64) -> f64, lo: f64, hi: f64) -> f64 {
    let inv_phi = (5f64.sqrt() - 1.0) / 2.0;
    let (mut a, mut b) = (lo, hi);
    let mut c = b - inv_phi * (b - a);
    let mut d = a + inv_phi * (b - a);
    let (mut fc, mut fd) = (f(c), f(d));

    for _ in 0..SEARCH_MAX_ITER {
        if (b - a).abs() < SEARCH_TOLERANCE {
            break;
        }
        if fc > fd {
            b = d;
            d = c;
            fd = fc;
            c = b - inv_phi * (b - a);
            fc = f(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + inv_phi * (b - a);
            fd = f(d);
        }
    }
    (a + b) / 2.0
}

/// Fitted power transform for one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerTransformer {
    pub lambda: f64,
    pub scaler: StandardScaler,
}

impl PowerTransformer {
    pub fn fit(values: &[f64]) -> Self {
        let m = mean(values);
        let lambda = if population_std(values, m) > 0.0 {
            let (lo, hi) = LAMBDA_BOUNDS;
            golden_section_max(|l| log_likelihood(values, l), lo, hi)
        } else {
            1.0
        };
        let transformed: Vec<f64> = values.iter().map(|y| yeo_johnson(*y, lambda)).collect();
        Self {
            lambda,
            scaler: StandardScaler::fit(&transformed),
        }
    }

    pub fn transform(&self, x: f64) -> f64 {
        self.scaler.transform(yeo_johnson(x, self.lambda))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_transform_values() {
        assert!((yeo_johnson(3.0, 0.0) - 4f64.ln()).abs() < 1e-12);
        assert!((yeo_johnson(3.0, 1.0) - 3.0).abs() < 1e-12);
        assert!((yeo_johnson(-3.0, 2.0) + 4f64.ln()).abs() < 1e-12);
        assert!((yeo_johnson(-3.0, 1.0) + 3.0).abs() < 1e-12);
        assert!((yeo_johnson(2.0, 2.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_transform_is_monotonic() {
        for lambda in [-2.0, 0.0, 0.5, 1.0, 2.0, 3.5] {
            let mut prev = f64::NEG_INFINITY;
            for i in -20..=20 {
                let v = yeo_johnson(i as f64 * 0.5, lambda);
                assert!(v > prev, "lambda {lambda} at {i}");
                prev = v;
            }
        }
    }

    #[test]
    fn test_right_skewed_gets_lambda_below_one() {
        let values: Vec<f64> = (1..=50).map(|i| (i as f64 / 5.0).exp()).collect();
        let pt = PowerTransformer::fit(&values);
        assert!(pt.lambda < 1.0, "lambda = {}", pt.lambda);
        let out: Vec<f64> = values.iter().map(|v| pt.transform(*v)).collect();
        assert!(mean(&out).abs() < 1e-9);
        assert!((population_std(&out, 0.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_column() {
        let pt = PowerTransformer::fit(&[2.0, 2.0, 2.0]);
        assert_eq!(pt.lambda, 1.0);
        assert_eq!(pt.transform(2.0), 0.0);
    }

    #[test]
    fn test_golden_section_finds_parabola_peak() {
        let x = golden_section_max(|x| -(x - 1.25).powi(2), -5.0, 5.0);
        assert!((x - 1.25).abs() < 1e-6);
    }
}
