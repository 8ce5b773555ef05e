//! Evaluation metrics for demand forecasts.
//!
//! Four metrics over paired actual/predicted arrays:
//!
//! - **MAE/RMSE**: scale-dependent errors in demand units
//! - **MAPE/sMAPE**: scale-independent percentage errors
//!
//! `compute_all` bundles the four into one record with values rounded to
//! two decimal places, matching the persisted metrics schema.

use serde::{Deserialize, Serialize};

use crate::error::{DemandError, Result};

/// Guard against division by zero in the percentage metrics.
const EPS: f64 = 1e-8;

fn validate_inputs(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() {
        return Err(DemandError::InvalidInput(format!(
            "actual ({}) and predicted ({}) must have the same length",
            actual.len(),
            predicted.len()
        )));
    }
    if actual.is_empty() {
        return Err(DemandError::InvalidInput(
            "input arrays must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Mean Absolute Error.
///
/// # Formula
/// MAE = (1/n) * Σ|actual_i - predicted_i|
pub fn mae(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    validate_inputs(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Root Mean Squared Error.
///
/// # Formula
/// RMSE = √[(1/n) * Σ(actual_i - predicted_i)²]
pub fn rmse(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    validate_inputs(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Ok((sum / actual.len() as f64).sqrt())
}

/// Mean Absolute Percentage Error.
///
/// # Formula
/// MAPE = (100/n) * Σ|(actual_i - predicted_i) / (actual_i + ε)|
pub fn mape(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    validate_inputs(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| ((a - p) / (a + EPS)).abs())
        .sum();
    Ok(sum / actual.len() as f64 * 100.0)
}

/// Symmetric Mean Absolute Percentage Error, bounded in [0, 200].
///
/// # Formula
/// sMAPE = (100/n) * Σ|predicted_i - actual_i| / ((|actual_i| + |predicted_i|)/2 + ε)
pub fn smape(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    validate_inputs(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (p - a).abs() / ((a.abs() + p.abs()) / 2.0 + EPS))
        .sum();
    Ok(sum / actual.len() as f64 * 100.0)
}

/// Round to two decimal places, as persisted in the metrics artifacts.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The full metrics suite for one evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    pub mae: f64,
    pub rmse: f64,
    pub smape: f64,
    pub mape: f64,
}

/// Compute all four metrics, each rounded to two decimal places.
pub fn compute_all(actual: &[f64], predicted: &[f64]) -> Result<MetricsResult> {
    Ok(MetricsResult {
        mae: round2(mae(actual, predicted)?),
        rmse: round2(rmse(actual, predicted)?),
        smape: round2(smape(actual, predicted)?),
        mape: round2(mape(actual, predicted)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mae() {
        let actual = vec![100.0, 200.0, 300.0];
        let predicted = vec![110.0, 190.0, 300.0];
        assert_relative_eq!(mae(&actual, &predicted).unwrap(), 20.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rmse() {
        let actual = vec![100.0, 200.0, 300.0];
        let predicted = vec![110.0, 190.0, 300.0];
        assert_relative_eq!(
            rmse(&actual, &predicted).unwrap(),
            (200.0f64 / 3.0).sqrt(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_rmse_at_least_mae() {
        let actual = vec![10.0, 50.0, 120.0, 80.0, 33.0];
        let predicted = vec![12.0, 45.0, 100.0, 90.0, 30.0];
        let mae_v = mae(&actual, &predicted).unwrap();
        let rmse_v = rmse(&actual, &predicted).unwrap();
        assert!(rmse_v >= mae_v);
    }

    #[test]
    fn test_mape() {
        let actual = vec![100.0, 200.0, 300.0];
        let predicted = vec![110.0, 190.0, 300.0];
        // (10% + 5% + 0%) / 3
        assert_relative_eq!(mape(&actual, &predicted).unwrap(), 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_smape_bounded() {
        // Worst case: opposite signs drive sMAPE to its 200 ceiling
        let actual = vec![100.0, 50.0];
        let predicted = vec![-100.0, -50.0];
        let v = smape(&actual, &predicted).unwrap();
        assert!(v <= 200.0 + 1e-6);

        let perfect = smape(&actual, &actual).unwrap();
        assert_relative_eq!(perfect, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_smape_handles_zero_pairs() {
        let actual = vec![0.0, 100.0];
        let predicted = vec![0.0, 100.0];
        let v = smape(&actual, &predicted).unwrap();
        assert!(v.is_finite());
        assert_relative_eq!(v, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_compute_all_rounded() {
        let actual = vec![100.0, 200.0, 300.0];
        let predicted = vec![110.0, 190.0, 300.0];
        let m = compute_all(&actual, &predicted).unwrap();
        assert_relative_eq!(m.mae, 6.67);
        assert_relative_eq!(m.rmse, 8.16);
        assert_relative_eq!(m.mape, 5.0);
        assert_relative_eq!(m.smape, 4.88);
    }

    #[test]
    fn test_length_mismatch() {
        let actual = vec![1.0, 2.0];
        let predicted = vec![1.0];
        assert!(matches!(
            mae(&actual, &predicted).unwrap_err(),
            DemandError::InvalidInput(_)
        ));
        assert!(compute_all(&actual, &predicted).is_err());
    }

    #[test]
    fn test_empty_input() {
        let empty: Vec<f64> = vec![];
        assert!(mae(&empty, &empty).is_err());
        assert!(smape(&empty, &empty).is_err());
    }
}
