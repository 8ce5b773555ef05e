//! Pluggable regression seam.
//!
//! The pipeline only needs `fit`/`predict` over a feature matrix; any
//! regression algorithm can sit behind [`Regressor`]. The built-in
//! baseline is OLS linear regression.

use anofox_regression::prelude::*;
// The prelude's own regression trait shares a name with the seam below;
// import it anonymously so `fit`/`predict` still resolve on OlsRegressor.
use anofox_regression::prelude::Regressor as _;

use crate::error::{DemandError, Result};

/// Algorithm-agnostic regression trainer.
///
/// Feature matrices are column-major: one inner slice per feature, each of
/// length n_rows, matching `FeatureTable::columns`.
pub trait Regressor {
    /// Train on a feature matrix and target vector.
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()>;

    /// Predict targets for a feature matrix.
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>>;

    /// Short model identifier used in output keys (e.g. "linear").
    fn name(&self) -> &str;
}

/// OLS linear regression with intercept.
#[derive(Debug, Clone, Default)]
pub struct LinearRegressor {
    intercept: f64,
    coefficients: Vec<f64>,
    fitted: bool,
}

impl LinearRegressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

fn validate_matrix(x: &[Vec<f64>]) -> Result<usize> {
    let Some(first) = x.first() else {
        return Err(DemandError::InvalidInput(
            "feature matrix must have at least one column".to_string(),
        ));
    };
    let n = first.len();
    if x.iter().any(|col| col.len() != n) {
        return Err(DemandError::InvalidInput(
            "feature columns must all have the same length".to_string(),
        ));
    }
    Ok(n)
}

impl Regressor for LinearRegressor {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()> {
        let n = validate_matrix(x)?;
        if n != y.len() {
            return Err(DemandError::InvalidInput(format!(
                "feature rows ({n}) and targets ({}) must have the same length",
                y.len()
            )));
        }
        if n == 0 {
            return Err(DemandError::InvalidInput(
                "cannot fit on an empty feature table".to_string(),
            ));
        }
        // Constant columns are collinear with the intercept and make the
        // design matrix rank-deficient. Drop them before fitting; the
        // intercept absorbs their contribution and their coefficient is 0.
        let kept: Vec<usize> = (0..x.len())
            .filter(|&j| x[j].iter().any(|v| *v != x[j][0]))
            .collect();

        self.coefficients = vec![0.0; x.len()];
        if kept.is_empty() {
            self.intercept = y.iter().sum::<f64>() / n as f64;
            self.fitted = true;
            return Ok(());
        }

        // Design matrix: n rows, one column per kept feature
        let x_mat = faer::Mat::from_fn(n, kept.len(), |i, j| x[kept[j]][i]);
        let y_col = faer::Col::from_fn(n, |i| y[i]);

        let fitted = OlsRegressor::builder()
            .with_intercept(true)
            .build()
            .fit(&x_mat, &y_col)
            .map_err(|e| DemandError::Computation(format!("OLS fit failed: {e}")))?;

        self.intercept = fitted.intercept().unwrap_or(0.0);
        let coeffs = fitted.coefficients();
        for (slot, &j) in kept.iter().enumerate() {
            self.coefficients[j] = coeffs[slot];
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(DemandError::Computation(
                "OLS produced non-finite coefficients".to_string(),
            ));
        }
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        if !self.fitted {
            return Err(DemandError::InvalidInput(
                "model has not been fitted".to_string(),
            ));
        }
        let n = validate_matrix(x)?;
        if x.len() != self.coefficients.len() {
            return Err(DemandError::InvalidInput(format!(
                "expected {} feature columns, got {}",
                self.coefficients.len(),
                x.len()
            )));
        }
        Ok((0..n)
            .map(|i| {
                self.intercept
                    + self
                        .coefficients
                        .iter()
                        .zip(x.iter())
                        .map(|(beta, col)| beta * col[i])
                        .sum::<f64>()
            })
            .collect())
    }

    fn name(&self) -> &str {
        "linear"
    }
}
