//! Regression diagnostics reported after training.

use crate::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    pub r2: f64,
}

impl RegressionMetrics {
    /// Compare predictions with the held-out targets.
    pub fn evaluate(actual: &[f32], predicted: &[f32]) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(PredictorError::SchemaMismatch(format!(
                "{} targets but {} predictions",
                actual.len(),
                predicted.len()
            )));
        }
        if actual.is_empty() {
            return Err(PredictorError::EmptyDataset("nothing to evaluate".into()));
        }

        let n = actual.len() as f64;
        let mut abs_sum = 0.0;
        let mut sq_sum = 0.0;
        for (&a, &p) in actual.iter().zip(predicted) {
            let err = f64::from(a) - f64::from(p);
            abs_sum += err.abs();
            sq_sum += err * err;
        }

        let mean = actual.iter().map(|&a| f64::from(a)).sum::<f64>() / n;
        let total: f64 = actual
            .iter()
            .map(|&a| (f64::from(a) - mean).powi(2))
            .sum();

        // constant target: perfect fit scores 1, anything else 0
        let r2 = if total == 0.0 {
            if sq_sum == 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            1.0 - sq_sum / total
        };

        let mse = sq_sum / n;
        Ok(Self {
            mae: abs_sum / n,
            mse,
            rmse: mse.sqrt(),
            r2,
        })
    }
}

impl fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mean Absolute Error (MAE) : {:.2}", self.mae)?;
        writeln!(f, "Mean Squared Error (MSE) : {:.2}", self.mse)?;
        writeln!(f, "Root Mean Squared Error (RMSE) : {:.2}", self.rmse)?;
        write!(f, "R² Score : {:.4}", self.r2)
    }
}
