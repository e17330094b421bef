//! Linear regression model, the model-kind registry, and the rounding rule
//! applied to every served prediction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    /// The encoder's output width does not match the model's weight count.
    /// The persisted pair is corrupt or mismatched; not retried.
    #[error("feature vector length mismatch: got {got}, model expects {expected}")]
    DimensionMismatch { got: usize, expected: usize },
}

/// Fitted regression function `vector -> scalar`. Paired 1:1 with the
/// vectorizer that produced its training matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl LinearModel {
    pub fn predict(&self, x: &[f64]) -> Result<f64, PredictError> {
        if x.len() != self.weights.len() {
            return Err(PredictError::DimensionMismatch {
                got: x.len(),
                expected: self.weights.len(),
            });
        }
        let dot: f64 = x.iter().zip(&self.weights).map(|(a, w)| a * w).sum();
        Ok(self.intercept + dot)
    }

    pub fn width(&self) -> usize {
        self.weights.len()
    }
}

/// Rounds a served prediction to 2 decimal places, half away from zero on
/// the scaled value.
///
/// Pinned behavior: `15.455_f64` is stored just above the decimal tie and
/// scales to exactly `1545.5`, so it rounds up to 15.46; `-2.675` rounds
/// away from zero to -2.68.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// The closed set of supported regressor kinds.
///
/// Resolved by name at startup instead of loading a model class
/// dynamically; an unknown name is rejected before any training runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Linear,
    Ridge,
}

impl ModelKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "linear" => Some(ModelKind::Linear),
            "ridge" => Some(ModelKind::Ridge),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Linear => "linear",
            ModelKind::Ridge => "ridge",
        }
    }

    fn l2(&self) -> f64 {
        match self {
            ModelKind::Linear => 0.0,
            ModelKind::Ridge => 0.1,
        }
    }

    /// Fits a model by full-batch gradient descent on squared error
    /// (ridge adds L2 on the weights, not the intercept).
    ///
    /// The step size is normalized by the mean squared row norm, which
    /// keeps descent stable regardless of feature scale.
    pub fn fit(&self, xs: &[Vec<f64>], ys: &[f64]) -> LinearModel {
        const EPOCHS: usize = 2000;

        let n = xs.len();
        let dim = xs.first().map_or(0, Vec::len);
        let mut weights = vec![0.0; dim];
        let mut intercept = if n == 0 {
            0.0
        } else {
            ys.iter().sum::<f64>() / n as f64
        };
        if n == 0 {
            return LinearModel { weights, intercept };
        }

        let scale = 1.0 / n as f64;
        // +1.0 accounts for the implicit intercept column.
        let mean_sq_norm = scale
            * xs.iter()
                .map(|x| x.iter().map(|v| v * v).sum::<f64>())
                .sum::<f64>()
            + 1.0;
        let lr = 1.0 / mean_sq_norm;

        let l2 = self.l2();
        for _ in 0..EPOCHS {
            let mut grad_w = vec![0.0; dim];
            let mut grad_b = 0.0;
            for (x, &y) in xs.iter().zip(ys) {
                let dot: f64 = x.iter().zip(&weights).map(|(a, w)| a * w).sum();
                let err = intercept + dot - y;
                grad_b += err;
                for (g, &xi) in grad_w.iter_mut().zip(x) {
                    *g += err * xi;
                }
            }
            intercept -= lr * scale * grad_b;
            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= lr * (scale * g + l2 * *w);
            }
        }

        LinearModel { weights, intercept }
    }
}
