use std::io::Read;

use serde::Deserialize;

/// Capability the estimator needs from a trained regressor.
pub trait PriceModel: Send + Sync {
    /// Width of the feature vector the model was trained on.
    fn feature_count(&self) -> usize;

    fn predict(&self, features: &[f64]) -> Result<f64, ModelError>;
}

/// Linear regression exported by the training notebook as JSON.
///
/// ```json
/// { "coefficients": [..], "intercept": 0.0, "feature_names": [..] }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinearPriceModel {
    coefficients: Vec<f64>,
    intercept: f64,
    #[serde(default)]
    feature_names: Option<Vec<String>>,
}

impl LinearPriceModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
            feature_names: None,
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }

    /// Column names recorded at training time, when the export includes them.
    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }
}

impl PriceModel for LinearPriceModel {
    fn feature_count(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.coefficients.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.coefficients.len(),
                actual: features.len(),
            });
        }

        let prediction = self
            .coefficients
            .iter()
            .zip(features)
            .fold(self.intercept, |acc, (weight, value)| acc + weight * value);

        if prediction.is_finite() {
            Ok(prediction)
        } else {
            Err(ModelError::NonFinite)
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("model expects {expected} features, received {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("model produced a non-finite prediction")]
    NonFinite,
}
