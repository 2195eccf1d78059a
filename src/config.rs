use crate::error::{PredictorError, Result};
use crate::model::XgbParams;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Training configuration. Every field can be left out of the YAML file;
/// keys that are not listed here are rejected.
///
/// Training always fits the vocabulary on the table it encodes, so there is
/// no unknown-category setting here; that policy belongs to inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainConfig {
    /// Seed for the train/test shuffle and the model
    pub seed: u64,
    /// Share of rows held out for evaluation
    pub test_ratio: f64,
    pub boost_rounds: u32,
    pub max_depth: u32,
    pub learning_rate: f32,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            test_ratio: 0.2,
            boost_rounds: 100,
            max_depth: 6,
            learning_rate: 0.3,
        }
    }
}

impl TrainConfig {
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.test_ratio.is_nan() || self.test_ratio <= 0.0 || self.test_ratio >= 1.0 {
            return Err(PredictorError::InvalidConfig(format!(
                "test_ratio must be in (0, 1), got {}",
                self.test_ratio
            )));
        }
        if self.boost_rounds == 0 {
            return Err(PredictorError::InvalidConfig(
                "boost_rounds must be positive".into(),
            ));
        }
        if self.max_depth == 0 {
            return Err(PredictorError::InvalidConfig(
                "max_depth must be positive".into(),
            ));
        }
        if self.learning_rate.is_nan() || self.learning_rate <= 0.0 {
            return Err(PredictorError::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }

    pub fn model_params(&self) -> XgbParams {
        XgbParams {
            boost_rounds: self.boost_rounds,
            max_depth: self.max_depth,
            learning_rate: self.learning_rate,
            seed: self.seed,
        }
    }
}
