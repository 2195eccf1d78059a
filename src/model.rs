//! The regression model capability and its XGBoost implementation.

use crate::error::{PredictorError, Result};
use std::path::Path;
use tracing::{debug, info};
use xgboost::{parameters, Booster, DMatrix};

/// Dense row-major feature matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f32>,
}

impl FeatureMatrix {
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        if rows * cols != data.len() {
            return Err(PredictorError::SchemaMismatch(format!(
                "{rows}x{cols} matrix needs {} values, got {}",
                rows * cols,
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }
}

/// Fit / predict / persist: everything the pipeline needs from a model.
pub trait Regressor: Sized {
    type Params;

    fn fit(x: &FeatureMatrix, y: &[f32], params: &Self::Params) -> Result<Self>;

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f32>>;

    fn save(&self, path: &Path) -> Result<()>;

    fn load(path: &Path) -> Result<Self>;

    /// Number of features the model was trained on, when the model records it.
    fn n_features(&self) -> Option<usize>;
}

/// Gradient boosting settings.
#[derive(Debug, Clone, PartialEq)]
pub struct XgbParams {
    pub boost_rounds: u32,
    pub max_depth: u32,
    pub learning_rate: f32,
    pub seed: u64,
}

impl Default for XgbParams {
    fn default() -> Self {
        Self {
            boost_rounds: 100,
            max_depth: 6,
            learning_rate: 0.3,
            seed: 42,
        }
    }
}

/// Gradient boosted regression trees with a squared-error objective.
pub struct XgbRegressor {
    booster: Booster,
    n_features: usize,
}

/// Booster attribute holding the training width; saved inside `model.bin`.
const N_FEATURES_ATTR: &str = "n_features";

fn model_err(e: impl std::fmt::Display) -> PredictorError {
    PredictorError::Model(e.to_string())
}

fn to_dmatrix(x: &FeatureMatrix) -> Result<DMatrix> {
    if x.rows == 0 {
        return Err(PredictorError::EmptyDataset("no rows to hand to the model".into()));
    }
    DMatrix::from_dense(&x.data, x.rows).map_err(model_err)
}

impl Regressor for XgbRegressor {
    type Params = XgbParams;

    fn fit(x: &FeatureMatrix, y: &[f32], params: &XgbParams) -> Result<Self> {
        if y.len() != x.rows {
            return Err(PredictorError::SchemaMismatch(format!(
                "{} targets for {} rows",
                y.len(),
                x.rows
            )));
        }

        let mut dtrain = to_dmatrix(x)?;
        dtrain.set_labels(y).map_err(model_err)?;

        let learning_params = parameters::learning::LearningTaskParametersBuilder::default()
            .objective(parameters::learning::Objective::RegLinear)
            .seed(params.seed)
            .build()
            .map_err(model_err)?;

        let tree_params = parameters::tree::TreeBoosterParametersBuilder::default()
            .max_depth(params.max_depth)
            .eta(params.learning_rate)
            .build()
            .map_err(model_err)?;

        let booster_params = parameters::BoosterParametersBuilder::default()
            .booster_type(parameters::BoosterType::Tree(tree_params))
            .learning_params(learning_params)
            .verbose(false)
            .build()
            .map_err(model_err)?;

        let evaluation_sets = &[(&dtrain, "train")];
        let training_params = parameters::TrainingParametersBuilder::default()
            .dtrain(&dtrain)
            .boost_rounds(params.boost_rounds)
            .booster_params(booster_params)
            .evaluation_sets(Some(evaluation_sets))
            .build()
            .map_err(model_err)?;

        info!(
            rows = x.rows,
            features = x.cols,
            rounds = params.boost_rounds,
            "training xgboost regressor"
        );
        let mut booster = Booster::train(&training_params).map_err(model_err)?;
        booster
            .set_attribute(N_FEATURES_ATTR, &x.cols.to_string())
            .map_err(model_err)?;
        Ok(Self {
            booster,
            n_features: x.cols,
        })
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f32>> {
        // the booster itself ignores columns past its width
        if x.cols != self.n_features {
            return Err(PredictorError::SchemaMismatch(format!(
                "model trained on {} features, got {}",
                self.n_features, x.cols
            )));
        }
        let dmatrix = to_dmatrix(x)?;
        let predictions = self.booster.predict(&dmatrix).map_err(model_err)?;
        if predictions.len() != x.rows {
            return Err(PredictorError::Model(format!(
                "model returned {} predictions for {} rows",
                predictions.len(),
                x.rows
            )));
        }
        Ok(predictions)
    }

    fn save(&self, path: &Path) -> Result<()> {
        self.booster.save(path).map_err(model_err)?;
        debug!(path = %path.display(), "model saved");
        Ok(())
    }

    fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PredictorError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("model file {} not found", path.display()),
            )));
        }
        let booster = Booster::load(path).map_err(model_err)?;
        let n_features = booster
            .get_attribute(N_FEATURES_ATTR)
            .map_err(model_err)?
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| {
                PredictorError::SchemaMismatch(format!(
                    "model {} does not record its feature count",
                    path.display()
                ))
            })?;
        debug!(path = %path.display(), n_features, "model loaded");
        Ok(Self {
            booster,
            n_features,
        })
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }
}
