pub mod artifact;
pub mod config;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod inference;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod schema;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::TrainConfig;
pub use encoder::{encode_batch, encode_record, fit_schema, CarRecord, FeatureRow};
pub use error::{PredictorError, Result};
pub use inference::{format_price, CarInput, Predictor};
pub use metrics::RegressionMetrics;
pub use model::{FeatureMatrix, Regressor, XgbParams, XgbRegressor};
pub use pipeline::{run_training, train_from_frame, TrainingReport};
pub use schema::{CanonicalSchema, CategoricalField, UnknownCategoryPolicy};
