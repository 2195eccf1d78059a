//! Offline training: raw CSV in, model artifact and evaluation metrics out.

use crate::artifact::save_artifact;
use crate::config::TrainConfig;
use crate::dataset::{
    check_required_columns, drop_ignored_columns, drop_missing_rows, load_csv_file,
    split_features_and_target, train_test_split,
};
use crate::encoder::{encode_batch, fit_schema};
use crate::error::Result;
use crate::metrics::RegressionMetrics;
use crate::model::Regressor;
use crate::schema::{CanonicalSchema, UnknownCategoryPolicy};
use polars::prelude::DataFrame;
use std::path::Path;
use tracing::info;

/// Outcome of a training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub schema: CanonicalSchema,
    pub metrics: RegressionMetrics,
    pub n_train: usize,
    pub n_test: usize,
}

/// Train on an already loaded raw table.
pub fn train_from_frame<M: Regressor>(
    raw: &DataFrame,
    config: &TrainConfig,
    params: &M::Params,
) -> Result<(M, TrainingReport)> {
    config.validate()?;

    let df = check_required_columns(&drop_ignored_columns(raw))?;

    let schema = fit_schema(&df)?;
    // the vocabulary was fitted on this very table, so nothing is unknown here
    let encoded = encode_batch(&df, &schema, UnknownCategoryPolicy::Reject)?;
    let encoded = drop_missing_rows(&encoded)?;

    let (train_df, test_df) = train_test_split(&encoded, config.test_ratio, config.seed)?;
    let (x_train, y_train) = split_features_and_target(&train_df, &schema)?;
    let (x_test, y_test) = split_features_and_target(&test_df, &schema)?;

    let model = M::fit(&x_train, &y_train, params)?;

    let y_pred = model.predict(&x_test)?;
    let metrics = RegressionMetrics::evaluate(&y_test, &y_pred)?;
    info!(
        mae = metrics.mae,
        mse = metrics.mse,
        rmse = metrics.rmse,
        r2 = metrics.r2,
        "model evaluated on held-out rows"
    );

    let report = TrainingReport {
        schema,
        metrics,
        n_train: x_train.rows,
        n_test: x_test.rows,
    };
    Ok((model, report))
}

/// Full run: load the dataset, train, evaluate and write the artifact.
pub fn run_training<M: Regressor>(
    config: &TrainConfig,
    params: &M::Params,
    dataset_path: &Path,
    artifact_dir: &Path,
) -> Result<TrainingReport> {
    let raw = load_csv_file(dataset_path)?;
    let (model, report) = train_from_frame::<M>(&raw, config, params)?;
    save_artifact(artifact_dir, &model, &report.schema)?;
    Ok(report)
}
