//! Dataset loading, cleaning and splitting.

use crate::encoder::numeric_series;
use crate::error::{PredictorError, Result};
use crate::model::FeatureMatrix;
use crate::schema::{
    CanonicalSchema, CATEGORICAL_FIELDS, CONTINUOUS_COLUMNS, IGNORED_COLUMNS, TARGET_COLUMN,
};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;
use tracing::{debug, info, warn};

/// Download a CSV file to `file_path`.
pub fn fetch_dataset(url: &str, file_path: &Path) -> Result<()> {
    info!(url, "downloading dataset");

    let response = reqwest::blocking::get(url)?.error_for_status()?;
    let bytes = response.bytes()?;
    std::fs::write(file_path, &bytes)?;

    info!(path = %file_path.display(), bytes = bytes.len(), "dataset saved");
    Ok(())
}

/// Read a CSV file with a header row.
pub fn load_csv_file(file_path: &Path) -> Result<DataFrame> {
    let df = CsvReader::from_path(file_path)?
        .has_header(true)
        .finish()?;

    info!(
        rows = df.height(),
        columns = df.width(),
        path = %file_path.display(),
        "dataset loaded"
    );
    Ok(df)
}

/// Remove the raw columns that carry no feature.
pub fn drop_ignored_columns(df: &DataFrame) -> DataFrame {
    let names = df.get_column_names();
    let present: Vec<&str> = IGNORED_COLUMNS
        .iter()
        .copied()
        .filter(|c| names.contains(c))
        .collect();
    debug!(?present, "dropping ignored columns");
    df.drop_many(&present)
}

/// Keep exactly the consumed columns.
///
/// Any consumed column that is absent is an error. Columns that are neither
/// consumed nor known to be ignored are logged and left out.
pub fn check_required_columns(df: &DataFrame) -> Result<DataFrame> {
    let required: Vec<&str> = CONTINUOUS_COLUMNS
        .iter()
        .chain(CATEGORICAL_FIELDS.iter())
        .copied()
        .chain(std::iter::once(TARGET_COLUMN))
        .collect();

    let names = df.get_column_names();
    if let Some(missing) = required.iter().find(|c| !names.contains(*c)) {
        return Err(PredictorError::MissingColumn(missing.to_string()));
    }
    for extra in names.iter().filter(|c| !required.contains(*c)) {
        warn!(column = *extra, "unexpected column excluded from features");
    }

    Ok(df.select(required)?)
}

/// Drop every row that has a null in any column.
pub fn drop_missing_rows(df: &DataFrame) -> Result<DataFrame> {
    let cleaned = df.drop_nulls::<String>(None)?;
    let dropped = df.height() - cleaned.height();
    if dropped > 0 {
        warn!(dropped, remaining = cleaned.height(), "rows with missing values removed");
    }
    if cleaned.height() == 0 {
        return Err(PredictorError::EmptyDataset(
            "every row has a missing value".into(),
        ));
    }
    Ok(cleaned)
}

/// Shuffle rows with a seeded generator and cut off `ceil(n * test_ratio)` for testing.
///
/// Returns `(train, test)`. The same seed over the same table always gives the
/// same partitions.
pub fn train_test_split(
    df: &DataFrame,
    test_ratio: f64,
    seed: u64,
) -> Result<(DataFrame, DataFrame)> {
    let n = df.height();
    let n_test = (n as f64 * test_ratio).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(PredictorError::EmptyDataset(format!(
            "cannot split {n} rows with test ratio {test_ratio}"
        )));
    }

    let mut indices: Vec<IdxSize> = (0..n as IdxSize).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (test_indices, train_indices) = indices.split_at(n_test);
    let train_ca = IdxCa::from_vec("", train_indices.to_vec());
    let test_ca = IdxCa::from_vec("", test_indices.to_vec());

    let train_df = df.take(&train_ca)?;
    let test_df = df.take(&test_ca)?;

    info!(train = train_df.height(), test = test_df.height(), seed, "dataset split");
    Ok((train_df, test_df))
}

/// Pull the feature matrix (schema order) and the target out of an encoded table.
pub fn split_features_and_target(
    df: &DataFrame,
    schema: &CanonicalSchema,
) -> Result<(FeatureMatrix, Vec<f32>)> {
    let columns = schema.columns();
    let rows = df.height();
    let cols = columns.len();
    let mut data = vec![0f32; rows * cols];

    for (j, name) in columns.iter().enumerate() {
        for (i, value) in numeric_column(df, name)?.into_iter().enumerate() {
            data[i * cols + j] = value;
        }
    }

    let target = numeric_column(df, &schema.target)?;
    Ok((FeatureMatrix::new(rows, cols, data)?, target))
}

fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f32>> {
    let series = numeric_series(df, name)?;
    series
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.map(|v| v as f32).ok_or_else(|| PredictorError::MissingValue {
                column: name.to_string(),
                row,
            })
        })
        .collect()
}
