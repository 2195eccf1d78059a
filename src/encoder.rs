//! Feature encoder: raw car records to fixed-order numeric vectors.
//!
//! Batch mode runs over a polars `DataFrame` at training time. Single-record
//! mode builds one row at inference time. Both go through
//! [`CanonicalSchema::resolve`] so a category activates the same indicator
//! column in either mode.

use crate::error::{PredictorError, Result};
use crate::schema::{
    CanonicalSchema, CategoricalField, UnknownCategoryPolicy, CATEGORICAL_FIELDS,
    CONTINUOUS_COLUMNS,
};
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map_err(|_| PredictorError::MissingColumn(name.to_string()))
}

/// Cast a numeric column to `f64`, refusing values that do not parse as numbers.
pub(crate) fn numeric_series(df: &DataFrame, name: &str) -> Result<Series> {
    column(df, name)?
        .strict_cast(&DataType::Float64)
        .map_err(|e| PredictorError::NonNumeric {
            column: name.to_string(),
            detail: e.to_string(),
        })
}

fn categorical_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = column(df, name)?.cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.trim().to_string()))
        .collect();
    Ok(values)
}

/// Discover the categories of every categorical field and pin their baselines.
pub fn fit_schema(df: &DataFrame) -> Result<CanonicalSchema> {
    let mut fields = Vec::with_capacity(CATEGORICAL_FIELDS.len());
    for name in CATEGORICAL_FIELDS {
        let observed: BTreeSet<String> = categorical_values(df, name)?
            .into_iter()
            .flatten()
            .collect();
        let field = CategoricalField::from_categories(name, observed)?;
        debug!(
            field = name,
            baseline = %field.baseline,
            indicators = field.indicators.len(),
            "resolved categorical field"
        );
        fields.push(field);
    }

    let schema = CanonicalSchema::new(fields);
    info!(n_features = schema.len(), "canonical schema fitted");
    Ok(schema)
}

/// Encode a whole table against `schema`.
///
/// Continuous columns are cast to `f64` and copied as they are. Each
/// categorical column is replaced by its indicator columns. A null category
/// produces null indicators so the row is removed with the other incomplete
/// rows. The target column is carried through when present.
pub fn encode_batch(
    df: &DataFrame,
    schema: &CanonicalSchema,
    policy: UnknownCategoryPolicy,
) -> Result<DataFrame> {
    let mut columns: Vec<Series> = Vec::with_capacity(schema.len() + 1);

    for name in &schema.continuous {
        columns.push(numeric_series(df, name)?);
    }

    for field in &schema.categorical {
        let names: Vec<String> = field.columns().collect();
        let mut indicators: Vec<Vec<Option<f64>>> =
            vec![Vec::with_capacity(df.height()); names.len()];

        for value in categorical_values(df, &field.name)? {
            let active = match value {
                Some(token) => schema.resolve(&field.name, &token, policy)?,
                None => {
                    for values in indicators.iter_mut() {
                        values.push(None);
                    }
                    continue;
                }
            };
            for (name, values) in names.iter().zip(indicators.iter_mut()) {
                let hit = active.as_deref() == Some(name.as_str());
                values.push(Some(if hit { 1.0 } else { 0.0 }));
            }
        }

        for (name, values) in names.iter().zip(indicators) {
            columns.push(Series::new(name, values));
        }
    }

    if df.column(&schema.target).is_ok() {
        columns.push(numeric_series(df, &schema.target)?);
    }

    let encoded = DataFrame::new(columns)?;
    debug!(
        rows = encoded.height(),
        columns = encoded.width(),
        "batch encoded"
    );
    Ok(encoded)
}

/// One car in internal form: continuous values and category tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct CarRecord {
    /// Values in the order of [`CONTINUOUS_COLUMNS`]
    pub continuous: [f64; 12],
    /// Category tokens in the order of [`CATEGORICAL_FIELDS`]
    pub categories: [String; 6],
}

/// A single encoded row, aligned with the schema it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub columns: Vec<String>,
    pub values: Vec<f64>,
}

impl FeatureRow {
    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.values[i])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_f32(&self) -> Vec<f32> {
        self.values.iter().map(|&v| v as f32).collect()
    }
}

/// Encode one record into a full canonical row.
///
/// The row is first built sparsely from the continuous values and the
/// indicators the categories activate. Every canonical column it lacks is
/// then filled with zero and the result is laid out in schema order.
pub fn encode_record(
    record: &CarRecord,
    schema: &CanonicalSchema,
    policy: UnknownCategoryPolicy,
) -> Result<FeatureRow> {
    let mut sparse: HashMap<String, f64> = HashMap::with_capacity(record.continuous.len() + 6);

    for (name, value) in CONTINUOUS_COLUMNS.iter().zip(record.continuous) {
        sparse.insert(name.to_string(), value);
    }
    for (field, token) in CATEGORICAL_FIELDS.iter().zip(&record.categories) {
        if let Some(column) = schema.resolve(field, token, policy)? {
            sparse.insert(column, 1.0);
        }
    }

    let columns = schema.columns();
    if let Some(extra) = sparse.keys().find(|k| !columns.contains(k)) {
        return Err(PredictorError::SchemaMismatch(format!(
            "column '{extra}' is not part of the schema"
        )));
    }

    let values = columns
        .iter()
        .map(|c| sparse.get(c).copied().unwrap_or(0.0))
        .collect();
    Ok(FeatureRow { columns, values })
}
