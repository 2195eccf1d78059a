//! Error types shared by training and inference.

use thiserror::Error;

/// Errors raised while loading data, encoding features, training or predicting.
#[derive(Error, Debug)]
pub enum PredictorError {
    /// A column the pipeline consumes is absent from the dataset
    #[error("missing column: {0}")]
    MissingColumn(String),

    /// A categorical value that is neither an indicator nor the baseline of its field
    #[error("unknown category '{value}' for field '{field}'")]
    UnknownCategory { field: String, value: String },

    /// A form label with no entry in the translation table
    #[error("unknown label '{label}' for field '{field}'")]
    UnknownLabel { field: String, label: String },

    /// A numeric input outside its allowed range
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// The schema artifact disagrees with itself or with the model
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A numeric column holds a value that is not a number
    #[error("column '{column}' holds non-numeric values: {detail}")]
    NonNumeric { column: String, detail: String },

    /// A null survived into a place that needs a number
    #[error("missing value in column '{column}' at row {row}")]
    MissingValue { column: String, row: usize },

    /// No rows left to work with
    #[error("empty dataset: {0}")]
    EmptyDataset(String),

    /// Invalid training configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failure reported by the model capability
    #[error("model error: {0}")]
    Model(String),

    #[error("data error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("download error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, PredictorError>;
