//! Canonical feature schema: the ordered list of columns the model is trained on.
//!
//! The schema is produced once by the batch encoder at training time and
//! persisted next to the model. Inference never rebuilds it; it loads it.

use crate::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Current schema artifact format.
pub const SCHEMA_VERSION: u32 = 1;

/// Continuous columns, copied verbatim into the feature vector in this order.
pub const CONTINUOUS_COLUMNS: [&str; 12] = [
    "wheelbase",
    "carlength",
    "carwidth",
    "carheight",
    "curbweight",
    "enginesize",
    "stroke",
    "compressionratio",
    "horsepower",
    "peakrpm",
    "citympg",
    "highwaympg",
];

/// Categorical fields, one-hot encoded with a dropped baseline, in this order.
pub const CATEGORICAL_FIELDS: [&str; 6] = [
    "fueltypes",
    "carbody",
    "drivewheels",
    "enginetype",
    "cylindernumber",
    "fuelsystem",
];

/// Regression target.
pub const TARGET_COLUMN: &str = "price";

/// Columns present in the raw dataset that carry no feature.
pub const IGNORED_COLUMNS: [&str; 7] = [
    "ID",
    "aspiration",
    "doornumbers",
    "enginelocation",
    "name",
    "symboling",
    "boreratio",
];

/// What to do with a categorical value the schema does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownCategoryPolicy {
    /// Fail with `UnknownCategory`
    #[default]
    Reject,
    /// Encode as the field's baseline (all indicators zero)
    Baseline,
}

impl FromStr for UnknownCategoryPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "baseline" => Ok(Self::Baseline),
            other => Err(format!(
                "unknown policy '{other}', expected 'reject' or 'baseline'"
            )),
        }
    }
}

impl fmt::Display for UnknownCategoryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reject => f.write_str("reject"),
            Self::Baseline => f.write_str("baseline"),
        }
    }
}

/// Name of the indicator column for `category` of `field`.
pub fn indicator_name(field: &str, category: &str) -> String {
    format!("{field}_{category}")
}

/// One categorical field and its resolved encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalField {
    pub name: String,
    /// Category represented by all indicators being zero
    pub baseline: String,
    /// Categories with their own indicator column, baseline excluded
    pub indicators: Vec<String>,
}

impl CategoricalField {
    /// Build a field from the categories observed for it.
    ///
    /// Categories are sorted by byte order and the first becomes the baseline.
    pub fn from_categories<I, S>(name: &str, categories: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut sorted: Vec<String> = categories.into_iter().map(Into::into).collect();
        sorted.sort();
        sorted.dedup();

        if sorted.is_empty() {
            return Err(PredictorError::EmptyDataset(format!(
                "no categories observed for '{name}'"
            )));
        }

        let baseline = sorted.remove(0);
        Ok(Self {
            name: name.to_string(),
            baseline,
            indicators: sorted,
        })
    }

    pub fn columns(&self) -> impl Iterator<Item = String> + '_ {
        self.indicators
            .iter()
            .map(move |category| indicator_name(&self.name, category))
    }

    /// All categories the field knows, baseline first.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.baseline.as_str()).chain(self.indicators.iter().map(String::as_str))
    }
}

/// The ordered feature schema shared by training and inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSchema {
    pub version: u32,
    pub continuous: Vec<String>,
    pub categorical: Vec<CategoricalField>,
    pub target: String,
    /// Width of the feature vector, recorded so a tampered artifact is caught
    pub n_features: usize,
}

impl CanonicalSchema {
    pub fn new(categorical: Vec<CategoricalField>) -> Self {
        let continuous: Vec<String> = CONTINUOUS_COLUMNS.iter().map(|c| c.to_string()).collect();
        let n_features =
            continuous.len() + categorical.iter().map(|f| f.indicators.len()).sum::<usize>();
        Self {
            version: SCHEMA_VERSION,
            continuous,
            categorical,
            target: TARGET_COLUMN.to_string(),
            n_features,
        }
    }

    /// Feature columns in canonical order: continuous, then each field's indicators.
    pub fn columns(&self) -> Vec<String> {
        let mut columns = self.continuous.clone();
        for field in &self.categorical {
            columns.extend(field.columns());
        }
        columns
    }

    pub fn len(&self) -> usize {
        self.n_features
    }

    pub fn is_empty(&self) -> bool {
        self.n_features == 0
    }

    pub fn field(&self, name: &str) -> Option<&CategoricalField> {
        self.categorical.iter().find(|f| f.name == name)
    }

    /// Map a category token of `field` to the indicator column it activates.
    ///
    /// Returns `None` for the baseline. Values outside the field's vocabulary
    /// are rejected or folded into the baseline according to `policy`.
    pub fn resolve(
        &self,
        field: &str,
        token: &str,
        policy: UnknownCategoryPolicy,
    ) -> Result<Option<String>> {
        let known = self
            .field(field)
            .ok_or_else(|| PredictorError::MissingColumn(field.to_string()))?;

        if known.baseline == token {
            return Ok(None);
        }
        if known.indicators.iter().any(|c| c == token) {
            return Ok(Some(indicator_name(field, token)));
        }

        match policy {
            UnknownCategoryPolicy::Reject => Err(PredictorError::UnknownCategory {
                field: field.to_string(),
                value: token.to_string(),
            }),
            UnknownCategoryPolicy::Baseline => {
                tracing::warn!(
                    field,
                    token,
                    baseline = %known.baseline,
                    "unknown category encoded as baseline"
                );
                Ok(None)
            }
        }
    }

    /// Check the schema is internally consistent.
    pub fn validate(&self) -> Result<()> {
        if self.version != SCHEMA_VERSION {
            return Err(PredictorError::SchemaMismatch(format!(
                "unsupported schema version {} (expected {SCHEMA_VERSION})",
                self.version
            )));
        }

        if self.continuous.iter().map(String::as_str).ne(CONTINUOUS_COLUMNS) {
            return Err(PredictorError::SchemaMismatch(format!(
                "continuous columns {:?} differ from {:?}",
                self.continuous, CONTINUOUS_COLUMNS
            )));
        }

        let names: Vec<&str> = self.categorical.iter().map(|f| f.name.as_str()).collect();
        if names != CATEGORICAL_FIELDS {
            return Err(PredictorError::SchemaMismatch(format!(
                "categorical fields {names:?} differ from {CATEGORICAL_FIELDS:?}"
            )));
        }

        for field in &self.categorical {
            if field.indicators.contains(&field.baseline) {
                return Err(PredictorError::SchemaMismatch(format!(
                    "baseline '{}' of '{}' also has an indicator",
                    field.baseline, field.name
                )));
            }
            // String ordering is byte order, the order fit_schema sorts in
            if field.indicators.windows(2).any(|w| w[0] >= w[1]) {
                return Err(PredictorError::SchemaMismatch(format!(
                    "indicators of '{}' are not in sorted order: {:?}",
                    field.name, field.indicators
                )));
            }
            if let Some(first) = field.indicators.first() {
                if field.baseline >= *first {
                    return Err(PredictorError::SchemaMismatch(format!(
                        "baseline '{}' of '{}' does not sort before '{first}'",
                        field.baseline, field.name
                    )));
                }
            }
        }

        let columns = self.columns();
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(PredictorError::SchemaMismatch(format!(
                    "duplicate column '{column}'"
                )));
            }
        }

        if columns.len() != self.n_features {
            return Err(PredictorError::SchemaMismatch(format!(
                "schema records {} features but defines {}",
                self.n_features,
                columns.len()
            )));
        }

        Ok(())
    }
}
