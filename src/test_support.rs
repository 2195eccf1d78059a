//! Builders for small in-memory car tables used by unit tests.

use crate::schema::{CATEGORICAL_FIELDS, CONTINUOUS_COLUMNS, TARGET_COLUMN};
use polars::prelude::*;

pub(crate) struct CarRow {
    pub continuous: [f64; 12],
    pub categories: [String; 6],
    pub price: f64,
}

impl CarRow {
    /// A plausible car whose numbers vary with `i`.
    pub fn new(i: usize, categories: [String; 6]) -> Self {
        let k = i as f64;
        let continuous = [
            88.0 + k,
            160.0 + 2.0 * k,
            64.0 + 0.5 * k,
            52.0 + 0.25 * k,
            2000.0 + 40.0 * k,
            100.0 + 10.0 * k,
            3.0 + 0.05 * k,
            9.0 + 0.1 * k,
            80.0 + 7.0 * k,
            5000.0 + 50.0 * k,
            30.0 - 0.5 * k,
            36.0 - 0.5 * k,
        ];
        let price = 5000.0 + 60.0 * continuous[8] + 2.0 * continuous[4];
        Self {
            continuous,
            categories,
            price,
        }
    }
}

pub(crate) fn car_frame(rows: &[CarRow]) -> DataFrame {
    let mut columns = Vec::with_capacity(CONTINUOUS_COLUMNS.len() + CATEGORICAL_FIELDS.len() + 1);
    for (i, name) in CONTINUOUS_COLUMNS.iter().enumerate() {
        let values: Vec<f64> = rows.iter().map(|r| r.continuous[i]).collect();
        columns.push(Series::new(name, values));
    }
    for (i, name) in CATEGORICAL_FIELDS.iter().enumerate() {
        let values: Vec<&str> = rows.iter().map(|r| r.categories[i].as_str()).collect();
        columns.push(Series::new(name, values));
    }
    let prices: Vec<f64> = rows.iter().map(|r| r.price).collect();
    columns.push(Series::new(TARGET_COLUMN, prices));
    DataFrame::new(columns).unwrap()
}
