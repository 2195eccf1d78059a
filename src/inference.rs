//! Inference adapter: form inputs to a price estimate.
//!
//! The form offers closed selectors with human-facing labels and bounded
//! numeric sliders. Labels are translated to the category tokens the encoder
//! knows, the record is encoded against the schema loaded with the model, and
//! the model is asked for one prediction.

use crate::artifact::{check_model_width, load_artifact};
use crate::encoder::{encode_record, CarRecord, FeatureRow};
use crate::error::{PredictorError, Result};
use crate::model::{FeatureMatrix, Regressor, XgbRegressor};
use crate::schema::{CanonicalSchema, UnknownCategoryPolicy, CATEGORICAL_FIELDS};
use std::path::Path;
use tracing::{debug, info};

/// A bounded numeric input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericSlider {
    pub column: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl NumericSlider {
    const fn new(column: &'static str, label: &'static str, min: f64, max: f64, default: f64) -> Self {
        Self {
            column,
            label,
            min,
            max,
            default,
        }
    }

    pub fn check(&self, value: f64) -> Result<f64> {
        if value.is_nan() || value < self.min || value > self.max {
            return Err(PredictorError::OutOfRange {
                field: self.column.to_string(),
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(value)
    }
}

/// Sliders in continuous column order.
pub const SLIDERS: [NumericSlider; 12] = [
    NumericSlider::new("wheelbase", "Empattement (cm)", 80.0, 140.0, 100.0),
    NumericSlider::new("carlength", "Longueur du véhicule (cm)", 140.0, 220.0, 180.0),
    NumericSlider::new("carwidth", "Largeur du véhicule (cm)", 60.0, 90.0, 70.0),
    NumericSlider::new("carheight", "Hauteur du véhicule (cm)", 40.0, 80.0, 50.0),
    NumericSlider::new("curbweight", "Poids à vide (kg)", 500.0, 2500.0, 1500.0),
    NumericSlider::new("enginesize", "Taille du moteur (cm³)", 500.0, 5000.0, 2000.0),
    NumericSlider::new("stroke", "Course du piston", 2.0, 5.0, 3.5),
    NumericSlider::new("compressionratio", "Ratio de compression", 5.0, 25.0, 10.0),
    NumericSlider::new("horsepower", "Puissance (ch)", 50.0, 400.0, 150.0),
    NumericSlider::new("peakrpm", "Régime max (rpm)", 4000.0, 8000.0, 5500.0),
    NumericSlider::new("citympg", "Consommation en ville (mpg)", 5.0, 60.0, 30.0),
    NumericSlider::new("highwaympg", "Consommation sur autoroute (mpg)", 5.0, 60.0, 40.0),
];

/// A closed categorical input: `(label, token)` pairs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoricalSelector {
    pub field: &'static str,
    pub label: &'static str,
    pub options: &'static [(&'static str, &'static str)],
}

/// Selectors in categorical field order.
pub const SELECTORS: [CategoricalSelector; 6] = [
    CategoricalSelector {
        field: "fueltypes",
        label: "Type de carburant",
        options: &[("Essence", "gas"), ("Diesel", "diesel")],
    },
    CategoricalSelector {
        field: "carbody",
        label: "Type de carrosserie",
        options: &[
            ("Coupé", "hardtop"),
            ("Compacte", "hatchback"),
            ("Berline", "sedan"),
            ("Break", "wagon"),
        ],
    },
    CategoricalSelector {
        field: "drivewheels",
        label: "Type de traction",
        options: &[
            ("Traction avant", "fwd"),
            ("Propulsion", "rwd"),
            ("4x4", "4wd"),
        ],
    },
    CategoricalSelector {
        field: "enginetype",
        label: "Type de moteur",
        options: &[
            ("DOHC", "dohc"),
            ("Ligne", "l"),
            ("OHC", "ohc"),
            ("OHCF", "ohcf"),
            ("OHCV", "ohcv"),
            ("Rotatif", "rotor"),
        ],
    },
    CategoricalSelector {
        field: "cylindernumber",
        label: "Nombre de cylindres",
        options: &[
            ("2", "two"),
            ("3", "three"),
            ("4", "four"),
            ("5", "five"),
            ("6", "six"),
            ("12", "twelve"),
        ],
    },
    CategoricalSelector {
        field: "fuelsystem",
        label: "Système de carburant",
        options: &[
            ("Injection MPFI", "mpfi"),
            ("Carburateur 2 corps", "2bbl"),
            ("Carburateur 4 corps", "4bbl"),
            ("Injection directe (IDI)", "idi"),
        ],
    },
];

/// Trim, lower-case and turn whitespace runs into `_`.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

impl CategoricalSelector {
    /// Translate a label (or an internal token) into the category token.
    pub fn translate(&self, label: &str) -> Result<&'static str> {
        let wanted = normalize_label(label);
        self.options
            .iter()
            .find(|(l, token)| normalize_label(l) == wanted || *token == wanted)
            .map(|&(_, token)| token)
            .ok_or_else(|| PredictorError::UnknownLabel {
                field: self.field.to_string(),
                label: label.to_string(),
            })
    }
}

/// One car as entered on the form.
#[derive(Debug, Clone, PartialEq)]
pub struct CarInput {
    pub fuel_type: String,
    pub body: String,
    pub drive_wheels: String,
    pub engine_type: String,
    pub cylinders: String,
    pub fuel_system: String,
    pub wheelbase: f64,
    pub car_length: f64,
    pub car_width: f64,
    pub car_height: f64,
    pub curb_weight: f64,
    pub engine_size: f64,
    pub stroke: f64,
    pub compression_ratio: f64,
    pub horsepower: f64,
    pub peak_rpm: f64,
    pub city_mpg: f64,
    pub highway_mpg: f64,
}

impl Default for CarInput {
    /// Slider defaults and the first option of every selector.
    fn default() -> Self {
        let first = |i: usize| SELECTORS[i].options[0].0.to_string();
        let [
            wheelbase,
            car_length,
            car_width,
            car_height,
            curb_weight,
            engine_size,
            stroke,
            compression_ratio,
            horsepower,
            peak_rpm,
            city_mpg,
            highway_mpg,
        ] = SLIDERS.map(|s| s.default);
        Self {
            fuel_type: first(0),
            body: first(1),
            drive_wheels: first(2),
            engine_type: first(3),
            cylinders: first(4),
            fuel_system: first(5),
            wheelbase,
            car_length,
            car_width,
            car_height,
            curb_weight,
            engine_size,
            stroke,
            compression_ratio,
            horsepower,
            peak_rpm,
            city_mpg,
            highway_mpg,
        }
    }
}

impl CarInput {
    /// Numeric values in continuous column order.
    pub fn numeric(&self) -> [f64; 12] {
        [
            self.wheelbase,
            self.car_length,
            self.car_width,
            self.car_height,
            self.curb_weight,
            self.engine_size,
            self.stroke,
            self.compression_ratio,
            self.horsepower,
            self.peak_rpm,
            self.city_mpg,
            self.highway_mpg,
        ]
    }

    /// Selector labels in categorical field order.
    pub fn selections(&self) -> [&str; 6] {
        [
            &self.fuel_type,
            &self.body,
            &self.drive_wheels,
            &self.engine_type,
            &self.cylinders,
            &self.fuel_system,
        ]
    }

    pub fn validate(&self) -> Result<()> {
        for (slider, value) in SLIDERS.iter().zip(self.numeric()) {
            slider.check(value)?;
        }
        Ok(())
    }

    /// Validate ranges and translate labels into an encoder record.
    pub fn to_record(&self) -> Result<CarRecord> {
        self.validate()?;
        let mut categories: [String; 6] = Default::default();
        for ((selector, label), slot) in SELECTORS
            .iter()
            .zip(self.selections())
            .zip(categories.iter_mut())
        {
            *slot = selector.translate(label)?.to_string();
        }
        Ok(CarRecord {
            continuous: self.numeric(),
            categories,
        })
    }
}

/// Check every form option resolves against `schema` under `policy`.
pub fn check_form_vocabulary(
    schema: &CanonicalSchema,
    policy: UnknownCategoryPolicy,
) -> Result<()> {
    for (selector, field) in SELECTORS.iter().zip(CATEGORICAL_FIELDS) {
        debug_assert_eq!(selector.field, field);
        for (_, token) in selector.options {
            schema.resolve(field, token, policy)?;
        }
    }
    Ok(())
}

/// A loaded model plus the schema it was trained with.
pub struct Predictor<M = XgbRegressor> {
    model: M,
    schema: CanonicalSchema,
    policy: UnknownCategoryPolicy,
}

impl<M: Regressor> Predictor<M> {
    pub fn new(model: M, schema: CanonicalSchema, policy: UnknownCategoryPolicy) -> Result<Self> {
        schema.validate()?;
        check_model_width(&model, &schema)?;
        check_form_vocabulary(&schema, policy)?;
        Ok(Self {
            model,
            schema,
            policy,
        })
    }

    /// Load the artifact written by training.
    pub fn from_artifact(dir: &Path, policy: UnknownCategoryPolicy) -> Result<Self> {
        let (model, schema) = load_artifact::<M>(dir)?;
        let predictor = Self::new(model, schema, policy)?;
        info!(policy = %policy, "predictor ready");
        Ok(predictor)
    }

    pub fn schema(&self) -> &CanonicalSchema {
        &self.schema
    }

    /// Build the canonical row the model will see.
    pub fn encode(&self, input: &CarInput) -> Result<FeatureRow> {
        let record = input.to_record()?;
        encode_record(&record, &self.schema, self.policy)
    }

    pub fn predict(&self, input: &CarInput) -> Result<f64> {
        let row = self.encode(input)?;
        let x = FeatureMatrix::new(1, row.len(), row.to_f32())?;
        let prediction = self.model.predict(&x)?;
        let price = prediction
            .first()
            .copied()
            .ok_or_else(|| PredictorError::Model("empty prediction".into()))?;
        debug!(price, "prediction");
        Ok(f64::from(price))
    }
}

/// Format a price with thousands separators and two decimals: `12,345.68 $`.
pub fn format_price(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part} $")
}
