//! Model artifact: the fitted model stored together with its canonical schema.
//!
//! ```text
//! <dir>/model.bin    model in the model capability's own format
//! <dir>/schema.json  canonical schema, baselines included
//! ```

use crate::error::{PredictorError, Result};
use crate::model::{FeatureMatrix, Regressor};
use crate::schema::CanonicalSchema;
use std::fs;
use std::path::Path;
use tracing::info;

pub const MODEL_FILE: &str = "model.bin";
pub const SCHEMA_FILE: &str = "schema.json";

pub fn save_artifact<M: Regressor>(dir: &Path, model: &M, schema: &CanonicalSchema) -> Result<()> {
    schema.validate()?;
    fs::create_dir_all(dir)?;

    model.save(&dir.join(MODEL_FILE))?;
    fs::write(dir.join(SCHEMA_FILE), serde_json::to_vec_pretty(schema)?)?;

    info!(dir = %dir.display(), n_features = schema.len(), "artifact saved");
    Ok(())
}

pub fn load_schema(dir: &Path) -> Result<CanonicalSchema> {
    let bytes = fs::read(dir.join(SCHEMA_FILE))?;
    let schema: CanonicalSchema = serde_json::from_slice(&bytes)?;
    schema.validate()?;
    Ok(schema)
}

/// Compare the width a model recorded at training time with the schema.
///
/// Models that do not record a width pass; the zero-row check in
/// [`load_artifact`] still covers them.
pub fn check_model_width<M: Regressor>(model: &M, schema: &CanonicalSchema) -> Result<()> {
    match model.n_features() {
        Some(width) if width != schema.len() => Err(PredictorError::SchemaMismatch(format!(
            "model trained on {width} features, schema lists {}",
            schema.len()
        ))),
        _ => Ok(()),
    }
}

/// Load model and schema and make sure they fit together.
///
/// The trained width stored with the model must equal the schema's width,
/// and the model must answer one all-zero row of that width, so a model
/// trained on another layout fails here rather than on the first real
/// prediction.
pub fn load_artifact<M: Regressor>(dir: &Path) -> Result<(M, CanonicalSchema)> {
    let schema = load_schema(dir)?;
    let model = M::load(&dir.join(MODEL_FILE))?;
    check_model_width(&model, &schema)?;

    let zeros = FeatureMatrix::new(1, schema.len(), vec![0.0; schema.len()])?;
    let output = model.predict(&zeros).map_err(|e| {
        PredictorError::SchemaMismatch(format!(
            "model rejects a {}-column row: {e}",
            schema.len()
        ))
    })?;
    if output.len() != 1 {
        return Err(PredictorError::SchemaMismatch(format!(
            "model returned {} values for one row",
            output.len()
        )));
    }

    info!(dir = %dir.display(), n_features = schema.len(), "artifact loaded");
    Ok((model, schema))
}
