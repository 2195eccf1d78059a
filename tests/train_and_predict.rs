use car_price_predictor::artifact::{load_artifact, load_schema, MODEL_FILE, SCHEMA_FILE};
use car_price_predictor::{
    run_training, CarInput, Predictor, PredictorError, TrainConfig, UnknownCategoryPolicy,
    XgbRegressor,
};
use std::fmt::Write as _;
use std::path::Path;

const HEADER: &str = "ID,symboling,name,fueltypes,aspiration,doornumbers,carbody,drivewheels,\
enginelocation,wheelbase,carlength,carwidth,carheight,curbweight,enginetype,cylindernumber,\
enginesize,fuelsystem,boreratio,stroke,compressionratio,horsepower,peakrpm,citympg,highwaympg,price";

/// A raw dataset covering every category the form can select.
fn write_dataset(path: &Path, rows: usize) {
    let fuels = ["gas", "diesel"];
    let bodies = ["sedan", "hatchback", "wagon", "hardtop", "convertible"];
    let drives = ["fwd", "rwd", "4wd"];
    let engines = ["ohc", "dohc", "l", "ohcf", "ohcv", "rotor"];
    let cylinders = ["four", "six", "five", "two", "three", "twelve"];
    let systems = ["mpfi", "2bbl", "4bbl", "idi"];

    let mut csv = String::from(HEADER);
    csv.push('\n');
    for i in 0..rows {
        let k = i as f64;
        let horsepower = 60.0 + 3.0 * k;
        let curbweight = 1800.0 + 25.0 * k;
        let price = 4000.0 + 80.0 * horsepower + 1.5 * curbweight;
        writeln!(
            csv,
            "{id},1,car {id},{fuel},std,four,{body},{drive},front,{wb},{len},{w},{h},{cw},{eng},{cyl},{es},{fs},3.19,{st},{cr},{hp},{rpm},{city},{hwy},{price}",
            id = i + 1,
            fuel = fuels[i % fuels.len()],
            body = bodies[i % bodies.len()],
            drive = drives[i % drives.len()],
            wb = 90.0 + (k % 20.0),
            len = 160.0 + (k % 30.0),
            w = 64.0 + (k % 6.0),
            h = 50.0 + (k % 8.0),
            cw = curbweight,
            eng = engines[i % engines.len()],
            cyl = cylinders[i % cylinders.len()],
            es = 100.0 + 4.0 * k,
            fs = systems[i % systems.len()],
            st = 3.0 + (k % 10.0) / 10.0,
            cr = 8.0 + (k % 5.0),
            hp = horsepower,
            rpm = 4800.0 + 20.0 * k,
            city = 35.0 - (k % 15.0),
            hwy = 40.0 - (k % 15.0),
            price = price,
        )
        .unwrap();
    }
    std::fs::write(path, csv).unwrap();
}

fn quick_config() -> TrainConfig {
    TrainConfig {
        boost_rounds: 30,
        ..TrainConfig::default()
    }
}

#[test]
fn trains_saves_and_predicts() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("cars.csv");
    let artifact = dir.path().join("model");
    write_dataset(&dataset, 120);

    let config = quick_config();
    let report =
        run_training::<XgbRegressor>(&config, &config.model_params(), &dataset, &artifact)
            .unwrap();

    assert_eq!(report.n_test, 24);
    assert_eq!(report.n_train, 96);
    assert!(report.metrics.rmse.is_finite());
    assert!(report.metrics.r2 > 0.5, "r2 = {}", report.metrics.r2);
    assert!(artifact.join(MODEL_FILE).exists());
    assert!(artifact.join(SCHEMA_FILE).exists());

    let stored = load_schema(&artifact).unwrap();
    assert_eq!(stored.columns(), report.schema.columns());
    assert_eq!(stored.field("fuelsystem").unwrap().baseline, "2bbl");

    let predictor: Predictor =
        Predictor::from_artifact(&artifact, UnknownCategoryPolicy::Reject).unwrap();
    let input = CarInput {
        fuel_type: "Essence".into(),
        body: "Berline".into(),
        drive_wheels: "Traction avant".into(),
        engine_type: "OHC".into(),
        cylinders: "4".into(),
        fuel_system: "Injection MPFI".into(),
        ..CarInput::default()
    };
    let price = predictor.predict(&input).unwrap();
    assert!(price.is_finite() && price > 0.0);

    let row = predictor.encode(&input).unwrap();
    assert_eq!(row.columns, stored.columns());
}

#[test]
fn same_seed_gives_same_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("cars.csv");
    write_dataset(&dataset, 80);

    let config = quick_config();
    let params = config.model_params();
    let a = run_training::<XgbRegressor>(&config, &params, &dataset, &dir.path().join("a"))
        .unwrap();
    let b = run_training::<XgbRegressor>(&config, &params, &dataset, &dir.path().join("b"))
        .unwrap();
    assert_eq!(a.metrics, b.metrics);
}

#[test]
fn missing_dataset_column_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("cars.csv");
    std::fs::write(&dataset, "ID,wheelbase,price\n1,88.6,13495\n2,94.5,16500\n").unwrap();

    let config = quick_config();
    let err = run_training::<XgbRegressor>(
        &config,
        &config.model_params(),
        &dataset,
        &dir.path().join("model"),
    )
    .unwrap_err();
    assert!(matches!(err, PredictorError::MissingColumn(_)));
    assert!(!dir.path().join("model").exists());
}

#[test]
fn form_category_missing_from_training_data_is_caught_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("cars.csv");
    let artifact = dir.path().join("model");
    write_dataset(&dataset, 60);

    // remove every rotary engine so "Rotatif" has no column
    let text = std::fs::read_to_string(&dataset).unwrap();
    std::fs::write(&dataset, text.replace(",rotor,", ",ohc,")).unwrap();

    let config = quick_config();
    run_training::<XgbRegressor>(&config, &config.model_params(), &dataset, &artifact).unwrap();

    let err = Predictor::<XgbRegressor>::from_artifact(&artifact, UnknownCategoryPolicy::Reject)
        .err()
        .unwrap();
    assert!(matches!(err, PredictorError::UnknownCategory { ref value, .. } if value == "rotor"));

    let lenient =
        Predictor::<XgbRegressor>::from_artifact(&artifact, UnknownCategoryPolicy::Baseline)
            .unwrap();
    let input = CarInput {
        engine_type: "Rotatif".into(),
        ..CarInput::default()
    };
    let row = lenient.encode(&input).unwrap();
    let engine = lenient.schema().field("enginetype").unwrap();
    assert!(engine.columns().all(|c| row.get(&c) == Some(0.0)));
}

#[test]
fn model_from_a_run_of_another_width_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = quick_config();
    let params = config.model_params();

    // 37 columns: no rotary engines
    let narrow_data = dir.path().join("narrow.csv");
    write_dataset(&narrow_data, 60);
    let text = std::fs::read_to_string(&narrow_data).unwrap();
    std::fs::write(&narrow_data, text.replace(",rotor,", ",ohc,")).unwrap();
    let narrow = dir.path().join("narrow");
    let narrow_report =
        run_training::<XgbRegressor>(&config, &params, &narrow_data, &narrow).unwrap();

    let full_data = dir.path().join("full.csv");
    write_dataset(&full_data, 60);
    let full = dir.path().join("full");
    let full_report = run_training::<XgbRegressor>(&config, &params, &full_data, &full).unwrap();
    assert_eq!(narrow_report.schema.len() + 1, full_report.schema.len());

    std::fs::copy(narrow.join(MODEL_FILE), full.join(MODEL_FILE)).unwrap();

    let err = load_artifact::<XgbRegressor>(&full).err().unwrap();
    assert!(
        matches!(err, PredictorError::SchemaMismatch(ref m) if m.contains("37")),
        "{err}"
    );
    let err = Predictor::<XgbRegressor>::from_artifact(&full, UnknownCategoryPolicy::Baseline)
        .err()
        .unwrap();
    assert!(matches!(err, PredictorError::SchemaMismatch(_)));
}

#[test]
fn text_in_numeric_column_fails_training() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("cars.csv");
    write_dataset(&dataset, 40);

    // second data row gets "?" as its stroke
    let text = std::fs::read_to_string(&dataset).unwrap();
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    let mut cells: Vec<&str> = lines[2].split(',').collect();
    cells[19] = "?";
    lines[2] = cells.join(",");
    std::fs::write(&dataset, lines.join("\n")).unwrap();

    let config = quick_config();
    let err = run_training::<XgbRegressor>(
        &config,
        &config.model_params(),
        &dataset,
        &dir.path().join("model"),
    )
    .unwrap_err();
    assert!(
        matches!(err, PredictorError::NonNumeric { ref column, .. } if column == "stroke"),
        "{err}"
    );
}

#[test]
fn missing_artifact_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = Predictor::<XgbRegressor>::from_artifact(dir.path(), UnknownCategoryPolicy::Reject)
        .err()
        .unwrap();
    assert!(matches!(err, PredictorError::Io(_)));
}
