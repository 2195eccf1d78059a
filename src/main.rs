use car_price_predictor::dataset::fetch_dataset;
use car_price_predictor::inference::{SELECTORS, SLIDERS};
use car_price_predictor::{
    format_price, run_training, CarInput, Predictor, TrainConfig, UnknownCategoryPolicy,
    XgbRegressor,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

// Entry point
// train:   CSV -> encode -> split -> fit -> evaluate -> artifact
// predict: artifact + form values -> price
// form:    print the selectors and slider ranges

#[derive(Parser)]
#[command(name = "car_price_predictor", about = "Used car price estimation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train a model from the car dataset and write the artifact.
    Train {
        /// Dataset CSV file (written there first when --dataset-url is given).
        #[arg(long, default_value = "scrap_price.csv")]
        dataset: PathBuf,

        /// Download the dataset from this URL before training.
        #[arg(long)]
        dataset_url: Option<String>,

        /// Output directory for the model and its schema.
        #[arg(long, default_value = "car_price_model")]
        artifact: PathBuf,

        /// YAML training configuration.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Random seed (overrides the configuration file).
        #[arg(long)]
        seed: Option<u64>,

        /// Share of rows held out for evaluation (overrides the configuration file).
        #[arg(long)]
        test_ratio: Option<f64>,
    },

    /// Estimate the price of one car.
    Predict(PredictArgs),

    /// Show the form: selector options and slider ranges.
    Form,
}

/// Form values for one car. Anything left out takes the form's default
/// (see `form`).
#[derive(Args)]
struct PredictArgs {
    /// Directory written by `train`.
    #[arg(long, default_value = "car_price_model")]
    artifact: PathBuf,

    /// Treatment of categories the model never saw: reject or baseline.
    #[arg(long, default_value_t = UnknownCategoryPolicy::Reject)]
    unknown_category: UnknownCategoryPolicy,

    #[arg(long)]
    fuel: Option<String>,
    #[arg(long)]
    body: Option<String>,
    #[arg(long)]
    drive: Option<String>,
    #[arg(long)]
    engine: Option<String>,
    #[arg(long)]
    cylinders: Option<String>,
    #[arg(long)]
    fuel_system: Option<String>,

    #[arg(long)]
    wheelbase: Option<f64>,
    #[arg(long)]
    car_length: Option<f64>,
    #[arg(long)]
    car_width: Option<f64>,
    #[arg(long)]
    car_height: Option<f64>,
    #[arg(long)]
    curb_weight: Option<f64>,
    #[arg(long)]
    engine_size: Option<f64>,
    #[arg(long)]
    stroke: Option<f64>,
    #[arg(long)]
    compression_ratio: Option<f64>,
    #[arg(long)]
    horsepower: Option<f64>,
    #[arg(long)]
    peak_rpm: Option<f64>,
    #[arg(long)]
    city_mpg: Option<f64>,
    #[arg(long)]
    highway_mpg: Option<f64>,
}

impl From<PredictArgs> for CarInput {
    fn from(args: PredictArgs) -> Self {
        let d = CarInput::default();
        CarInput {
            fuel_type: args.fuel.unwrap_or(d.fuel_type),
            body: args.body.unwrap_or(d.body),
            drive_wheels: args.drive.unwrap_or(d.drive_wheels),
            engine_type: args.engine.unwrap_or(d.engine_type),
            cylinders: args.cylinders.unwrap_or(d.cylinders),
            fuel_system: args.fuel_system.unwrap_or(d.fuel_system),
            wheelbase: args.wheelbase.unwrap_or(d.wheelbase),
            car_length: args.car_length.unwrap_or(d.car_length),
            car_width: args.car_width.unwrap_or(d.car_width),
            car_height: args.car_height.unwrap_or(d.car_height),
            curb_weight: args.curb_weight.unwrap_or(d.curb_weight),
            engine_size: args.engine_size.unwrap_or(d.engine_size),
            stroke: args.stroke.unwrap_or(d.stroke),
            compression_ratio: args.compression_ratio.unwrap_or(d.compression_ratio),
            horsepower: args.horsepower.unwrap_or(d.horsepower),
            peak_rpm: args.peak_rpm.unwrap_or(d.peak_rpm),
            city_mpg: args.city_mpg.unwrap_or(d.city_mpg),
            highway_mpg: args.highway_mpg.unwrap_or(d.highway_mpg),
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Train {
            dataset,
            dataset_url,
            artifact,
            config,
            seed,
            test_ratio,
        } => {
            let mut train_config = match config {
                Some(path) => TrainConfig::from_yaml_file(&path)?,
                None => TrainConfig::default(),
            };
            if let Some(seed) = seed {
                train_config.seed = seed;
            }
            if let Some(test_ratio) = test_ratio {
                train_config.test_ratio = test_ratio;
            }

            if let Some(url) = dataset_url {
                fetch_dataset(&url, &dataset)?;
            }

            let params = train_config.model_params();
            let report =
                run_training::<XgbRegressor>(&train_config, &params, &dataset, &artifact)?;

            println!("Model evaluation ({} train / {} test rows):", report.n_train, report.n_test);
            println!("{}", report.metrics);
            println!("Model saved to {}", artifact.display());
        }

        Command::Predict(args) => {
            let predictor: Predictor =
                Predictor::from_artifact(&args.artifact, args.unknown_category)?;
            let price = predictor.predict(&CarInput::from(args))?;
            println!("Estimated price: {}", format_price(price));
        }

        Command::Form => {
            for selector in &SELECTORS {
                let labels: Vec<&str> = selector.options.iter().map(|(label, _)| *label).collect();
                println!("{} ({}): {}", selector.label, selector.field, labels.join(", "));
            }
            for slider in &SLIDERS {
                println!(
                    "{} ({}): {} to {}, default {}",
                    slider.label, slider.column, slider.min, slider.max, slider.default
                );
            }
        }
    }

    Ok(())
}
