//! PRBS-Driven ARX Example
//!
//! Simulates an ARX system excited by a PRBS input with skew-normal noise,
//! builds the regressor matrices for the guessed order and writes the
//! sampler data file. Given the sampler's CSV output it also writes the
//! `example3_<name>.json` results.
//!
//! Usage: `arx_prbs [config.json] [posterior.csv] [name]`

use std::fs;
use std::path::{Path, PathBuf};

use sysid_bayes::results::{FirMixtureData, FirMixtureResults};
use sysid_bayes::{
    grid_points, simulate_arx, ArxSimConfig, ExperimentResults, PosteriorSamples, SamplerData,
    SysIdError,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(error) = try_main() {
        eprintln!("arx_prbs failed: {error}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), SysIdError> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) if path != "-" => ArxSimConfig::from_json_file(Path::new(&path))?,
        _ => ArxSimConfig::default(),
    };
    let posterior_path = args.next().map(PathBuf::from);
    let name = args.next().unwrap_or_else(|| "prbs".to_string());

    println!("Configuration:");
    println!("  Samples: {}", config.samples);
    println!("  Estimation fraction: {}", config.estimation_fraction);
    println!("  True A: {:?}", config.coefficients_a);
    println!("  True B: {:?}", config.coefficients_b);
    println!("  Guessed order: {:?}", config.guessed_order.as_vec());
    println!("  PRBS max hold: {}", config.max_hold);
    println!(
        "  Noise: alpha={} loc={} scale={}",
        config.noise.alpha, config.noise.loc, config.noise.scale
    );
    println!();

    let dataset = simulate_arx(&config)?;
    let grid = grid_points(-1.0, 1.0, 0.01)?;
    let data = FirMixtureData::from_dataset(&dataset, grid)?;

    println!(
        "Regressors: estimation {}x{}, validation {}x{}",
        data.regressor_matrix_estimation.nrows(),
        data.regressor_matrix_estimation.ncols(),
        data.regressor_matrix_validation.nrows(),
        data.regressor_matrix_validation.ncols(),
    );

    let out_dir = Path::new("out");
    fs::create_dir_all(out_dir)?;

    let mut sampler_data = SamplerData::new();
    sampler_data
        .insert_int("noEstimation", data.y_estimation.len() as i64)
        .insert_int("noValidation", data.y_validation.len() as i64)
        .insert_int("noRegressors", data.regressor_matrix_estimation.ncols() as i64)
        .insert_vector("yEstimation", &data.y_estimation)
        .insert_vector("yValidation", &data.y_validation)
        .insert_matrix("regressorMatrixEstimation", &data.regressor_matrix_estimation)
        .insert_matrix("regressorMatrixValidation", &data.regressor_matrix_validation)
        .insert_int("noGridPoints", data.grid_points.len() as i64)
        .insert_vector("gridPoints", &data.grid_points);

    let data_path = out_dir.join(format!("arx_{name}_data.json"));
    sampler_data.write(&data_path)?;
    println!("Sampler data written to: {}", data_path.display());

    let Some(posterior_path) = posterior_path else {
        println!("No posterior CSV given; run the sampler on the data file and pass its output.");
        return Ok(());
    };

    let posterior = PosteriorSamples::from_stan_csv(&posterior_path)?;
    let results = FirMixtureResults::collect(&data, &posterior, &name)?;
    let results_path = results.save(out_dir)?;
    println!("Results written to: {}", results_path.display());

    Ok(())
}
