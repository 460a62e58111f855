//! Uniform-Data Mixture Example
//!
//! Draws uniform data, writes the sampler data file for a five-component
//! Gaussian mixture and, given the sampler's CSV output, writes the
//! `example2_<name>.json` results.
//!
//! Usage: `mixture_uniform [posterior.csv] [name]`

use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;
use sysid_bayes::results::MixtureResults;
use sysid_bayes::{
    grid_points, uniform_noise, ExperimentResults, PosteriorSamples, SamplerData, SysIdError,
};
use tracing_subscriber::EnvFilter;

const OBSERVATIONS: usize = 1000;
const COMPONENTS: i64 = 5;
const CONCENTRATION: f64 = 10.0;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(error) = try_main() {
        eprintln!("mixture_uniform failed: {error}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), SysIdError> {
    let mut args = std::env::args().skip(1);
    let posterior_path = args.next().map(PathBuf::from);
    let name = args.next().unwrap_or_else(|| "uniform".to_string());

    let out_dir = Path::new("out");
    fs::create_dir_all(out_dir)?;

    let mut rng = StdRng::seed_from_u64(42);
    let observations = uniform_noise(OBSERVATIONS, 2.0, &mut rng);
    let grid = grid_points(-10.0, 10.0, 0.01)?;

    let mut data = SamplerData::new();
    data.insert_int("noObservations", OBSERVATIONS as i64)
        .insert_int("noComponents", COMPONENTS)
        .insert_vector("observations", &observations)
        .insert_real("alpha", CONCENTRATION)
        .insert_int("noGridPoints", grid.len() as i64)
        .insert_vector("gridPoints", &grid);

    let data_path = out_dir.join(format!("mixture_{name}_data.json"));
    data.write(&data_path)?;
    println!("Sampler data written to: {}", data_path.display());

    let Some(posterior_path) = posterior_path else {
        println!("No posterior CSV given; run the sampler on the data file and pass its output.");
        return Ok(());
    };

    let posterior = PosteriorSamples::from_stan_csv(&posterior_path)?;
    let results = MixtureResults::collect(&grid, &observations, &posterior, &name)?;
    let results_path = results.save(out_dir)?;
    println!("Results written to: {}", results_path.display());

    #[cfg(feature = "plot")]
    {
        let (posteriors, traces) = sysid_bayes::plot::plot_mixture_results(&results, out_dir)?;
        println!("Figures written to: {} and {}", posteriors.display(), traces.display());
    }

    Ok(())
}
