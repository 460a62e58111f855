//! Experiment result files
//!
//! Each experiment type writes one flat JSON file named
//! `<prefix>_<name>.json`. The keys are fixed per experiment type and are
//! what the downstream plotting notebooks read, so field names here follow
//! those keys exactly.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use nalgebra::DMatrix;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::density::GaussianKde;
use crate::error::Result;
use crate::posterior::{
    deserialize_nullable, deserialize_nullable_rows, map_values, mean_over_draws,
    skip_components, variance_over_draws, PosteriorSource, Trace,
};
use crate::regressor::{matrix_rows, LagOrder};
use crate::system::ArxDataset;

/// A result record that can be written to and read from its JSON file
pub trait ExperimentResults: Serialize + DeserializeOwned {
    /// File name prefix of this experiment type
    const PREFIX: &'static str;

    fn name(&self) -> &str;

    fn file_name(&self) -> String {
        format!("{}_{}.json", Self::PREFIX, self.name())
    }

    /// Write the record into `dir` and return the file path
    fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(writer, self)?;
        info!(path = %path.display(), "wrote experiment results");
        Ok(path)
    }

    fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

fn kde_on_grid(samples: &[f64], grid: &[f64]) -> Result<Vec<f64>> {
    Ok(GaussianKde::new(samples)?.evaluate(grid))
}

// ---- example0: AR model on Chebyshev-filtered data ----

/// Inputs of the order-selection experiment
#[derive(Debug, Clone)]
pub struct ChebyData {
    /// Leading predictive samples without full history
    pub system_order: usize,
    pub y_estimation: Vec<f64>,
    pub y_validation: Vec<f64>,
    pub true_order: Vec<usize>,
    pub guessed_order: Vec<usize>,
    pub coefficients_a: Vec<f64>,
    pub coefficients_b: Vec<f64>,
}

impl ChebyData {
    pub fn from_dataset(data: &ArxDataset) -> Self {
        Self {
            system_order: data.guessed_order.max_lag(),
            y_estimation: data.estimation_outputs().to_vec(),
            y_validation: data.validation_outputs().to_vec(),
            true_order: data.true_order().as_vec(),
            guessed_order: data.guessed_order.as_vec(),
            coefficients_a: data.system.coefficients_a.clone(),
            coefficients_b: data.system.coefficients_b.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChebyResults {
    pub model_coefficients: Trace,
    pub observation_noise_variance: Trace,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_model_coefficients: Option<Trace>,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub predictive_mean: Vec<f64>,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub predictive_mean_variance: Vec<f64>,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub training_data: Vec<f64>,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub evaluation_data: Vec<f64>,
    pub true_order: Vec<usize>,
    pub guessed_order: Vec<usize>,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub coefficients_a: Vec<f64>,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub coefficients_b: Vec<f64>,
    pub name: String,
}

impl ChebyResults {
    pub fn collect(
        data: &ChebyData,
        posterior: &impl PosteriorSource,
        name: &str,
        scale_model_coefficients: bool,
    ) -> Result<Self> {
        let predictive = skip_components(
            &posterior.extract_vector("predictiveMean")?,
            data.system_order,
        );

        let scale = if scale_model_coefficients {
            Some(posterior.extract_trace("scaleModelCoefficients")?)
        } else {
            None
        };

        Ok(Self {
            model_coefficients: posterior.extract_trace("modelCoefficients")?,
            observation_noise_variance: posterior.extract_trace("observationNoiseVariance")?,
            scale_model_coefficients: scale,
            predictive_mean: mean_over_draws(&predictive),
            predictive_mean_variance: variance_over_draws(&predictive),
            training_data: data.y_estimation.clone(),
            evaluation_data: data.y_validation.clone(),
            true_order: data.true_order.clone(),
            guessed_order: data.guessed_order.clone(),
            coefficients_a: data.coefficients_a.clone(),
            coefficients_b: data.coefficients_b.clone(),
            name: name.to_string(),
        })
    }
}

impl ExperimentResults for ChebyResults {
    const PREFIX: &'static str = "example0";

    fn name(&self) -> &str {
        &self.name
    }
}

// ---- example1: FIR model ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirResults {
    pub mu: Trace,
    pub b: Trace,
    pub sigma: Trace,
    pub sigma0: Trace,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub observations: Vec<f64>,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub inputs: Vec<f64>,
    pub name: String,
}

impl FirResults {
    pub fn collect(
        observations: &[f64],
        inputs: &[f64],
        posterior: &impl PosteriorSource,
        name: &str,
    ) -> Result<Self> {
        Ok(Self {
            mu: posterior.extract_trace("mu")?,
            b: posterior.extract_trace("b")?,
            sigma: posterior.extract_trace("sigma")?,
            sigma0: posterior.extract_trace("sigma0")?,
            observations: observations.to_vec(),
            inputs: inputs.to_vec(),
            name: name.to_string(),
        })
    }
}

impl ExperimentResults for FirResults {
    const PREFIX: &'static str = "example1";

    fn name(&self) -> &str {
        &self.name
    }
}

// ---- example2: Gaussian mixture density ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixtureResults {
    #[serde(deserialize_with = "deserialize_nullable")]
    pub kernel_density_estimate: Vec<f64>,
    #[serde(rename = "MCMCDensityEstimate")]
    #[serde(deserialize_with = "deserialize_nullable")]
    pub mcmc_density_estimate: Vec<f64>,
    pub sigma0: Trace,
    pub e0: Trace,
    pub weights: Trace,
    pub mu: Trace,
    pub sigma: Trace,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub observations: Vec<f64>,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub grid_points: Vec<f64>,
    pub name: String,
}

impl MixtureResults {
    /// `log_p_y_tilde` holds the log mixture density on the grid per draw
    pub fn collect(
        grid_points: &[f64],
        observations: &[f64],
        posterior: &impl PosteriorSource,
        name: &str,
    ) -> Result<Self> {
        let log_density = posterior.extract_vector("log_p_y_tilde")?;
        crate::error::ensure_len("mixture density grid", grid_points.len(), log_density.ncols())?;

        Ok(Self {
            kernel_density_estimate: kde_on_grid(observations, grid_points)?,
            mcmc_density_estimate: mean_over_draws(&map_values(&log_density, f64::exp)),
            sigma0: posterior.extract_trace("sigma0")?,
            e0: posterior.extract_trace("e0")?,
            weights: posterior.extract_trace("weights")?,
            mu: posterior.extract_trace("mu")?,
            sigma: posterior.extract_trace("sigma")?,
            observations: observations.to_vec(),
            grid_points: grid_points.to_vec(),
            name: name.to_string(),
        })
    }
}

impl ExperimentResults for MixtureResults {
    const PREFIX: &'static str = "example2";

    fn name(&self) -> &str {
        &self.name
    }
}

// ---- example3: FIR model with mixture noise ----

#[derive(Debug, Clone)]
pub struct FirMixtureData {
    pub grid_points: Vec<f64>,
    pub y_estimation: Vec<f64>,
    pub y_validation: Vec<f64>,
    pub regressor_matrix_estimation: DMatrix<f64>,
    pub regressor_matrix_validation: DMatrix<f64>,
    pub inputs: Vec<f64>,
    pub observations: Vec<f64>,
    pub true_order: Vec<usize>,
    pub guessed_order: Vec<usize>,
    pub coefficients_a: Vec<f64>,
    pub coefficients_b: Vec<f64>,
}

impl FirMixtureData {
    /// Assemble from a simulated dataset using its guessed order
    ///
    /// The estimation and validation outputs are cut to the rows of their
    /// regressor matrices.
    pub fn from_dataset(data: &ArxDataset, grid_points: Vec<f64>) -> Result<Self> {
        let order: LagOrder = data.guessed_order;
        let (estimation, validation) = data.regressors(order)?;
        let skip = order.max_lag();

        Ok(Self {
            grid_points,
            y_estimation: data.estimation_outputs().iter().skip(skip).copied().collect(),
            y_validation: data.validation_outputs().iter().skip(skip).copied().collect(),
            regressor_matrix_estimation: estimation,
            regressor_matrix_validation: validation,
            inputs: data.inputs.clone(),
            observations: data.outputs.clone(),
            true_order: data.true_order().as_vec(),
            guessed_order: order.as_vec(),
            coefficients_a: data.system.coefficients_a.clone(),
            coefficients_b: data.system.coefficients_b.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirMixtureResults {
    #[serde(deserialize_with = "deserialize_nullable")]
    pub kernel_density_estimate: Vec<f64>,
    #[serde(rename = "MCMCDensityEstimate")]
    #[serde(deserialize_with = "deserialize_nullable")]
    pub mcmc_density_estimate: Vec<f64>,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub predictive_weight: Vec<f64>,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub predictive_mean: Vec<f64>,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub predictive_variance: Vec<f64>,
    pub filter_coefficient: Trace,
    pub mixture_weights: Trace,
    pub mixture_mean: Trace,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub y_validation: Vec<f64>,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub y_estimation: Vec<f64>,
    #[serde(deserialize_with = "deserialize_nullable_rows")]
    pub regressor_matrix_estimation: Vec<Vec<f64>>,
    #[serde(deserialize_with = "deserialize_nullable_rows")]
    pub regressor_matrix_validation: Vec<Vec<f64>>,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub grid_points: Vec<f64>,
    pub name: String,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub input_signal: Vec<f64>,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub output_signal: Vec<f64>,
    pub true_order: Vec<usize>,
    pub guessed_order: Vec<usize>,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub coefficients_a: Vec<f64>,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub coefficients_b: Vec<f64>,
}

impl FirMixtureResults {
    /// `mixtureOnGrid` is already a density here, not a log density
    pub fn collect(
        data: &FirMixtureData,
        posterior: &impl PosteriorSource,
        name: &str,
    ) -> Result<Self> {
        let pooled: Vec<f64> = data
            .y_estimation
            .iter()
            .chain(data.y_validation.iter())
            .copied()
            .collect();
        let mixture_on_grid = posterior.extract_vector("mixtureOnGrid")?;
        crate::error::ensure_len(
            "mixture density grid",
            data.grid_points.len(),
            mixture_on_grid.ncols(),
        )?;

        Ok(Self {
            kernel_density_estimate: kde_on_grid(&pooled, &data.grid_points)?,
            mcmc_density_estimate: mean_over_draws(&mixture_on_grid),
            predictive_weight: mean_over_draws(&posterior.extract_vector("predictiveWeight")?),
            predictive_mean: mean_over_draws(&posterior.extract_vector("predictiveMean")?),
            predictive_variance: mean_over_draws(
                &posterior.extract_vector("predictiveVariance")?,
            ),
            filter_coefficient: posterior.extract_trace("filterCoefficient")?,
            mixture_weights: posterior.extract_trace("mixtureWeights")?,
            mixture_mean: posterior.extract_trace("mixtureMean")?,
            y_validation: data.y_validation.clone(),
            y_estimation: data.y_estimation.clone(),
            regressor_matrix_estimation: matrix_rows(&data.regressor_matrix_estimation),
            regressor_matrix_validation: matrix_rows(&data.regressor_matrix_validation),
            grid_points: data.grid_points.clone(),
            name: name.to_string(),
            input_signal: data.inputs.clone(),
            output_signal: data.observations.clone(),
            true_order: data.true_order.clone(),
            guessed_order: data.guessed_order.clone(),
            coefficients_a: data.coefficients_a.clone(),
            coefficients_b: data.coefficients_b.clone(),
        })
    }
}

impl ExperimentResults for FirMixtureResults {
    const PREFIX: &'static str = "example3";

    fn name(&self) -> &str {
        &self.name
    }
}

// ---- example4: ARX model with mixture noise ----

#[derive(Debug, Clone)]
pub struct ArxMixtureData {
    pub grid_points: Vec<f64>,
    pub training_data: Vec<f64>,
    pub evaluation_data: Vec<f64>,
    /// Leading predictive samples without full history
    pub max_lag: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArxMixtureResults {
    #[serde(deserialize_with = "deserialize_nullable")]
    pub kernel_density_estimate: Vec<f64>,
    #[serde(rename = "MCMCDensityEstimate")]
    #[serde(deserialize_with = "deserialize_nullable")]
    pub mcmc_density_estimate: Vec<f64>,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub predictive_mean: Vec<f64>,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub predictive_mean_variance: Vec<f64>,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub predictive_variance: Vec<f64>,
    pub filter_coefficient: Trace,
    pub mixture_weights_prior: Trace,
    pub filter_coefficient_prior: Trace,
    pub mixture_mean_prior: Trace,
    pub mixture_weights: Trace,
    pub mixture_mean: Trace,
    pub mixture_variance: Trace,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub training_data: Vec<f64>,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub evaluation_data: Vec<f64>,
    #[serde(deserialize_with = "deserialize_nullable")]
    pub grid_points: Vec<f64>,
    pub name: String,
}

impl ArxMixtureResults {
    /// `mixtureOnGrid` holds the log mixture density on the grid per draw
    pub fn collect(
        data: &ArxMixtureData,
        posterior: &impl PosteriorSource,
        name: &str,
    ) -> Result<Self> {
        let mixture_on_grid = map_values(&posterior.extract_vector("mixtureOnGrid")?, f64::exp);
        crate::error::ensure_len(
            "mixture density grid",
            data.grid_points.len(),
            mixture_on_grid.ncols(),
        )?;
        let predictive_mean =
            skip_components(&posterior.extract_vector("predictiveMean")?, data.max_lag);
        let predictive_variance = skip_components(
            &posterior.extract_vector("predictiveVariance")?,
            data.max_lag,
        );

        Ok(Self {
            kernel_density_estimate: kde_on_grid(&data.training_data, &data.grid_points)?,
            mcmc_density_estimate: mean_over_draws(&mixture_on_grid),
            predictive_mean: mean_over_draws(&predictive_mean),
            predictive_mean_variance: variance_over_draws(&predictive_mean),
            predictive_variance: mean_over_draws(&predictive_variance),
            filter_coefficient: posterior.extract_trace("filterCoefficient")?,
            mixture_weights_prior: posterior.extract_trace("mixtureWeightsPrior")?,
            filter_coefficient_prior: posterior.extract_trace("filterCoefficientPrior")?,
            mixture_mean_prior: posterior.extract_trace("mixtureMeanPrior")?,
            mixture_weights: posterior.extract_trace("mixtureWeights")?,
            mixture_mean: posterior.extract_trace("mixtureMean")?,
            mixture_variance: posterior.extract_trace("mixtureVariance")?,
            training_data: data.training_data.clone(),
            evaluation_data: data.evaluation_data.clone(),
            grid_points: data.grid_points.clone(),
            name: name.to_string(),
        })
    }
}

impl ExperimentResults for ArxMixtureResults {
    const PREFIX: &'static str = "example4";

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SysIdError;
    use crate::posterior::PosteriorSamples;
    use serde_json::Value;

    fn vector(rows: usize, cols: usize, f: impl Fn(usize, usize) -> f64) -> DMatrix<f64> {
        DMatrix::from_fn(rows, cols, f)
    }

    fn mixture_posterior(grid_len: usize) -> PosteriorSamples {
        let mut posterior = PosteriorSamples::new();
        posterior
            .insert_vector("log_p_y_tilde", vector(2, grid_len, |i, _| (i as f64 + 1.0).ln()))
            .unwrap();
        posterior.insert_scalar("sigma0", vec![1.0, 1.1]).unwrap();
        posterior.insert_scalar("e0", vec![0.5, 0.6]).unwrap();
        posterior
            .insert_vector("weights", vector(2, 5, |_, _| 0.2))
            .unwrap();
        posterior
            .insert_vector("mu", vector(2, 5, |i, j| (i + j) as f64))
            .unwrap();
        posterior
            .insert_vector("sigma", vector(2, 5, |_, j| 1.0 + j as f64))
            .unwrap();
        posterior
    }

    #[test]
    fn test_mixture_collect() {
        let grid = [-1.0, 0.0, 1.0];
        let observations = [-0.5, 0.1, 0.3, 0.9];
        let results =
            MixtureResults::collect(&grid, &observations, &mixture_posterior(3), "run").unwrap();

        // mean of exp(ln 1), exp(ln 2)
        assert!(results
            .mcmc_density_estimate
            .iter()
            .all(|d| (d - 1.5).abs() < 1e-12));
        assert_eq!(results.kernel_density_estimate.len(), 3);
        assert_eq!(results.sigma0, Trace::Flat(vec![1.0, 1.1]));
        assert_eq!(results.mu.components(), 5);
        assert_eq!(results.file_name(), "example2_run.json");
    }

    #[test]
    fn test_mixture_grid_mismatch() {
        let grid = [-1.0, 0.0, 1.0];
        let observations = [-0.5, 0.1, 0.3, 0.9];
        assert!(MixtureResults::collect(&grid, &observations, &mixture_posterior(4), "run").is_err());
    }

    #[test]
    fn test_mixture_round_trip_and_keys() {
        let grid = [-1.0, 0.0, 1.0];
        let observations = [-0.5, 0.1, 0.3, 0.9];
        let results =
            MixtureResults::collect(&grid, &observations, &mixture_posterior(3), "trial α").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = results.save(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "example2_trial α.json");

        let loaded = MixtureResults::load(&path).unwrap();
        assert_eq!(loaded, results);

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let keys: Vec<&str> = raw.as_object().unwrap().keys().map(String::as_str).collect();
        for key in [
            "kernelDensityEstimate",
            "MCMCDensityEstimate",
            "sigma0",
            "e0",
            "weights",
            "mu",
            "sigma",
            "observations",
            "gridPoints",
            "name",
        ] {
            assert!(keys.contains(&key), "missing key {key}");
        }
        assert_eq!(raw["name"], "trial α");
    }

    #[test]
    fn test_cheby_collect_skips_system_order() {
        let data = ChebyData {
            system_order: 2,
            y_estimation: vec![1.0, 2.0],
            y_validation: vec![3.0],
            true_order: vec![2, 2],
            guessed_order: vec![3, 3],
            coefficients_a: vec![-1.5, 0.7],
            coefficients_b: vec![1.0, 0.5],
        };
        let mut posterior = PosteriorSamples::new();
        posterior
            .insert_vector("predictiveMean", vector(2, 4, |i, j| (10 * j + i) as f64))
            .unwrap();
        posterior
            .insert_vector("modelCoefficients", vector(2, 3, |_, _| 0.1))
            .unwrap();
        posterior
            .insert_scalar("observationNoiseVariance", vec![0.2, 0.3])
            .unwrap();

        let results = ChebyResults::collect(&data, &posterior, "cheby", false).unwrap();
        assert_eq!(results.predictive_mean, vec![20.5, 30.5]);
        assert_eq!(results.predictive_mean_variance, vec![0.25, 0.25]);
        assert!(results.scale_model_coefficients.is_none());

        let raw = serde_json::to_value(&results).unwrap();
        assert!(raw.get("scaleModelCoefficients").is_none());
        assert_eq!(raw["trueOrder"], serde_json::json!([2, 2]));

        assert!(ChebyResults::collect(&data, &posterior, "cheby", true).is_err());
    }

    #[test]
    fn test_fir_round_trip() {
        let mut posterior = PosteriorSamples::new();
        posterior.insert_scalar("mu", vec![0.0, 0.1]).unwrap();
        posterior
            .insert_vector("b", vector(2, 3, |i, j| (i * 3 + j) as f64))
            .unwrap();
        posterior.insert_scalar("sigma", vec![1.0, 1.0]).unwrap();
        posterior.insert_scalar("sigma0", vec![2.0, 2.0]).unwrap();

        let results = FirResults::collect(&[1.0, 2.0], &[0.5, -0.5], &posterior, "fir").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = results.save(dir.path()).unwrap();
        assert!(path.ends_with("example1_fir.json"));
        assert_eq!(FirResults::load(&path).unwrap(), results);
    }

    fn arx_mixture_posterior() -> PosteriorSamples {
        let mut posterior = PosteriorSamples::new();
        posterior
            .insert_vector("mixtureOnGrid", vector(2, 2, |_, _| 0.0))
            .unwrap();
        posterior
            .insert_vector("predictiveMean", vector(2, 3, |i, j| (i + j) as f64))
            .unwrap();
        posterior
            .insert_vector("predictiveVariance", vector(2, 3, |_, j| j as f64))
            .unwrap();
        for name in [
            "filterCoefficient",
            "mixtureWeightsPrior",
            "filterCoefficientPrior",
            "mixtureMeanPrior",
            "mixtureWeights",
            "mixtureMean",
            "mixtureVariance",
        ] {
            posterior
                .insert_vector(name, vector(2, 2, |_, _| 0.5))
                .unwrap();
        }
        posterior
    }

    fn arx_mixture_data(grid_points: Vec<f64>) -> ArxMixtureData {
        ArxMixtureData {
            grid_points,
            training_data: vec![0.2, 0.4, 1.0, 1.3],
            evaluation_data: vec![0.5],
            max_lag: 1,
        }
    }

    #[test]
    fn test_arx_mixture_collect() {
        let data = arx_mixture_data(vec![0.0, 1.0]);
        let results = ArxMixtureResults::collect(&data, &arx_mixture_posterior(), "arx").unwrap();
        assert_eq!(results.mcmc_density_estimate, vec![1.0, 1.0]);
        assert_eq!(results.predictive_mean, vec![1.5, 2.5]);
        assert_eq!(results.predictive_mean_variance, vec![0.25, 0.25]);
        assert_eq!(results.predictive_variance, vec![1.0, 2.0]);
        assert_eq!(results.file_name(), "example4_arx.json");
    }

    #[test]
    fn test_arx_mixture_grid_mismatch() {
        let data = arx_mixture_data(vec![0.0, 0.5, 1.0]);
        let err = ArxMixtureResults::collect(&data, &arx_mixture_posterior(), "arx").unwrap_err();
        assert!(matches!(
            err,
            SysIdError::LengthMismatch { expected: 3, got: 2, .. }
        ));
    }

    #[test]
    fn test_fir_mixture_grid_mismatch() {
        let data = FirMixtureData {
            grid_points: vec![-1.0, 0.0, 1.0],
            y_estimation: vec![0.1, -0.2, 0.4],
            y_validation: vec![0.3, 0.0],
            regressor_matrix_estimation: vector(3, 2, |i, j| (i + j) as f64),
            regressor_matrix_validation: vector(2, 2, |i, j| (i * j) as f64),
            inputs: vec![1.0, -1.0, 1.0, 1.0, -1.0],
            observations: vec![0.1, -0.2, 0.4, 0.3, 0.0],
            true_order: vec![2, 2],
            guessed_order: vec![2, 2],
            coefficients_a: vec![-0.5],
            coefficients_b: vec![1.0],
        };
        let mut posterior = PosteriorSamples::new();
        posterior
            .insert_vector("mixtureOnGrid", vector(2, 4, |_, _| 0.25))
            .unwrap();

        let err = FirMixtureResults::collect(&data, &posterior, "fir").unwrap_err();
        assert!(matches!(
            err,
            SysIdError::LengthMismatch { expected: 3, got: 4, .. }
        ));
    }

    #[test]
    fn test_non_finite_values_round_trip() {
        let mut posterior = PosteriorSamples::new();
        posterior.insert_scalar("mu", vec![f64::NAN, 0.5]).unwrap();
        posterior
            .insert_vector("b", vector(2, 2, |i, j| if i + j == 0 { f64::INFINITY } else { 1.0 }))
            .unwrap();
        posterior.insert_scalar("sigma", vec![1.0, 1.0]).unwrap();
        posterior.insert_scalar("sigma0", vec![2.0, 2.0]).unwrap();

        let results =
            FirResults::collect(&[f64::NAN, 2.0], &[0.5, -0.5], &posterior, "nan").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = results.save(dir.path()).unwrap();
        let loaded = FirResults::load(&path).unwrap();

        let mu = loaded.mu.component(0).unwrap();
        assert!(mu[0].is_nan());
        assert_eq!(mu[1], 0.5);
        // infinities are written as null too and come back as NaN
        assert!(loaded.b.component(0).unwrap()[0].is_nan());
        assert_eq!(loaded.b.component(1), Some(vec![1.0, 1.0]));
        assert!(loaded.observations[0].is_nan());
        assert_eq!(loaded.inputs, results.inputs);
        assert_eq!(loaded.sigma, results.sigma);
    }
}
