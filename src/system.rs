//! ARX system simulation
//!
//! Generates identification data from a known ARX system driven by a PRBS
//! input and skew-normal disturbance.

use std::fs;
use std::path::Path;

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SysIdError};
use crate::excitation::{prbs, skew_normal_samples, SkewNormal, DEFAULT_MAX_HOLD};
use crate::regressor::{build_regressor_matrix, LagOrder};

/// Linear ARX system
///
/// `y[t] = -sum_i a_i y[t-i] + sum_j b_j u[t-j] + e[t]`, with `i` starting
/// at 1 and `j` at 0. Samples before the start of the record count as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArxSystem {
    pub coefficients_a: Vec<f64>,
    pub coefficients_b: Vec<f64>,
}

impl ArxSystem {
    pub fn new(coefficients_a: Vec<f64>, coefficients_b: Vec<f64>) -> Self {
        Self {
            coefficients_a,
            coefficients_b,
        }
    }

    /// Lag order matching the coefficient counts
    pub fn order(&self) -> LagOrder {
        LagOrder::Exogenous {
            output_lags: self.coefficients_a.len(),
            input_lags: self.coefficients_b.len(),
        }
    }

    /// Simulate the output for `inputs` with additive `noise`
    pub fn simulate(&self, inputs: &[f64], noise: &[f64]) -> Result<Vec<f64>> {
        crate::error::ensure_len("arx noise", inputs.len(), noise.len())?;

        let mut outputs: Vec<f64> = Vec::with_capacity(inputs.len());
        for t in 0..inputs.len() {
            let feedback: f64 = self
                .coefficients_a
                .iter()
                .enumerate()
                .filter(|(i, _)| t > *i)
                .map(|(i, a)| a * outputs[t - 1 - i])
                .sum();
            let forward: f64 = self
                .coefficients_b
                .iter()
                .enumerate()
                .filter(|(j, _)| t >= *j)
                .map(|(j, b)| b * inputs[t - j])
                .sum();
            outputs.push(-feedback + forward + noise[t]);
        }

        Ok(outputs)
    }
}

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArxSimConfig {
    pub samples: usize,
    /// Share of samples used for estimation, the rest is validation
    pub estimation_fraction: f64,
    pub coefficients_a: Vec<f64>,
    pub coefficients_b: Vec<f64>,
    /// Lag order handed to the model, may differ from the true one
    pub guessed_order: LagOrder,
    pub max_hold: usize,
    pub noise: SkewNormal,
    pub seed: u64,
}

impl Default for ArxSimConfig {
    fn default() -> Self {
        Self {
            samples: 1000,
            estimation_fraction: 0.5,
            coefficients_a: vec![-1.5, 0.7],
            coefficients_b: vec![1.0, 0.5],
            guessed_order: LagOrder::Exogenous {
                output_lags: 3,
                input_lags: 3,
            },
            max_hold: DEFAULT_MAX_HOLD,
            noise: SkewNormal {
                alpha: 2.0,
                loc: 0.0,
                scale: 0.1,
            },
            seed: 42,
        }
    }
}

impl ArxSimConfig {
    pub fn validate(&self) -> Result<()> {
        if self.samples == 0 {
            return Err(SysIdError::InvalidConfig(
                "samples must be greater than zero".to_string(),
            ));
        }

        if !(self.estimation_fraction > 0.0 && self.estimation_fraction < 1.0) {
            return Err(SysIdError::InvalidConfig(
                "estimation_fraction must be in (0, 1)".to_string(),
            ));
        }

        if self
            .coefficients_a
            .iter()
            .chain(self.coefficients_b.iter())
            .any(|c| !c.is_finite())
        {
            return Err(SysIdError::InvalidConfig(
                "system coefficients must be finite".to_string(),
            ));
        }

        if self.max_hold == 0 {
            return Err(SysIdError::InvalidConfig(
                "max_hold must be at least 1".to_string(),
            ));
        }

        SkewNormal::new(self.noise.alpha, self.noise.loc, self.noise.scale)?;
        Ok(())
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn system(&self) -> ArxSystem {
        ArxSystem::new(self.coefficients_a.clone(), self.coefficients_b.clone())
    }
}

/// Simulated input/output record split into estimation and validation parts
#[derive(Debug, Clone)]
pub struct ArxDataset {
    pub inputs: Vec<f64>,
    pub outputs: Vec<f64>,
    pub estimation_len: usize,
    pub system: ArxSystem,
    pub guessed_order: LagOrder,
}

impl ArxDataset {
    pub fn true_order(&self) -> LagOrder {
        self.system.order()
    }

    pub fn estimation_outputs(&self) -> &[f64] {
        &self.outputs[..self.estimation_len]
    }

    pub fn validation_outputs(&self) -> &[f64] {
        &self.outputs[self.estimation_len..]
    }

    pub fn estimation_inputs(&self) -> &[f64] {
        &self.inputs[..self.estimation_len]
    }

    pub fn validation_inputs(&self) -> &[f64] {
        &self.inputs[self.estimation_len..]
    }

    /// Regressor matrices for the estimation and validation halves
    pub fn regressors(&self, order: LagOrder) -> Result<(DMatrix<f64>, DMatrix<f64>)> {
        let estimation = build_regressor_matrix(
            self.estimation_outputs(),
            order,
            Some(self.estimation_inputs()),
        )?;
        let validation = build_regressor_matrix(
            self.validation_outputs(),
            order,
            Some(self.validation_inputs()),
        )?;
        Ok((estimation, validation))
    }
}

/// Run the ARX simulation described by `config`
pub fn simulate_arx(config: &ArxSimConfig) -> Result<ArxDataset> {
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let inputs = prbs(config.samples, config.max_hold, &mut rng)?;
    let noise = skew_normal_samples(config.samples, &config.noise, &mut rng);

    let system = config.system();
    let outputs = system.simulate(&inputs, &noise)?;

    let estimation_len = ((config.samples as f64) * config.estimation_fraction).round() as usize;
    debug!(
        samples = config.samples,
        estimation_len,
        seed = config.seed,
        "simulated arx system"
    );

    Ok(ArxDataset {
        inputs,
        outputs,
        estimation_len,
        system,
        guessed_order: config.guessed_order,
    })
}
