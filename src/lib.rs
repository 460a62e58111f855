//! sysid-bayes - support code for Bayesian system identification experiments
//!
//! Builds AR/ARX regressor matrices, generates excitation signals
//! (skew-normal noise, pseudo-random binary sequences), simulates ARX
//! systems and turns posterior draws from an external sampler into
//! per-experiment JSON result files.

pub mod density;
pub mod error;
pub mod excitation;
#[cfg(feature = "plot")]
pub mod plot;
pub mod posterior;
pub mod regressor;
pub mod results;
pub mod sampler_data;
pub mod system;

// Re-export main types
pub use error::{Result, SysIdError};
pub use excitation::{grid_points, prbs, skew_normal_samples, uniform_noise, SkewNormal};
pub use posterior::{ParameterDraws, PosteriorSamples, PosteriorSource, Trace};
pub use regressor::{build_ar_regressors, build_arx_regressors, build_regressor_matrix, LagOrder};
pub use results::ExperimentResults;
pub use sampler_data::SamplerData;
pub use system::{simulate_arx, ArxDataset, ArxSimConfig, ArxSystem};
