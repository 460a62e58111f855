//! Regressor matrix construction
//!
//! Builds lagged feature matrices for AR and ARX model fitting. Each row
//! holds the regressors for one time step; steps without enough history
//! are dropped.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ensure_len, Result, SysIdError};

/// Lag structure of the model the regressors are built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LagOrder {
    /// Current value plus `p` past outputs
    Autoregressive(usize),
    /// `output_lags` negated past outputs followed by `input_lags` inputs
    Exogenous {
        output_lags: usize,
        input_lags: usize,
    },
}

impl LagOrder {
    /// Number of leading samples without a full regressor row
    pub fn max_lag(&self) -> usize {
        match *self {
            LagOrder::Autoregressive(p) => p,
            LagOrder::Exogenous {
                output_lags,
                input_lags,
            } => output_lags.max(input_lags),
        }
    }

    /// Number of regressor columns
    pub fn columns(&self) -> usize {
        match *self {
            LagOrder::Autoregressive(p) => p + 1,
            LagOrder::Exogenous {
                output_lags,
                input_lags,
            } => output_lags + input_lags,
        }
    }

    /// Orders as a plain list, `[p]` or `[p, q]`
    pub fn as_vec(&self) -> Vec<usize> {
        match *self {
            LagOrder::Autoregressive(p) => vec![p],
            LagOrder::Exogenous {
                output_lags,
                input_lags,
            } => vec![output_lags, input_lags],
        }
    }
}

/// Number of usable rows for a series of `len` samples
fn usable_rows(len: usize, max_lag: usize) -> usize {
    len.saturating_sub(max_lag)
}

/// Build AR regressors of order `p`
///
/// Row `i` is `[y[i+p], y[i+p-1], ..., y[i]]`. Series no longer than `p`
/// give a matrix with zero rows.
pub fn build_ar_regressors(observations: &[f64], p: usize) -> DMatrix<f64> {
    let rows = usable_rows(observations.len(), p);
    DMatrix::from_fn(rows, p + 1, |i, j| observations[i + p - j])
}

/// Build ARX regressors with `p` output lags and `q` input lags
///
/// Row `i` covers time `t = i + max(p, q)` and reads
/// `[-y[t-1], ..., -y[t-p], u[t], u[t-1], ..., u[t-q+1]]`.
pub fn build_arx_regressors(
    observations: &[f64],
    inputs: &[f64],
    p: usize,
    q: usize,
) -> Result<DMatrix<f64>> {
    ensure_len("arx inputs", observations.len(), inputs.len())?;

    let max_lag = p.max(q);
    let rows = usable_rows(observations.len(), max_lag);
    let regressors = DMatrix::from_fn(rows, p + q, |i, j| {
        let t = i + max_lag;
        if j < p {
            // Output feedback enters with a minus sign in the ARX parameterization.
            -observations[t - 1 - j]
        } else {
            inputs[t - (j - p)]
        }
    });
    Ok(regressors)
}

/// Build the regressor matrix for `order`, dispatching on AR or ARX mode
///
/// `inputs` is ignored in AR mode and required in ARX mode.
pub fn build_regressor_matrix(
    observations: &[f64],
    order: LagOrder,
    inputs: Option<&[f64]>,
) -> Result<DMatrix<f64>> {
    let regressors = match order {
        LagOrder::Autoregressive(p) => build_ar_regressors(observations, p),
        LagOrder::Exogenous {
            output_lags,
            input_lags,
        } => {
            let inputs = inputs.ok_or(SysIdError::MissingInputs)?;
            build_arx_regressors(observations, inputs, output_lags, input_lags)?
        }
    };

    debug!(
        ?order,
        rows = regressors.nrows(),
        cols = regressors.ncols(),
        "built regressor matrix"
    );
    Ok(regressors)
}

/// Copy a matrix into row-major nested vectors
pub fn matrix_rows(matrix: &DMatrix<f64>) -> Vec<Vec<f64>> {
    matrix
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect()
}
