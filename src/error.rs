//! Crate error type

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SysIdError>;

#[derive(Debug, Error)]
pub enum SysIdError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("{context} length mismatch: expected {expected}, got {got}")]
    LengthMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("exogenous lag order requires an input sequence")]
    MissingInputs,
    #[error("posterior draws have no parameter named `{0}`")]
    MissingParameter(String),
    #[error("parameter `{name}` has unexpected shape: {reason}")]
    ShapeMismatch { name: String, reason: String },
    #[error("cannot parse `{value}` in column `{column}`")]
    InvalidValue { column: String, value: String },
    #[error("plot error: {0}")]
    Plot(String),
}

pub(crate) fn ensure_len(context: &'static str, expected: usize, got: usize) -> Result<()> {
    if expected == got {
        return Ok(());
    }

    Err(SysIdError::LengthMismatch {
        context,
        expected,
        got,
    })
}
