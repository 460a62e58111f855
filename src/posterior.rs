//! Posterior draws from the external sampler
//!
//! The sampler is reached only through [`PosteriorSource`]. The bundled
//! [`PosteriorSamples`] store is filled either in memory or from a sampler
//! CSV file in CmdStan layout: `#` comment lines, one header row, one row
//! per draw, indexed parameters flattened into `name.k` columns.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use nalgebra::DMatrix;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SysIdError};
use crate::regressor::matrix_rows;

/// Draws of one named parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterDraws {
    /// One value per draw
    Scalar(Vec<f64>),
    /// Draws along rows, components along columns
    Vector(DMatrix<f64>),
}

impl ParameterDraws {
    pub fn draw_count(&self) -> usize {
        match self {
            ParameterDraws::Scalar(values) => values.len(),
            ParameterDraws::Vector(matrix) => matrix.nrows(),
        }
    }

    /// Plain-list form for JSON output
    ///
    /// Without draws both shapes serialize to `[]`, so the trace is flat.
    pub fn to_trace(&self) -> Trace {
        match self {
            ParameterDraws::Scalar(values) => Trace::Flat(values.clone()),
            ParameterDraws::Vector(matrix) if matrix.nrows() == 0 => Trace::Flat(Vec::new()),
            ParameterDraws::Vector(matrix) => Trace::Nested(matrix_rows(matrix)),
        }
    }
}

/// Posterior trace as written to result files
///
/// Non-finite draws are written as `null` and read back as NaN.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Trace {
    Flat(Vec<f64>),
    Nested(Vec<Vec<f64>>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NullableTrace {
    Flat(Vec<Option<f64>>),
    Nested(Vec<Vec<Option<f64>>>),
}

impl<'de> Deserialize<'de> for Trace {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match NullableTrace::deserialize(deserializer)? {
            NullableTrace::Flat(values) => Trace::Flat(or_nan(values)),
            NullableTrace::Nested(rows) => Trace::Nested(rows.into_iter().map(or_nan).collect()),
        })
    }
}

fn or_nan(values: Vec<Option<f64>>) -> Vec<f64> {
    values
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect()
}

/// `deserialize_with` helper for float lists that may hold `null`
pub(crate) fn deserialize_nullable<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<f64>, D::Error> {
    Ok(or_nan(Vec::<Option<f64>>::deserialize(deserializer)?))
}

/// Row-list counterpart of [`deserialize_nullable`]
pub(crate) fn deserialize_nullable_rows<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<Vec<f64>>, D::Error> {
    let rows = Vec::<Vec<Option<f64>>>::deserialize(deserializer)?;
    Ok(rows.into_iter().map(or_nan).collect())
}

impl Trace {
    pub fn draw_count(&self) -> usize {
        match self {
            Trace::Flat(values) => values.len(),
            Trace::Nested(rows) => rows.len(),
        }
    }

    /// Trace of component `k`; a flat trace only has component 0
    pub fn component(&self, k: usize) -> Option<Vec<f64>> {
        match self {
            Trace::Flat(values) => (k == 0).then(|| values.clone()),
            Trace::Nested(rows) => rows.iter().map(|row| row.get(k).copied()).collect(),
        }
    }

    pub fn components(&self) -> usize {
        match self {
            Trace::Flat(_) => 1,
            Trace::Nested(rows) => rows.first().map_or(0, Vec::len),
        }
    }
}

/// Access to named posterior draws
pub trait PosteriorSource {
    fn extract(&self, name: &str) -> Result<ParameterDraws>;

    /// Draws of a parameter that must be scalar
    fn extract_scalar(&self, name: &str) -> Result<Vec<f64>> {
        match self.extract(name)? {
            ParameterDraws::Scalar(values) => Ok(values),
            ParameterDraws::Vector(matrix) => Err(SysIdError::ShapeMismatch {
                name: name.to_string(),
                reason: format!("expected scalar draws, got {} components", matrix.ncols()),
            }),
        }
    }

    /// Draws of a parameter that must be indexed, draws along rows
    fn extract_vector(&self, name: &str) -> Result<DMatrix<f64>> {
        match self.extract(name)? {
            ParameterDraws::Vector(matrix) => Ok(matrix),
            ParameterDraws::Scalar(_) => Err(SysIdError::ShapeMismatch {
                name: name.to_string(),
                reason: "expected indexed draws, got a scalar".to_string(),
            }),
        }
    }

    fn extract_trace(&self, name: &str) -> Result<Trace> {
        Ok(self.extract(name)?.to_trace())
    }
}

/// In-memory posterior draws keyed by parameter name
#[derive(Debug, Clone, Default)]
pub struct PosteriorSamples {
    parameters: BTreeMap<String, ParameterDraws>,
    draw_count: Option<usize>,
}

impl PosteriorSamples {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, draws: ParameterDraws) -> Result<()> {
        let count = draws.draw_count();
        match self.draw_count {
            Some(expected) => crate::error::ensure_len("posterior draws", expected, count)?,
            None => self.draw_count = Some(count),
        }
        self.parameters.insert(name.into(), draws);
        Ok(())
    }

    pub fn insert_scalar(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        self.insert(name, ParameterDraws::Scalar(values))
    }

    pub fn insert_vector(&mut self, name: impl Into<String>, matrix: DMatrix<f64>) -> Result<()> {
        self.insert(name, ParameterDraws::Vector(matrix))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parameters.keys().map(String::as_str)
    }

    pub fn draw_count(&self) -> usize {
        self.draw_count.unwrap_or(0)
    }

    pub fn from_stan_csv(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let samples = Self::from_stan_csv_reader(file)?;
        info!(
            path = %path.display(),
            parameters = samples.parameters.len(),
            draws = samples.draw_count(),
            "loaded posterior draws"
        );
        Ok(samples)
    }

    pub fn from_stan_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let columns: Vec<Option<Column>> = headers.iter().map(parse_column).collect();

        let mut values: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record?;
            for (idx, raw) in record.iter().enumerate() {
                if columns.get(idx).map_or(true, Option::is_none) {
                    continue;
                }
                let value: f64 = raw.parse().map_err(|_| SysIdError::InvalidValue {
                    column: headers.get(idx).unwrap_or_default().to_string(),
                    value: raw.to_string(),
                })?;
                values[idx].push(value);
            }
        }

        // Group columns by parameter, members in index order.
        let mut groups: Vec<(String, bool, Vec<(Vec<usize>, usize)>)> = Vec::new();
        for (idx, column) in columns.iter().enumerate() {
            let Some(column) = column else {
                continue;
            };
            let key = column.index.clone().unwrap_or_default();
            match groups.iter_mut().find(|(n, _, _)| *n == column.name) {
                Some((_, _, members)) => members.push((key, idx)),
                None => {
                    let indexed = column.index.is_some();
                    groups.push((column.name.clone(), indexed, vec![(key, idx)]));
                }
            }
        }
        for (_, _, members) in &mut groups {
            members.sort_by(|a, b| a.0.cmp(&b.0));
        }

        let mut samples = Self::new();
        for (name, indexed, members) in groups {
            let members: Vec<usize> = members.into_iter().map(|(_, idx)| idx).collect();
            let draws = if !indexed && members.len() == 1 {
                ParameterDraws::Scalar(std::mem::take(&mut values[members[0]]))
            } else {
                let rows = values[members[0]].len();
                for &idx in &members {
                    crate::error::ensure_len("posterior column", rows, values[idx].len())?;
                }
                ParameterDraws::Vector(DMatrix::from_fn(rows, members.len(), |i, j| {
                    values[members[j]][i]
                }))
            };
            debug!(parameter = %name, draws = draws.draw_count(), "parsed parameter");
            samples.insert(name, draws)?;
        }

        Ok(samples)
    }
}

impl PosteriorSource for PosteriorSamples {
    fn extract(&self, name: &str) -> Result<ParameterDraws> {
        self.parameters
            .get(name)
            .cloned()
            .ok_or_else(|| SysIdError::MissingParameter(name.to_string()))
    }
}

/// One parameter column of the sampler CSV
struct Column {
    name: String,
    /// 1-based indices, `None` for a scalar column
    index: Option<Vec<usize>>,
}

/// Split a header such as `mu`, `mu.2`, `w[3]` or `L.2.1` into name and index
///
/// Sampler diagnostics such as `lp__` or `accept_stat__` are skipped.
fn parse_column(header: &str) -> Option<Column> {
    if header.is_empty() || header.ends_with("__") {
        return None;
    }

    match header.find(|c| c == '.' || c == '[') {
        Some(pos) => {
            let index = header[pos..]
                .split(|c: char| !c.is_ascii_digit())
                .filter(|part| !part.is_empty())
                .filter_map(|part| part.parse().ok())
                .collect();
            Some(Column {
                name: header[..pos].to_string(),
                index: Some(index),
            })
        }
        None => Some(Column {
            name: header.to_string(),
            index: None,
        }),
    }
}

/// Mean over the draw axis, one value per component
pub fn mean_over_draws(draws: &DMatrix<f64>) -> Vec<f64> {
    let n = draws.nrows() as f64;
    draws.column_iter().map(|col| col.sum() / n).collect()
}

/// Population variance (ddof 0) over the draw axis
pub fn variance_over_draws(draws: &DMatrix<f64>) -> Vec<f64> {
    let n = draws.nrows() as f64;
    draws
        .column_iter()
        .map(|col| {
            let mean = col.sum() / n;
            col.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n
        })
        .collect()
}

/// Apply `f` to every draw, e.g. `exp` to turn log densities into densities
pub fn map_values(draws: &DMatrix<f64>, f: impl Fn(f64) -> f64) -> DMatrix<f64> {
    draws.map(f)
}

/// Drop the first `k` components, clamped to the component count
pub fn skip_components(draws: &DMatrix<f64>, k: usize) -> DMatrix<f64> {
    let start = k.min(draws.ncols());
    draws.columns(start, draws.ncols() - start).into_owned()
}
