//! Data file handed to the external sampler
//!
//! The sampler reads its data block from a JSON object mapping variable
//! names to integers, reals, vectors and row-major matrices.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use nalgebra::DMatrix;
use serde_json::{json, Value};
use tracing::info;

use crate::error::Result;
use crate::regressor::matrix_rows;

#[derive(Debug, Clone, Default)]
pub struct SamplerData {
    entries: BTreeMap<String, Value>,
}

impl SamplerData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_int(&mut self, name: &str, value: i64) -> &mut Self {
        self.entries.insert(name.to_string(), json!(value));
        self
    }

    pub fn insert_real(&mut self, name: &str, value: f64) -> &mut Self {
        self.entries.insert(name.to_string(), json!(value));
        self
    }

    pub fn insert_vector(&mut self, name: &str, values: &[f64]) -> &mut Self {
        self.entries.insert(name.to_string(), json!(values));
        self
    }

    pub fn insert_matrix(&mut self, name: &str, matrix: &DMatrix<f64>) -> &mut Self {
        self.entries
            .insert(name.to_string(), json!(matrix_rows(matrix)));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.entries.clone().into_iter().collect())
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, &self.entries)?;
        info!(path = %path.display(), variables = self.entries.len(), "wrote sampler data");
        Ok(())
    }
}
