//! Numeric array payload
//!
//! Row-major `f64` storage with an explicit shape. Arrays are written as a
//! plain-text dump compatible with `numpy.savetxt` defaults.

use crate::error::{Error, Result};
use crate::kind::PayloadKind;
use crate::ops;
use crate::payload::Payload;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Dense numeric array
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayData {
    shape: Vec<usize>,
    values: Vec<f64>,
}

impl ArrayData {
    /// Create an array with the given shape
    pub fn new(shape: Vec<usize>, values: Vec<f64>) -> Result<Self> {
        let expected = ops::element_count(&shape)?;
        if expected != values.len() {
            return Err(Error::size_mismatch(expected, values.len(), "array shape"));
        }
        Ok(Self { shape, values })
    }

    /// Create a one-dimensional array
    pub fn from_vec(values: Vec<f64>) -> Self {
        Self {
            shape: vec![values.len()],
            values,
        }
    }

    /// Create a zero-dimensional array holding a single value
    pub fn scalar(value: f64) -> Self {
        Self {
            shape: Vec::new(),
            values: vec![value],
        }
    }

    /// Create an array of zeros
    pub fn zeros(shape: Vec<usize>) -> Result<Self> {
        let len = ops::element_count(&shape)?;
        Ok(Self {
            shape,
            values: vec![0.0; len],
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in row-major order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Consume the array and return its values
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Read back a text dump written by [`Payload::write`].
    ///
    /// A dump with a single column reads as a one-dimensional array, anything
    /// wider as a two-dimensional one. Blank lines and `#` comments are skipped.
    pub fn read_text(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let mut rows: Vec<Vec<f64>> = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let row = line
                .split_whitespace()
                .map(|tok| {
                    tok.parse::<f64>().map_err(|e| {
                        Error::Parse(format!("line {}: invalid value '{tok}': {e}", lineno + 1))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(row);
        }

        let cols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|r| r.len() != cols) {
            return Err(Error::Parse(format!(
                "ragged rows: expected {cols} columns, found {}",
                bad.len()
            )));
        }

        let n_rows = rows.len();
        let values: Vec<f64> = rows.into_iter().flatten().collect();
        if cols <= 1 {
            Ok(Self::from_vec(values))
        } else {
            Self::new(vec![n_rows, cols], values)
        }
    }

    fn check_shape(&self, other: &Self, context: &str) -> Result<()> {
        if self.shape != other.shape {
            return Err(Error::shape_mismatch(&self.shape, &other.shape, context));
        }
        Ok(())
    }
}

impl From<Vec<f64>> for ArrayData {
    fn from(values: Vec<f64>) -> Self {
        Self::from_vec(values)
    }
}

impl Payload for ArrayData {
    const KIND: PayloadKind = PayloadKind::Array;

    fn check_compatible(&self, other: &Self) -> Result<()> {
        self.check_shape(other, "array operands")
    }

    fn add_assign(&mut self, other: &Self) -> Result<()> {
        self.check_shape(other, "array add")?;
        ops::add_assign(&mut self.values, &other.values);
        Ok(())
    }

    fn divide_assign(&mut self, other: &Self) -> Result<()> {
        self.check_shape(other, "array divide")?;
        ops::div_assign(&mut self.values, &other.values);
        Ok(())
    }

    fn write(&self, path: &Path) -> Result<()> {
        let columns = match self.shape.as_slice() {
            [] | [_] => 1,
            [_, cols] => *cols,
            _ => {
                return Err(Error::InvalidInput(format!(
                    "text dump supports at most 2 dimensions, got {}",
                    self.ndim()
                )))
            }
        };

        debug!(path = %path.display(), shape = ?self.shape, "writing array");
        let mut out = BufWriter::new(File::create(path)?);
        if columns > 0 {
            for row in self.values.chunks(columns) {
                let line: Vec<String> = row.iter().map(|&v| ops::format_scientific(v)).collect();
                writeln!(out, "{}", line.join(" "))?;
            }
        }
        out.flush()?;
        Ok(())
    }

    fn shape(&self) -> Vec<usize> {
        self.shape.clone()
    }
}
