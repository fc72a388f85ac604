use std::fmt::Write;

use crate::error::{CodecError, Result};
use crate::scalar::{deserialize, Scalar};

/// A dense row-major matrix of doubles, at least 1x1.
///
/// Text form: `<rows>x<cols>` followed by `rows * cols` values, e.g.
/// `2x2 1 2 3 4`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Build a matrix from row-major values.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        check_dimensions(rows, cols)?;
        if Some(data.len()) != rows.checked_mul(cols) {
            return Err(CodecError::MatrixShape {
                rows,
                cols,
                found: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        check_dimensions(rows, cols)?;
        let len = rows.checked_mul(cols).ok_or(CodecError::MatrixShape {
            rows,
            cols,
            found: 0,
        })?;
        Ok(Self {
            rows,
            cols,
            data: vec![0.0; len],
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.index(row, col).map(|i| self.data[i])
    }

    /// Set one element. Returns `false` when out of bounds.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> bool {
        match self.index(row, col) {
            Some(i) => {
                self.data[i] = value;
                true
            }
            None => false,
        }
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        (row < self.rows).then(|| &self.data[row * self.cols..(row + 1) * self.cols])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    pub fn serialize(&self) -> Result<String> {
        let mut out = String::new();
        let _ = write!(out, "{}x{}", self.rows, self.cols);
        for value in &self.data {
            out.push(' ');
            value.write_to(&mut out)?;
        }
        Ok(out)
    }

    pub fn deserialize(text: &str) -> Result<Self> {
        let mut tokens = text.split_whitespace();
        let header = tokens
            .next()
            .ok_or_else(|| CodecError::MatrixHeader(String::new()))?;
        let (rows, cols) = parse_header(header)?;
        check_dimensions(rows, cols)?;

        let data = tokens
            .map(deserialize::<f64>)
            .collect::<Result<Vec<_>>>()?;
        Self::new(rows, cols, data)
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then_some(row * self.cols + col)
    }
}

fn check_dimensions(rows: usize, cols: usize) -> Result<()> {
    if rows == 0 || cols == 0 {
        return Err(CodecError::MatrixDimensions { rows, cols });
    }
    Ok(())
}

fn parse_header(header: &str) -> Result<(usize, usize)> {
    let invalid = || CodecError::MatrixHeader(header.to_string());
    let (rows, cols) = header
        .split_once(['x', 'X'])
        .ok_or_else(invalid)?;
    let rows = rows.parse().map_err(|_| invalid())?;
    let cols = cols.parse().map_err(|_| invalid())?;
    Ok((rows, cols))
}
