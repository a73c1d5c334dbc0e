//! Column-wise feature normalisation.
//!
//! Each input column is transformed according to a [`Pattern`]:
//!
//! - `Numeric`: standardised to `(x - mean) / std` using the sample standard deviation.
//!   When the variance is zero (a constant column) or there is a single row, `std` is
//!   floored to `1.0`, so constant columns become all zeros instead of NaN.
//! - `Category`: expanded into one column per distinct value, in first-appearance order,
//!   holding `1.0` where the row has that value and `-1.0` elsewhere.
//! - `Noop`: copied unchanged.

use crate::{Error, Matrix, Result};

/// Standard deviation used when a column has no spread.
pub const STD_FLOOR: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Noop,
    Numeric,
    Category,
}

#[derive(Debug, Clone, Default)]
pub struct Normaliser;

impl Normaliser {
    pub fn new() -> Self {
        Self
    }

    /// Apply one pattern per input column.
    ///
    /// `patterns.len()` must equal `input.cols()`. The output may be wider than the input
    /// when `Category` columns are expanded.
    pub fn normalise(&self, input: &Matrix, patterns: &[Pattern]) -> Result<Matrix> {
        if patterns.len() != input.cols() {
            return Err(Error::InvalidConfig(format!(
                "got {} patterns for {} input columns",
                patterns.len(),
                input.cols()
            )));
        }

        // Work column-major: one Vec per output column.
        let columns = input.transpose();
        let mut out_columns: Vec<Vec<f64>> = Vec::with_capacity(input.cols());
        for (column, &pattern) in columns.iter_rows().zip(patterns) {
            match pattern {
                Pattern::Noop => out_columns.push(column.to_vec()),
                Pattern::Numeric => out_columns.push(standardise(column)),
                Pattern::Category => out_columns.extend(categorise(column)),
            }
        }

        Ok(Matrix::from_rows(&out_columns)?.transpose())
    }
}

/// `(x - mean) / std` with the sample std floored to [`STD_FLOOR`].
pub fn standardise(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = sample_std(values, mean);
    values.iter().map(|x| (x - mean) / std).collect()
}

fn sample_std(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return STD_FLOOR;
    }
    let ss: f64 = values.iter().map(|x| (x - mean) * (x - mean)).sum();
    let variance = ss / (values.len() - 1) as f64;
    if variance == 0.0 {
        STD_FLOOR
    } else {
        variance.sqrt()
    }
}

fn categorise(values: &[f64]) -> Vec<Vec<f64>> {
    let mut categories: Vec<f64> = Vec::new();
    for &v in values {
        if !categories.contains(&v) {
            categories.push(v);
        }
    }
    categories
        .iter()
        .map(|&cat| {
            values
                .iter()
                .map(|&v| if v == cat { 1.0 } else { -1.0 })
                .collect()
        })
        .collect()
}
