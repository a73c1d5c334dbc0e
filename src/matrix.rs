//! Dense row-major `f64` matrix.
//!
//! `Matrix` is the numeric substrate for every classifier in this crate: datasets, weights,
//! activations and gradients are all stored as matrices with shape `(rows, cols)` and a flat
//! buffer where `data[r * cols + c]` is the entry at `(r, c)`.
//!
//! Operations are functional: they borrow their operands and allocate a new matrix. The few
//! in-place mutators (`add_assign`, `data_mut`) exist for gradient accumulators inside the
//! training loop.
//!
//! Shape mismatches are programmer error and panic with a message naming both shapes.
//! [`Matrix::try_dot`] is the checked variant for callers that want a [`Result`].

use std::fmt;

use rand::Rng;
use rand_distr::StandardNormal;

use crate::matmul;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Build a matrix from a flat row-major buffer.
    ///
    /// Panics if `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "shape error: buffer len {} does not match {rows}x{cols}",
            data.len()
        );
        Self { rows, cols, data }
    }

    /// Checked variant of [`Matrix::new`].
    pub fn from_flat(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidShape(format!(
                "buffer len {} does not match {rows}x{cols}",
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build a matrix from per-row vectors (copied into contiguous storage).
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::InvalidShape(format!(
                    "row {i} has len {}, expected {cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Build a matrix from a 2D array literal.
    pub fn from_array<const R: usize, const C: usize>(rows: [[f64; C]; R]) -> Self {
        let data = rows.iter().flatten().copied().collect();
        Self {
            rows: R,
            cols: C,
            data,
        }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    pub fn ones(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 1.0)
    }

    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Entries drawn from a standard normal distribution, multiplied by `scale`.
    pub fn random_normal<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        scale: f64,
        rng: &mut R,
    ) -> Self {
        let data = (0..rows * cols)
            .map(|_| scale * rng.sample::<f64, _>(StandardNormal))
            .collect();
        Self { rows, cols, data }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mutable view of the flat buffer.
    ///
    /// Used for explicitly scoped in-place updates (e.g. ReLU gradient gating).
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// Entry at `(row, col)`.
    ///
    /// Bounds are the caller's responsibility; out of range panics.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    /// Returns the `idx`-th row (shape: `(cols,)`).
    #[inline]
    pub fn row(&self, idx: usize) -> &[f64] {
        let start = idx * self.cols;
        &self.data[start..start + self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        // A 0-column matrix still yields `rows` empty rows.
        (0..self.rows).map(move |r| self.row(r))
    }

    /// New matrix holding the given rows, in order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Self {
            rows: indices.len(),
            cols: self.cols,
            data,
        }
    }

    /// New matrix holding rows `start..end`.
    pub fn rows_range(&self, start: usize, end: usize) -> Self {
        assert!(
            start <= end && end <= self.rows,
            "shape error: rows_range {start}..{end} on {}x{}",
            self.rows,
            self.cols
        );
        Self {
            rows: end - start,
            cols: self.cols,
            data: self.data[start * self.cols..end * self.cols].to_vec(),
        }
    }

    /// Swap rows `a` and `b` in place.
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let (lo, hi) = (a.min(b), a.max(b));
        let cols = self.cols;
        let (left, right) = self.data.split_at_mut(hi * cols);
        left[lo * cols..(lo + 1) * cols].swap_with_slice(&mut right[..cols]);
    }

    /// Standard matrix product `self * rhs`.
    ///
    /// Panics unless `self.cols == rhs.rows`. Large products are computed on the rayon pool,
    /// one task per block of output rows; the result is identical to the serial product.
    pub fn dot(&self, rhs: &Matrix) -> Matrix {
        assert!(
            self.cols == rhs.rows,
            "shape error: dot lhs {}x{} rhs {}x{} (lhs.cols != rhs.rows)",
            self.rows,
            self.cols,
            rhs.rows,
            rhs.cols
        );
        let mut out = Matrix::zeros(self.rows, rhs.cols);
        matmul::gemm(
            self.rows,
            rhs.cols,
            self.cols,
            &self.data,
            &rhs.data,
            &mut out.data,
        );
        out
    }

    /// Checked variant of [`Matrix::dot`].
    pub fn try_dot(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.cols != rhs.rows {
            return Err(Error::InvalidShape(format!(
                "dot lhs {}x{} rhs {}x{} (lhs.cols != rhs.rows)",
                self.rows, self.cols, rhs.rows, rhs.cols
            )));
        }
        Ok(self.dot(rhs))
    }

    pub fn transpose(&self) -> Matrix {
        let mut data = vec![0.0; self.data.len()];
        for r in 0..self.rows {
            for c in 0..self.cols {
                data[c * self.rows + r] = self.data[r * self.cols + c];
            }
        }
        Matrix {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    pub fn add(&self, rhs: &Matrix) -> Matrix {
        self.zip_with("add", rhs, |a, b| a + b)
    }

    pub fn sub(&self, rhs: &Matrix) -> Matrix {
        self.zip_with("sub", rhs, |a, b| a - b)
    }

    pub fn element_mul(&self, rhs: &Matrix) -> Matrix {
        self.zip_with("element_mul", rhs, |a, b| a * b)
    }

    /// In-place `self += rhs` for gradient accumulators.
    pub fn add_assign(&mut self, rhs: &Matrix) {
        self.assert_same_shape("add_assign", rhs);
        for (a, &b) in self.data.iter_mut().zip(&rhs.data) {
            *a += b;
        }
    }

    pub fn scalar_mul(&self, v: f64) -> Matrix {
        self.map(|x| x * v)
    }

    pub fn scalar_div(&self, v: f64) -> Matrix {
        self.map(|x| x / v)
    }

    pub fn scalar_sub(&self, v: f64) -> Matrix {
        self.map(|x| x - v)
    }

    pub fn element_exp(&self) -> Matrix {
        self.map(f64::exp)
    }

    /// Element-wise natural log. Non-positive entries become NaN / -inf.
    pub fn element_log(&self) -> Matrix {
        self.map(f64::ln)
    }

    pub fn element_square(&self) -> Matrix {
        self.map(|x| x * x)
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    /// Broadcast-add a `1 x cols` bias row to every row.
    pub fn row_add(&self, bias: &Matrix) -> Matrix {
        assert!(
            bias.rows == 1 && bias.cols == self.cols,
            "shape error: row_add lhs {}x{} bias {}x{} (bias must be 1x{})",
            self.rows,
            self.cols,
            bias.rows,
            bias.cols,
            self.cols
        );
        let mut out = self.clone();
        for row in out.data.chunks_mut(self.cols.max(1)) {
            for (x, &b) in row.iter_mut().zip(&bias.data) {
                *x += b;
            }
        }
        out
    }

    /// Sum of each row, as a `rows x 1` column.
    pub fn row_sum(&self) -> Matrix {
        let data = self.iter_rows().map(|r| r.iter().sum()).collect();
        Matrix {
            rows: self.rows,
            cols: 1,
            data,
        }
    }

    /// Sum of each column, as a `1 x cols` row.
    pub fn col_sum(&self) -> Matrix {
        let mut data = vec![0.0; self.cols];
        for row in self.iter_rows() {
            for (s, &x) in data.iter_mut().zip(row) {
                *s += x;
            }
        }
        Matrix {
            rows: 1,
            cols: self.cols,
            data,
        }
    }

    /// Maximum of each row, as a `rows x 1` column.
    ///
    /// Panics on a matrix with zero columns.
    pub fn row_max(&self) -> Matrix {
        assert!(self.cols > 0, "shape error: row_max on {}x0", self.rows);
        let data = self
            .iter_rows()
            .map(|r| r.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .collect();
        Matrix {
            rows: self.rows,
            cols: 1,
            data,
        }
    }

    /// Divide every entry of row `r` by `divisors[r]`.
    ///
    /// `divisors` must be a `rows x 1` column.
    pub fn col_div(&self, divisors: &Matrix) -> Matrix {
        self.broadcast_col("col_div", divisors, |x, d| x / d)
    }

    /// Subtract `values[r]` from every entry of row `r`.
    ///
    /// `values` must be a `rows x 1` column.
    pub fn col_sub(&self, values: &Matrix) -> Matrix {
        self.broadcast_col("col_sub", values, |x, v| x - v)
    }

    /// Per-row index of the maximum element.
    ///
    /// Ties go to the lowest column index.
    pub fn arg_max(&self) -> Vec<usize> {
        assert!(self.cols > 0, "shape error: arg_max on {}x0", self.rows);
        self.iter_rows().map(arg_max_slice).collect()
    }

    /// Insert a leading column of ones (the bias trick).
    pub fn add_bias(&self) -> Matrix {
        let cols = self.cols + 1;
        let mut data = Vec::with_capacity(self.rows * cols);
        for row in self.iter_rows() {
            data.push(1.0);
            data.extend_from_slice(row);
        }
        Matrix {
            rows: self.rows,
            cols,
            data,
        }
    }

    /// Strip the leading column.
    pub fn remove_bias(&self) -> Matrix {
        assert!(self.cols > 0, "shape error: remove_bias on {}x0", self.rows);
        let cols = self.cols - 1;
        let mut data = Vec::with_capacity(self.rows * cols);
        for row in self.iter_rows() {
            data.extend_from_slice(&row[1..]);
        }
        Matrix {
            rows: self.rows,
            cols,
            data,
        }
    }

    /// For each row `r`, the entry at column `classes[r]`, as a `rows x 1` column.
    pub fn row_finder(&self, classes: &[usize]) -> Matrix {
        assert_eq!(
            classes.len(),
            self.rows,
            "shape error: row_finder got {} class indices for {} rows",
            classes.len(),
            self.rows
        );
        let data = classes
            .iter()
            .enumerate()
            .map(|(r, &c)| self.at(r, c))
            .collect();
        Matrix {
            rows: self.rows,
            cols: 1,
            data,
        }
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Exact equality (shape and every entry).
    pub fn equals(&self, other: &Matrix) -> bool {
        self == other
    }

    /// Shape equality and every entry within `eps`.
    pub fn approx_eq(&self, other: &Matrix, eps: f64) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| (a - b).abs() <= eps)
    }

    fn zip_with(&self, op: &str, rhs: &Matrix, f: impl Fn(f64, f64) -> f64) -> Matrix {
        self.assert_same_shape(op, rhs);
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(&rhs.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    fn broadcast_col(&self, op: &str, col: &Matrix, f: impl Fn(f64, f64) -> f64) -> Matrix {
        assert!(
            col.cols == 1 && col.rows == self.rows,
            "shape error: {op} lhs {}x{} rhs {}x{} (rhs must be {}x1)",
            self.rows,
            self.cols,
            col.rows,
            col.cols,
            self.rows
        );
        let mut out = self.clone();
        for r in 0..self.rows {
            let v = col.data[r];
            for x in &mut out.data[r * self.cols..(r + 1) * self.cols] {
                *x = f(*x, v);
            }
        }
        out
    }

    fn assert_same_shape(&self, op: &str, rhs: &Matrix) {
        assert!(
            self.shape() == rhs.shape(),
            "shape error: {op} lhs {}x{} rhs {}x{} (shapes must match)",
            self.rows,
            self.cols,
            rhs.rows,
            rhs.cols
        );
    }
}

/// Index of the first maximal element.
#[inline]
pub(crate) fn arg_max_slice(xs: &[f64]) -> usize {
    let mut best = 0;
    for (i, &x) in xs.iter().enumerate().skip(1) {
        if x > xs[best] {
            best = i;
        }
    }
    best
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {} x {} ---", self.rows, self.cols)?;
        for row in self.iter_rows() {
            write!(f, "[")?;
            for (i, x) in row.iter().enumerate() {
                if i > 0 {
                    write!(f, "\t")?;
                }
                write!(f, "{x:.3}")?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}
