//! Paired feature/label storage.
//!
//! A [`Dataset`] holds a feature matrix `X (N x D)` and a label matrix `Y (N x K)` whose rows
//! are aligned: row `i` of `X` is labelled by row `i` of `Y`. Every operation that reorders or
//! splits rows does it to both matrices with the same indices, so the pairing survives.

use rand::Rng;

use crate::{Error, Matrix, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Matrix,
    labels: Matrix,
}

impl Dataset {
    /// Pair a feature matrix with a label matrix.
    ///
    /// Returns an error if the row counts differ.
    pub fn from_matrices(features: Matrix, labels: Matrix) -> Result<Self> {
        if features.rows() != labels.rows() {
            return Err(Error::InvalidData(format!(
                "features/labels row count mismatch: {} vs {}",
                features.rows(),
                labels.rows()
            )));
        }
        Ok(Self { features, labels })
    }

    /// Build a dataset from per-sample rows.
    ///
    /// This is a convenience constructor (it copies into contiguous storage).
    pub fn from_rows(features: &[Vec<f64>], labels: &[Vec<f64>]) -> Result<Self> {
        if features.len() != labels.len() {
            return Err(Error::InvalidData(format!(
                "features/labels length mismatch: {} vs {}",
                features.len(),
                labels.len()
            )));
        }
        let features = Matrix::from_rows(features)
            .map_err(|e| Error::InvalidData(format!("features: {e}")))?;
        let labels =
            Matrix::from_rows(labels).map_err(|e| Error::InvalidData(format!("labels: {e}")))?;
        Self::from_matrices(features, labels)
    }

    #[inline]
    /// Returns the number of examples.
    pub fn len(&self) -> usize {
        self.features.rows()
    }

    #[inline]
    /// Returns true if there are no examples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    /// Returns the feature dimension `D`.
    pub fn input_dim(&self) -> usize {
        self.features.cols()
    }

    #[inline]
    /// Returns the label width `K`.
    pub fn target_dim(&self) -> usize {
        self.labels.cols()
    }

    #[inline]
    pub fn features(&self) -> &Matrix {
        &self.features
    }

    #[inline]
    pub fn labels(&self) -> &Matrix {
        &self.labels
    }

    #[inline]
    /// Returns the `idx`-th feature row.
    ///
    /// Panics if `idx >= len`.
    pub fn input(&self, idx: usize) -> &[f64] {
        self.features.row(idx)
    }

    #[inline]
    /// Returns the `idx`-th label row.
    ///
    /// Panics if `idx >= len`.
    pub fn target(&self, idx: usize) -> &[f64] {
        self.labels.row(idx)
    }

    /// True class index per example (see [`label_class`]).
    ///
    /// Panics if a label row encodes no class; see [`Dataset::try_classes`].
    pub fn classes(&self) -> Vec<usize> {
        self.try_classes().unwrap_or_else(|e| panic!("{e}"))
    }

    /// Checked variant of [`Dataset::classes`].
    pub fn try_classes(&self) -> Result<Vec<usize>> {
        self.labels
            .iter_rows()
            .enumerate()
            .map(|(r, row)| {
                label_class(row).map_err(|e| match e {
                    Error::InvalidData(msg) => Error::InvalidData(format!("label row {r}: {msg}")),
                    other => other,
                })
            })
            .collect()
    }

    /// Fisher–Yates shuffle of the rows, applied to features and labels with the same swaps.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for i in (1..self.len()).rev() {
            let j = rng.gen_range(0..=i);
            self.features.swap_rows(i, j);
            self.labels.swap_rows(i, j);
        }
    }

    /// Split the rows, in their current order, into `n` near-equal contiguous groups.
    ///
    /// Group `b` holds rows `b * len / n .. (b + 1) * len / n`. Empty groups (when
    /// `n > len`) are dropped, so the result may hold fewer than `n` batches.
    pub fn partition(&self, n: usize) -> Result<Vec<Dataset>> {
        if n == 0 {
            return Err(Error::InvalidConfig("number of batches must be > 0".to_owned()));
        }
        let len = self.len();
        let batches = (0..n)
            .map(|b| (b * len / n, (b + 1) * len / n))
            .filter(|(start, end)| end > start)
            .map(|(start, end)| Dataset {
                features: self.features.rows_range(start, end),
                labels: self.labels.rows_range(start, end),
            })
            .collect();
        Ok(batches)
    }

    /// Shuffled copy of the dataset split into `n` batches (see [`Dataset::partition`]).
    pub fn batches<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<Dataset>> {
        let mut shuffled = self.clone();
        shuffled.shuffle(rng);
        shuffled.partition(n)
    }

    /// Split into a leading training part and a trailing validation part.
    ///
    /// The validation part holds `floor(len / 2)` rows; training keeps the rest.
    pub fn split_validation(&self) -> (Dataset, Dataset) {
        let len = self.len();
        let cut = len - len / 2;
        let head = Dataset {
            features: self.features.rows_range(0, cut),
            labels: self.labels.rows_range(0, cut),
        };
        let tail = Dataset {
            features: self.features.rows_range(cut, len),
            labels: self.labels.rows_range(cut, len),
        };
        (head, tail)
    }
}

/// Class encoded by one label row.
///
/// A width-1 row holds a scalar class id (a non-negative integer value). A wider row is
/// one-hot and its class is the first entry `> 0`.
pub fn label_class(row: &[f64]) -> Result<usize> {
    match row {
        [v] if *v >= 0.0 && v.fract() == 0.0 => Ok(*v as usize),
        [v] => Err(Error::InvalidData(format!("scalar label {v} is not a class index"))),
        _ => row
            .iter()
            .position(|&v| v > 0.0)
            .ok_or_else(|| Error::InvalidData(format!("no positive entry in {row:?}"))),
    }
}
