//! The uniform train/predict contract shared by every model in this crate.
//!
//! Drivers hold a `Box<dyn Classifier>` (or a generic `C: Classifier`) and can swap the
//! neural network, nearest neighbour, and linear models without changing their loop.

use crate::{Dataset, Error, Matrix, Result};

pub trait Classifier {
    /// Fit the model to `data` (features + one-hot labels).
    fn train(&mut self, data: &Dataset) -> Result<()>;

    /// Predicted class index for a single feature row.
    fn predict(&self, input: &[f64]) -> Result<usize>;

    /// Predicted class index for every row of `inputs`.
    fn predict_all(&self, inputs: &Matrix) -> Result<Vec<usize>> {
        inputs.iter_rows().map(|row| self.predict(row)).collect()
    }
}

/// Fraction of positions where `predicted` and `actual` agree.
///
/// Returns `0.0` for empty input.
pub fn accuracy(predicted: &[usize], actual: &[usize]) -> f64 {
    assert_eq!(
        predicted.len(),
        actual.len(),
        "predicted len {} does not match actual len {}",
        predicted.len(),
        actual.len()
    );
    if actual.is_empty() {
        return 0.0;
    }
    let hits = predicted.iter().zip(actual).filter(|(p, a)| p == a).count();
    hits as f64 / actual.len() as f64
}

/// Accuracy of `model` over `data`.
pub fn evaluate<C: Classifier + ?Sized>(model: &C, data: &Dataset) -> Result<f64> {
    if data.is_empty() {
        return Err(Error::InvalidData("dataset must not be empty".to_owned()));
    }
    let actual = data.try_classes()?;
    let predicted = model.predict_all(data.features())?;
    Ok(accuracy(&predicted, &actual))
}
