//! Linear classifiers.
//!
//! The per-sample losses use the bias trick: the input row carries a trailing constant `1.0`
//! feature and the weight matrix `w (K x (D + 1))` holds the bias as its last column, so class
//! scores are simply `w x`.
//!
//! [`SoftmaxClassifier`] is the trainable counterpart: one linear layer with an explicit bias
//! row, fitted by full-batch gradient descent on the softmax cross-entropy.

use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::classifier::{Classifier, accuracy};
use crate::loss::{
    SVM_DELTA, softmax, softmax_cross_entropy_loss, softmax_gradient, svm_hinge_loss,
};
use crate::matrix::arg_max_slice;
use crate::{Dataset, Error, Matrix, Result};

/// Class scores `w x` for one bias-augmented input row.
fn scores(x: &[f64], w: &Matrix) -> Vec<f64> {
    assert_eq!(
        x.len(),
        w.cols(),
        "shape error: input len {} weights {}x{} (len != w.cols)",
        x.len(),
        w.rows(),
        w.cols()
    );
    w.iter_rows()
        .map(|row| row.iter().zip(x).map(|(a, b)| a * b).sum())
        .collect()
}

/// Multiclass SVM loss of one example with margin [`SVM_DELTA`].
///
/// Panics if `x.len() != w.cols()` or `y >= w.rows()`.
pub fn svm_loss(x: &[f64], y: usize, w: &Matrix) -> f64 {
    svm_hinge_loss(&scores(x, w), y, SVM_DELTA)
}

/// Softmax cross-entropy loss of one example: `-ln(softmax(w x)[y])`.
///
/// Panics if `x.len() != w.cols()` or `y >= w.rows()`.
pub fn softmax_loss(x: &[f64], y: usize, w: &Matrix) -> f64 {
    let s = scores(x, w);
    let k = s.len();
    let probs = softmax(&Matrix::new(1, k, s));
    -probs.at(0, y).ln()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearConfig {
    /// Full-batch gradient steps. Must be > 0.
    pub iterations: usize,
    pub step_size: f64,
    /// L2 regularisation strength on `W`.
    pub reg: f64,
    /// Standard deviation of the Gaussian used for `W`. The bias starts at zero.
    pub init_scale: f64,
    pub seed: Option<u64>,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            iterations: 200,
            step_size: 1.0,
            reg: 1e-3,
            init_scale: 0.01,
            seed: None,
        }
    }
}

impl LinearConfig {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(Error::InvalidConfig("iterations must be > 0".to_owned()));
        }
        if !(self.step_size.is_finite() && self.step_size > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "step_size must be finite and > 0, got {}",
                self.step_size
            )));
        }
        if !(self.reg.is_finite() && self.reg >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "reg must be finite and >= 0, got {}",
                self.reg
            )));
        }
        if !(self.init_scale.is_finite() && self.init_scale >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "init_scale must be finite and >= 0, got {}",
                self.init_scale
            )));
        }
        Ok(())
    }
}

/// Linear softmax classifier: `scores = X W + b`.
#[derive(Debug, Clone)]
pub struct SoftmaxClassifier {
    config: LinearConfig,
    weights: Option<(Matrix, Matrix)>,
}

impl SoftmaxClassifier {
    pub fn new(config: LinearConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            weights: None,
        })
    }

    #[inline]
    pub fn config(&self) -> &LinearConfig {
        &self.config
    }

    /// `(W, b)` once trained.
    pub fn weights(&self) -> Option<(&Matrix, &Matrix)> {
        self.weights.as_ref().map(|(w, b)| (w, b))
    }

    /// Regularised training loss of the current weights over `data`.
    pub fn loss(&self, data: &Dataset) -> Result<f64> {
        let (w, b) = self.trained()?;
        check_input_dim(data.input_dim(), w)?;
        let classes = data.try_classes()?;
        let scores = data.features().dot(w).row_add(b);
        Ok(softmax_cross_entropy_loss(
            &scores,
            &classes,
            &[w],
            self.config.reg,
        ))
    }

    fn trained(&self) -> Result<(&Matrix, &Matrix)> {
        self.weights().ok_or_else(|| {
            Error::NotTrained("call train before using SoftmaxClassifier".to_owned())
        })
    }
}

fn check_input_dim(dim: usize, w: &Matrix) -> Result<()> {
    if dim != w.rows() {
        return Err(Error::InvalidData(format!(
            "input dim {dim} does not match weights {}x{}",
            w.rows(),
            w.cols()
        )));
    }
    Ok(())
}

impl Classifier for SoftmaxClassifier {
    fn train(&mut self, data: &Dataset) -> Result<()> {
        if data.is_empty() {
            return Err(Error::InvalidData("train dataset must not be empty".to_owned()));
        }
        if data.target_dim() < 2 {
            return Err(Error::InvalidData(format!(
                "labels must be one-hot over at least 2 classes, got width {}",
                data.target_dim()
            )));
        }
        let cfg = self.config;
        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let x = data.features();
        let y = data.labels();
        let classes = data.try_classes()?;
        let mut w = Matrix::random_normal(
            data.input_dim(),
            data.target_dim(),
            cfg.init_scale,
            &mut rng,
        );
        let mut b = Matrix::zeros(1, data.target_dim());
        let x_t = x.transpose();
        let report_every = (cfg.iterations / 10).max(1);

        for it in 0..cfg.iterations {
            let scores = x.dot(&w).row_add(&b);
            if it % report_every == 0 {
                let loss = softmax_cross_entropy_loss(&scores, &classes, &[&w], cfg.reg);
                let acc = accuracy(&scores.arg_max(), &classes);
                info!("iteration {it}: loss {loss:.6}, accuracy {acc:.4}");
            }

            let d_scores = softmax_gradient(&scores, y);
            let d_w = x_t.dot(&d_scores).add(&w.scalar_mul(cfg.reg));
            let d_b = d_scores.col_sum();
            w = w.sub(&d_w.scalar_mul(cfg.step_size));
            b = b.sub(&d_b.scalar_mul(cfg.step_size));
        }
        debug!(
            "softmax classifier trained: {} iterations over {} rows",
            cfg.iterations,
            data.len()
        );

        self.weights = Some((w, b));
        Ok(())
    }

    fn predict(&self, input: &[f64]) -> Result<usize> {
        let (w, b) = self.trained()?;
        check_input_dim(input.len(), w)?;
        let scores = Matrix::new(1, input.len(), input.to_vec()).dot(w).row_add(b);
        Ok(arg_max_slice(scores.data()))
    }

    fn predict_all(&self, inputs: &Matrix) -> Result<Vec<usize>> {
        let (w, b) = self.trained()?;
        check_input_dim(inputs.cols(), w)?;
        Ok(inputs.dot(w).row_add(b).arg_max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::evaluate;

    fn assert_close(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "{a} != {b} (eps {eps})");
    }

    fn sample() -> ([f64; 5], Matrix) {
        let x = [-15.0, 22.0, -44.0, 56.0, 1.0];
        let w = Matrix::from_array([
            [0.01, -0.05, 0.1, 0.05, 0.0],
            [0.7, 0.2, 0.05, 0.16, 0.2],
            [0.0, -0.45, -0.2, 0.03, -0.3],
        ]);
        (x, w)
    }

    #[test]
    fn svm_loss_of_a_known_example() {
        let (x, w) = sample();
        assert_close(svm_loss(&x, 2, &w), 1.58, 1e-9);
    }

    #[test]
    fn softmax_loss_of_a_known_example() {
        let (x, w) = sample();
        assert_close(softmax_loss(&x, 0, &w), 4.170191, 1e-5);
        assert!(softmax_loss(&x, 1, &w) < softmax_loss(&x, 0, &w));
    }

    #[test]
    #[should_panic(expected = "shape error")]
    fn losses_reject_inputs_without_the_bias_feature() {
        let (x, w) = sample();
        svm_loss(&x[..4], 0, &w);
    }

    fn blobs() -> Dataset {
        let xs = vec![
            vec![2.0, 2.1],
            vec![1.8, 2.4],
            vec![2.2, 1.9],
            vec![-2.0, -1.9],
            vec![-2.3, -2.1],
            vec![-1.7, -2.2],
            vec![2.0, -2.0],
            vec![2.2, -1.8],
            vec![1.9, -2.3],
        ];
        let ys: Vec<Vec<f64>> = (0..9)
            .map(|i| {
                let mut row = vec![0.0; 3];
                row[i / 3] = 1.0;
                row
            })
            .collect();
        Dataset::from_rows(&xs, &ys).unwrap()
    }

    #[test]
    fn softmax_classifier_separates_blobs() {
        let data = blobs();
        let mut model = SoftmaxClassifier::new(LinearConfig {
            seed: Some(7),
            ..LinearConfig::default()
        })
        .unwrap();
        model.train(&data).unwrap();

        assert_eq!(evaluate(&model, &data).unwrap(), 1.0);
        assert!(model.loss(&data).unwrap() < 0.5);
        assert_eq!(model.predict(&[2.1, 2.0]).unwrap(), 0);
        assert_eq!(model.predict(&[-2.1, -2.0]).unwrap(), 1);
    }

    #[test]
    fn softmax_classifier_errors() {
        assert!(
            SoftmaxClassifier::new(LinearConfig {
                iterations: 0,
                ..LinearConfig::default()
            })
            .is_err()
        );

        let mut model = SoftmaxClassifier::new(LinearConfig {
            seed: Some(1),
            iterations: 5,
            ..LinearConfig::default()
        })
        .unwrap();
        assert!(matches!(model.predict(&[0.0, 0.0]), Err(Error::NotTrained(_))));

        model.train(&blobs()).unwrap();
        assert!(matches!(model.predict(&[0.0]), Err(Error::InvalidData(_))));

        let scalar = Dataset::from_rows(&[vec![0.0], vec![1.0]], &[vec![0.0], vec![1.0]]).unwrap();
        assert!(matches!(model.train(&scalar), Err(Error::InvalidData(_))));
    }
}
