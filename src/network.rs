//! Two-layer feed-forward network trained with softmax cross-entropy.
//!
//! Architecture: `input (D) -> hidden (H, ReLU or sigmoid) -> scores (K)`, with explicit bias
//! rows broadcast by [`Matrix::row_add`]:
//!
//! ```text
//! z1     = X W1 + b1        (N x H)
//! a1     = act(z1)
//! scores = a1 W2 + b2       (N x K)
//! ```
//!
//! Training runs `epochs` rounds. Each round shuffles the examples (features and labels
//! together), partitions them into `batches` groups, computes every batch's gradient against
//! the same parameter snapshot, sums the gradients in batch order and applies one SGD step.
//! L2 regularisation is added to the weight gradients only, never to the biases.
//!
//! Batch gradients are independent, so with `parallel` enabled they run on the rayon pool.
//! Each task only reads `&Params`; the sum happens afterwards on the calling thread, in batch
//! order, so parallel and serial training agree.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::classifier::{Classifier, accuracy};
use crate::loss::{class_indices, softmax_cross_entropy_loss, softmax_gradient};
use crate::matrix::arg_max_slice;
use crate::{Activation, Dataset, Error, Matrix, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
/// Hyperparameters for [`NeuralNet::fit`].
pub struct TrainConfig {
    /// Number of passes over the training set. Must be > 0.
    pub epochs: usize,
    /// Number of groups each epoch is partitioned into. Must be > 0; empty groups are skipped.
    pub batches: usize,
    /// Hidden layer width `H`. Must be > 0.
    pub hidden: usize,
    pub learning_rate: f64,
    /// L2 regularisation strength.
    pub lambda: f64,
    /// Standard deviation of the Gaussian used to initialise all parameters.
    pub init_scale: f64,
    pub hidden_activation: Activation,
    /// Seed for initialisation and shuffling. `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Evaluate and log loss/accuracy every `log_every` epochs. `0` disables it.
    pub log_every: usize,
    /// Compute batch gradients on the rayon pool.
    pub parallel: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            batches: 1,
            hidden: 50,
            learning_rate: 0.5,
            lambda: 1e-3,
            init_scale: 0.01,
            hidden_activation: Activation::ReLU,
            seed: None,
            log_every: 10,
            parallel: true,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be > 0".to_owned()));
        }
        if self.batches == 0 {
            return Err(Error::InvalidConfig("batches must be > 0".to_owned()));
        }
        if self.hidden == 0 {
            return Err(Error::InvalidConfig("hidden must be > 0".to_owned()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig("learning_rate must be finite and > 0".to_owned()));
        }
        if !(self.lambda.is_finite() && self.lambda >= 0.0) {
            return Err(Error::InvalidConfig("lambda must be finite and >= 0".to_owned()));
        }
        if !(self.init_scale.is_finite() && self.init_scale > 0.0) {
            return Err(Error::InvalidConfig("init_scale must be finite and > 0".to_owned()));
        }
        Ok(())
    }
}

/// Weights and biases of the two dense layers.
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    /// `D x H`.
    pub w1: Matrix,
    /// `1 x H`.
    pub b1: Matrix,
    /// `H x K`.
    pub w2: Matrix,
    /// `1 x K`.
    pub b2: Matrix,
}

impl Params {
    /// Gaussian initialisation with standard deviation `scale`.
    pub fn random<R: Rng + ?Sized>(
        input_dim: usize,
        hidden: usize,
        output_dim: usize,
        scale: f64,
        rng: &mut R,
    ) -> Self {
        Self {
            w1: Matrix::random_normal(input_dim, hidden, scale, rng),
            b1: Matrix::random_normal(1, hidden, scale, rng),
            w2: Matrix::random_normal(hidden, output_dim, scale, rng),
            b2: Matrix::random_normal(1, output_dim, scale, rng),
        }
    }

    /// Validate that the four matrices describe one `D -> H -> K` network.
    pub fn validate(&self) -> Result<()> {
        let (d, h) = self.w1.shape();
        let k = self.w2.cols();
        if d == 0 || h == 0 || k == 0 {
            return Err(Error::InvalidShape(format!(
                "layer dims must be > 0, got D={d} H={h} K={k}"
            )));
        }
        if self.b1.shape() != (1, h) {
            return Err(Error::InvalidShape(format!(
                "b1 is {:?}, expected (1, {h})",
                self.b1.shape()
            )));
        }
        if self.w2.rows() != h {
            return Err(Error::InvalidShape(format!(
                "w2 has {} rows, expected hidden width {h}",
                self.w2.rows()
            )));
        }
        if self.b2.shape() != (1, k) {
            return Err(Error::InvalidShape(format!(
                "b2 is {:?}, expected (1, {k})",
                self.b2.shape()
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.w1.rows()
    }

    #[inline]
    pub fn hidden(&self) -> usize {
        self.w1.cols()
    }

    #[inline]
    pub fn output_dim(&self) -> usize {
        self.w2.cols()
    }

    fn zeros_like(&self) -> Self {
        Self {
            w1: Matrix::zeros(self.w1.rows(), self.w1.cols()),
            b1: Matrix::zeros(1, self.b1.cols()),
            w2: Matrix::zeros(self.w2.rows(), self.w2.cols()),
            b2: Matrix::zeros(1, self.b2.cols()),
        }
    }

    fn add_assign(&mut self, other: &Params) {
        self.w1.add_assign(&other.w1);
        self.b1.add_assign(&other.b1);
        self.w2.add_assign(&other.w2);
        self.b2.add_assign(&other.b2);
    }

    /// `param -= lr * grad` for every parameter.
    fn sgd_step(&mut self, grads: &Params, lr: f64) {
        for (p, g) in [
            (&mut self.w1, &grads.w1),
            (&mut self.b1, &grads.b1),
            (&mut self.w2, &grads.w2),
            (&mut self.b2, &grads.b2),
        ] {
            for (w, &d) in p.data_mut().iter_mut().zip(g.data()) {
                *w -= lr * d;
            }
        }
    }
}

/// Cached intermediates of one forward pass.
struct Forward {
    z1: Matrix,
    a1: Matrix,
    scores: Matrix,
}

fn forward(params: &Params, activation: Activation, x: &Matrix) -> Forward {
    let z1 = x.dot(&params.w1).row_add(&params.b1);
    let a1 = activation.forward(&z1);
    let scores = a1.dot(&params.w2).row_add(&params.b2);
    Forward { z1, a1, scores }
}

/// Gradient of the regularised mean cross-entropy over `batch` w.r.t. every parameter.
pub(crate) fn gradients(
    params: &Params,
    activation: Activation,
    batch: &Dataset,
    lambda: f64,
) -> Params {
    let x = batch.features();
    let Forward { z1, a1, scores } = forward(params, activation, x);

    let d_scores = softmax_gradient(&scores, batch.labels());

    let w2 = a1
        .transpose()
        .dot(&d_scores)
        .add(&params.w2.scalar_mul(lambda));
    let b2 = d_scores.col_sum();

    let d_a1 = d_scores.dot(&params.w2.transpose());
    let d_z1 = activation.backward(d_a1, &z1);

    let w1 = x.transpose().dot(&d_z1).add(&params.w1.scalar_mul(lambda));
    let b1 = d_z1.col_sum();

    Params { w1, b1, w2, b2 }
}

/// Regularised mean cross-entropy and accuracy of `params` over `data`.
pub(crate) fn loss_and_accuracy(
    params: &Params,
    activation: Activation,
    data: &Dataset,
    lambda: f64,
) -> (f64, f64) {
    let scores = forward(params, activation, data.features()).scores;
    let classes = class_indices(data.labels());
    let loss = softmax_cross_entropy_loss(&scores, &classes, &[&params.w1, &params.w2], lambda);
    (loss, accuracy(&scores.arg_max(), &classes))
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Observations taken at one logged epoch.
pub struct EpochReport {
    /// 1-based epoch number.
    pub epoch: usize,
    pub train_loss: f64,
    pub train_accuracy: f64,
    pub validation_loss: Option<f64>,
    pub validation_accuracy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
/// Result of [`NeuralNet::fit`].
///
/// Reported losses are the unregularised mean cross-entropy.
pub struct TrainReport {
    pub train_loss: f64,
    pub validation_loss: Option<f64>,
    /// One entry per logged epoch (see [`TrainConfig::log_every`]).
    pub epochs: Vec<EpochReport>,
}

/// A two-layer softmax classifier.
///
/// Starts untrained; [`NeuralNet::fit`] initialises fresh parameters and trains them.
/// Prediction before a successful fit is an error.
#[derive(Debug, Clone)]
pub struct NeuralNet {
    config: TrainConfig,
    params: Option<Params>,
}

impl NeuralNet {
    pub fn new(config: TrainConfig) -> Self {
        Self {
            config,
            params: None,
        }
    }

    /// Build a trained network from existing parameters (e.g. loaded from disk).
    pub fn from_params(params: Params, hidden_activation: Activation) -> Result<Self> {
        params.validate()?;
        let config = TrainConfig {
            hidden: params.hidden(),
            hidden_activation,
            ..TrainConfig::default()
        };
        Ok(Self {
            config,
            params: Some(params),
        })
    }

    #[inline]
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    #[inline]
    pub fn params(&self) -> Option<&Params> {
        self.params.as_ref()
    }

    #[inline]
    pub fn is_trained(&self) -> bool {
        self.params.is_some()
    }

    /// Train on `train`, optionally tracking loss/accuracy on `validation`.
    ///
    /// Any previous parameters are discarded. On error the network is left unchanged.
    pub fn fit(&mut self, train: &Dataset, validation: Option<&Dataset>) -> Result<TrainReport> {
        let cfg = self.config;
        cfg.validate()?;

        if train.is_empty() {
            return Err(Error::InvalidData("train dataset must not be empty".to_owned()));
        }
        if train.input_dim() == 0 || train.target_dim() < 2 {
            return Err(Error::InvalidData(format!(
                "train dataset needs features and one-hot labels (>= 2 classes), got dims ({}, {})",
                train.input_dim(),
                train.target_dim()
            )));
        }
        train.try_classes()?;
        if let Some(v) = validation {
            v.try_classes()?;
            if v.is_empty() {
                return Err(Error::InvalidData("validation dataset must not be empty".to_owned()));
            }
            if v.input_dim() != train.input_dim() || v.target_dim() != train.target_dim() {
                return Err(Error::InvalidData(format!(
                    "validation dims ({}, {}) do not match train dims ({}, {})",
                    v.input_dim(),
                    v.target_dim(),
                    train.input_dim(),
                    train.target_dim()
                )));
            }
        }

        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let act = cfg.hidden_activation;
        let mut params = Params::random(
            train.input_dim(),
            cfg.hidden,
            train.target_dim(),
            cfg.init_scale,
            &mut rng,
        );

        let mut shuffled = train.clone();
        let mut epochs = Vec::new();

        for epoch in 1..=cfg.epochs {
            shuffled.shuffle(&mut rng);
            let batches = shuffled.partition(cfg.batches)?;
            debug!(
                "epoch {epoch}: {} non-empty batches of {} requested",
                batches.len(),
                cfg.batches
            );

            let snapshot = &params;
            let batch_grads: Vec<Params> = if cfg.parallel {
                batches
                    .par_iter()
                    .map(|b| gradients(snapshot, act, b, cfg.lambda))
                    .collect()
            } else {
                batches
                    .iter()
                    .map(|b| gradients(snapshot, act, b, cfg.lambda))
                    .collect()
            };

            let mut total = params.zeros_like();
            for g in &batch_grads {
                total.add_assign(g);
            }
            params.sgd_step(&total, cfg.learning_rate);

            if cfg.log_every > 0 && epoch % cfg.log_every == 0 {
                let report = epoch_report(epoch, &params, act, train, validation);
                match (report.validation_loss, report.validation_accuracy) {
                    (Some(vl), Some(va)) => info!(
                        "epoch {epoch}: train loss {:.6} acc {:.4} | validation loss {vl:.6} acc {va:.4}",
                        report.train_loss, report.train_accuracy
                    ),
                    _ => info!(
                        "epoch {epoch}: train loss {:.6} acc {:.4}",
                        report.train_loss, report.train_accuracy
                    ),
                }
                epochs.push(report);
            }
        }

        let (train_loss, _) = loss_and_accuracy(&params, act, train, 0.0);
        let validation_loss = validation.map(|v| loss_and_accuracy(&params, act, v, 0.0).0);

        self.params = Some(params);
        Ok(TrainReport {
            train_loss,
            validation_loss,
            epochs,
        })
    }

    /// Raw class scores for one feature row.
    pub fn predict_scores(&self, input: &[f64]) -> Result<Vec<f64>> {
        let params = self.trained()?;
        if input.len() != params.input_dim() {
            return Err(Error::InvalidData(format!(
                "input len {} does not match model input_dim {}",
                input.len(),
                params.input_dim()
            )));
        }
        let x = Matrix::new(1, input.len(), input.to_vec());
        Ok(forward(params, self.config.hidden_activation, &x)
            .scores
            .into_data())
    }

    /// Unregularised mean cross-entropy and accuracy over `data`.
    pub fn evaluate(&self, data: &Dataset) -> Result<(f64, f64)> {
        let params = self.trained()?;
        if data.is_empty() {
            return Err(Error::InvalidData("dataset must not be empty".to_owned()));
        }
        if data.input_dim() != params.input_dim() || data.target_dim() != params.output_dim() {
            return Err(Error::InvalidData(format!(
                "dataset dims ({}, {}) do not match model dims ({}, {})",
                data.input_dim(),
                data.target_dim(),
                params.input_dim(),
                params.output_dim()
            )));
        }
        data.try_classes()?;
        Ok(loss_and_accuracy(
            params,
            self.config.hidden_activation,
            data,
            0.0,
        ))
    }

    fn trained(&self) -> Result<&Params> {
        self.params.as_ref().ok_or_else(|| {
            Error::NotTrained("call fit before predicting with a NeuralNet".to_owned())
        })
    }
}

fn epoch_report(
    epoch: usize,
    params: &Params,
    act: Activation,
    train: &Dataset,
    validation: Option<&Dataset>,
) -> EpochReport {
    let (train_loss, train_accuracy) = loss_and_accuracy(params, act, train, 0.0);
    let (validation_loss, validation_accuracy) = match validation {
        Some(v) => {
            let (l, a) = loss_and_accuracy(params, act, v, 0.0);
            (Some(l), Some(a))
        }
        None => (None, None),
    };
    EpochReport {
        epoch,
        train_loss,
        train_accuracy,
        validation_loss,
        validation_accuracy,
    }
}

impl Classifier for NeuralNet {
    fn train(&mut self, data: &Dataset) -> Result<()> {
        self.fit(data, None).map(|_| ())
    }

    fn predict(&self, input: &[f64]) -> Result<usize> {
        let scores = self.predict_scores(input)?;
        Ok(arg_max_slice(&scores))
    }
}
