//! Small classifiers built on a dense `f64` matrix.
//!
//! `rust-classifier` is a from-scratch toolkit for experimenting with classic classifiers:
//! a two-layer feed-forward network trained with softmax cross-entropy, a brute-force
//! nearest-neighbour baseline and a linear softmax model. All of them work on the same
//! row-major [`Matrix`] and implement the [`Classifier`] trait, so a driver can swap one for
//! another without touching its loop.
//!
//! # Design goals
//!
//! - Readable maths: every operation returns a new matrix; nothing is hidden behind views.
//! - Reproducible training: all randomness flows from a seedable [`rand::rngs::StdRng`].
//! - Parallel where it is free: large products and per-batch gradients run on the rayon pool
//!   and produce the same numbers as the serial code.
//!
//! # Panics vs `Result`
//!
//! The crate exposes two layers of API:
//!
//! - Low-level [`Matrix`] operations panic on misuse. A shape mismatch is a programmer error
//!   and fails via `assert!` with a message naming both shapes (`shape error: ...`).
//!   [`Matrix::try_dot`] is the checked counterpart.
//!
//! - High-level APIs validate their inputs and return [`Result`]:
//!   - [`Dataset`] constructors
//!   - [`NeuralNet::fit`], [`NeuralNet::evaluate`] and every [`Classifier`] method
//!   - JSON loading (feature `serde`)
//!
//! # Data layout and shapes
//!
//! - Scalars are `f64`.
//! - A [`Dataset`] pairs features `X (N x D)` with one-hot labels `Y (N x K)`.
//! - Network weights are `W1 (D x H)`, `W2 (H x K)`; biases are single rows broadcast over
//!   the batch.
//!
//! # Logging
//!
//! The library never prints. Progress goes through the [`log`] facade; install any logger
//! in the binary to see it.

//! # Quick start
//!
//! ```rust
//! use rust_classifier::{Classifier, Dataset, NeuralNet, TrainConfig};
//!
//! # fn main() -> rust_classifier::Result<()> {
//! let xs = vec![vec![0.0, 1.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 0.0]];
//! let ys = vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 1.0]];
//! let train = Dataset::from_rows(&xs, &ys)?;
//!
//! let mut net = NeuralNet::new(TrainConfig {
//!     epochs: 300,
//!     hidden: 8,
//!     init_scale: 0.1,
//!     seed: Some(0),
//!     ..TrainConfig::default()
//! });
//! let report = net.fit(&train, None)?;
//! assert!(report.train_loss.is_finite());
//!
//! let class = net.predict(&[1.0, 0.0])?;
//! assert!(class < 2);
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod classifier;
pub mod data;
pub mod error;
pub mod knn;
pub mod linear;
pub mod loss;
pub(crate) mod matmul;
pub mod matrix;
pub mod network;
pub mod normalise;

#[cfg(feature = "serde")]
pub mod serde_model;

pub use activation::Activation;
pub use classifier::{Classifier, accuracy, evaluate};
pub use data::Dataset;
pub use error::{Error, Result};
pub use knn::{Distance, NearestNeighbour};
pub use linear::{LinearConfig, SoftmaxClassifier};
pub use matrix::Matrix;
pub use network::{EpochReport, NeuralNet, Params, TrainConfig, TrainReport};
pub use normalise::{Normaliser, Pattern};
