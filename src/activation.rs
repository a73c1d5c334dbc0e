//! Activation functions.
//!
//! A dense layer computes a pre-activation `z = x W + b` and then applies an activation
//! element-wise: `a = activation(z)`.
//!
//! The network caches the *pre-activation* `z` for each batch. During backprop the gradient
//! `dL/da` is turned into `dL/dz` by gating it with the derivative evaluated at `z`.

use crate::Matrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Element-wise activation for the hidden layer.
pub enum Activation {
    #[default]
    ReLU,
    Sigmoid,
}

impl Activation {
    /// `a = activation(z)`.
    pub fn forward(self, z: &Matrix) -> Matrix {
        match self {
            Activation::ReLU => relu(z),
            Activation::Sigmoid => sigmoid(z),
        }
    }

    /// Turn `dL/da` into `dL/dz`, given the cached pre-activation `z`.
    ///
    /// Consumes `d_out` so the ReLU case can gate it in place.
    pub fn backward(self, mut d_out: Matrix, z: &Matrix) -> Matrix {
        match self {
            Activation::ReLU => {
                relu_backprop(&mut d_out, z);
                d_out
            }
            Activation::Sigmoid => d_out.element_mul(&sigmoid_prime(z)),
        }
    }
}

/// Element-wise `1 / (1 + exp(-z))`.
pub fn sigmoid(z: &Matrix) -> Matrix {
    z.map(sigmoid_scalar)
}

/// Element-wise `sigmoid(z) * (1 - sigmoid(z))`.
pub fn sigmoid_prime(z: &Matrix) -> Matrix {
    z.map(|x| {
        let s = sigmoid_scalar(x);
        s * (1.0 - s)
    })
}

/// Element-wise `max(0, z)`.
pub fn relu(z: &Matrix) -> Matrix {
    z.map(|x| x.max(0.0))
}

/// Zero every entry of `d_out` whose pre-activation is negative.
///
/// Mutates `d_out` in place; it must be a buffer private to the caller.
pub fn relu_backprop(d_out: &mut Matrix, pre_activation: &Matrix) {
    assert!(
        d_out.shape() == pre_activation.shape(),
        "shape error: relu_backprop grad {:?} pre-activation {:?}",
        d_out.shape(),
        pre_activation.shape()
    );
    for (g, &z) in d_out.data_mut().iter_mut().zip(pre_activation.data()) {
        if z < 0.0 {
            *g = 0.0;
        }
    }
}

#[inline]
fn sigmoid_scalar(x: f64) -> f64 {
    // Numerically stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}
