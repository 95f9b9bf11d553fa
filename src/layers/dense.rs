use rand::Rng;
use log::debug;

use crate::error::{Error, Result};
use crate::math::{matrix::Matrix, tensor::Tensor};

/// Fully-connected layer computing `y = x · W + b` over the last axis.
///
/// No activation is applied. `weights` is the (input_dim, units) kernel and
/// `biases` a single (1, units) row broadcast over the batch.
#[derive(Debug, Clone)]
pub struct Dense {
    pub name: String,
    pub weights: Matrix,
    pub biases: Matrix,
}

impl Dense {
    /// Glorot-uniform kernel, zero biases.
    pub fn new<R: Rng + ?Sized>(name: &str, input_dim: usize, units: usize, rng: &mut R) -> Dense {
        Dense {
            name: name.to_string(),
            weights: Matrix::glorot_uniform(input_dim, units, rng),
            biases: Matrix::zeros(1, units),
        }
    }

    /// Rebuilds a layer from stored parameters.
    pub fn from_parts(name: &str, weights: Matrix, biases: Matrix) -> Result<Dense> {
        if biases.rows != 1 || biases.cols != weights.cols {
            return Err(Error::ShapeMismatch {
                expected: vec![1, weights.cols],
                got: vec![biases.rows, biases.cols],
            });
        }
        Ok(Dense { name: name.to_string(), weights, biases })
    }

    pub fn input_dim(&self) -> usize {
        self.weights.rows
    }

    pub fn units(&self) -> usize {
        self.weights.cols
    }

    /// Forward pass over a batch whose last axis holds `input_dim` features.
    pub fn forward(&self, input: &Tensor) -> Result<Tensor> {
        let features = input.shape().last().copied().unwrap_or(0);
        if input.rank() == 0 || features != self.input_dim() {
            let mut expected = input.shape().to_vec();
            match expected.last_mut() {
                Some(last) => *last = self.input_dim(),
                None => expected.push(self.input_dim()),
            }
            return Err(Error::ShapeMismatch { expected, got: input.shape().to_vec() });
        }

        let x = input.to_matrix();
        let z = (x * self.weights.clone()).add_row(&self.biases);
        debug!("{}: {:?} -> {} rows x {} units", self.name, input.shape(), z.rows, z.cols);
        Ok(Tensor::from_matrix(&z, input.shape()))
    }

    /// Computes gradient adjustments. Returns (weights_grad, biases_grad).
    ///
    /// `inputs` is the flattened batch (rows, input_dim) the layer saw and
    /// `output_delta` is ∂L/∂y for the same rows.
    pub fn compute_gradients(&self, inputs: &Matrix, output_delta: &Matrix) -> (Matrix, Matrix) {
        let weights_grad = inputs.transpose() * output_delta.clone();
        let biases_grad = output_delta.sum_rows();
        (weights_grad, biases_grad)
    }

    /// Applies pre-computed gradients scaled by lr.
    pub fn apply_gradients(&mut self, weights_grad: Matrix, biases_grad: Matrix, lr: f32) {
        self.weights = self.weights.clone() - weights_grad.map(|x| x * lr);
        self.biases = self.biases.clone() - biases_grad.map(|x| x * lr);
    }
}
