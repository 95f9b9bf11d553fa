use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Dense row-major f32 array with an explicit shape.
///
/// Batches fed to the model are rank-3 `[batch, 1, 1]`; layers treat the
/// last axis as the feature axis and every leading axis as batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Tensor> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::ShapeMismatch {
                expected: shape,
                got: vec![data.len()],
            });
        }
        Ok(Tensor { shape, data })
    }

    /// Stacks scalar samples into a `[n, 1, 1]` tensor.
    pub fn from_samples(samples: &[f32]) -> Tensor {
        Tensor {
            shape: vec![samples.len(), 1, 1],
            data: samples.to_vec(),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Size of the leading (batch) axis; 1 for a rank-0 tensor.
    pub fn batch_size(&self) -> usize {
        self.shape.first().copied().unwrap_or(1)
    }

    /// Flattens every leading axis, keeping the last one as columns.
    pub fn to_matrix(&self) -> Matrix {
        let cols = self.shape.last().copied().unwrap_or(1);
        let rows = if cols == 0 { 0 } else { self.data.len() / cols };
        Matrix::from_flat(rows, cols, &self.data)
    }

    /// Rebuilds a tensor from a matrix, replacing the last axis of `like`
    /// with the matrix's column count.
    pub fn from_matrix(m: &Matrix, like: &[usize]) -> Tensor {
        let mut shape = like.to_vec();
        match shape.last_mut() {
            Some(last) => *last = m.cols,
            None => shape.push(m.cols),
        }
        Tensor { shape, data: m.to_flat() }
    }

    /// Selects samples along the batch axis, in the given order.
    pub fn select(&self, indices: &[usize]) -> Tensor {
        let stride: usize = self.shape.iter().skip(1).product();
        let mut data = Vec::with_capacity(indices.len() * stride);
        for &i in indices {
            data.extend_from_slice(&self.data[i * stride..(i + 1) * stride]);
        }
        let mut shape = self.shape.clone();
        if let Some(first) = shape.first_mut() {
            *first = indices.len();
        }
        Tensor { shape, data }
    }
}
