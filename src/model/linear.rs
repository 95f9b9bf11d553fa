use rand::Rng;

use crate::error::Result;
use crate::layers::dense::Dense;
use crate::math::tensor::Tensor;

/// Name under which the single dense layer is stored and exported.
pub const DENSE_LAYER_NAME: &str = "dense";

/// One-neuron linear regression: a single `Dense` layer mapping 1 input
/// feature to 1 output.
#[derive(Debug, Clone)]
pub struct LinearModel {
    pub dense: Dense,
}

impl LinearModel {
    /// Builds the model with a thread-local RNG for the kernel init.
    pub fn new() -> LinearModel {
        LinearModel::with_rng(&mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(rng: &mut R) -> LinearModel {
        LinearModel { dense: Dense::new(DENSE_LAYER_NAME, 1, 1, rng) }
    }

    pub fn from_dense(dense: Dense) -> LinearModel {
        LinearModel { dense }
    }

    pub fn forward(&self, input: &Tensor) -> Result<Tensor> {
        self.dense.forward(input)
    }

    pub fn weight(&self) -> f32 {
        self.dense.weights.data[0][0]
    }

    pub fn bias(&self) -> f32 {
        self.dense.biases.data[0][0]
    }
}

impl Default for LinearModel {
    fn default() -> Self {
        LinearModel::new()
    }
}
