use crate::{math::matrix::Matrix, layers::dense::Dense};

#[derive(Debug, Clone, Copy)]
pub struct Sgd {
    pub learning_rate: f32,
}

impl Sgd {
    pub fn new(learning_rate: f32) -> Sgd {
        Sgd { learning_rate }
    }

    /// Applies one SGD weight update to a layer given its pre-computed gradients.
    pub fn step(&self, layer: &mut Dense, weights_grad: Matrix, biases_grad: Matrix) {
        layer.apply_gradients(weights_grad, biases_grad, self.learning_rate);
    }
}
