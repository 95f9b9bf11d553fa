use crate::math::matrix::Matrix;

pub struct MseLoss;

impl MseLoss {
    /// Scalar MSE: mean((predicted - expected)²) over every element.
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f32 {
        let n = (predicted.rows * predicted.cols) as f32;
        predicted.data.iter().flatten().zip(expected.data.iter().flatten())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>() / n
    }

    /// Per-element gradient: 2 · (predicted - expected) / n
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Matrix {
        let n = (predicted.rows * predicted.cols) as f32;
        (predicted.clone() - expected.clone()).map(|d| 2.0 * d / n)
    }
}
