pub mod error;
pub mod math;
pub mod layers;
pub mod model;
pub mod loss;
pub mod optim;
pub mod train;
pub mod export;

// Convenience re-exports
pub use error::{Error, Result};
pub use math::{matrix::Matrix, tensor::Tensor};
pub use layers::dense::Dense;
pub use model::linear::LinearModel;
pub use loss::mse::MseLoss;
pub use optim::sgd::Sgd;
pub use train::{fit, History, TrainConfig};
pub use export::{load, save, DType, LoadedModel, TensorSpec};

/// Where both binaries read and write the exported model, relative to the
/// working directory.
pub const EXPORT_DIR: &str = "saved_model/linear_model";

/// Name of the exported inference entry point.
pub const SERVING_SIGNATURE: &str = "serving_default";

pub const LEARNING_RATE: f32 = 0.01;

/// Demo default, not a tuned value.
pub const EPOCHS: usize = 10;

/// Signature input contract: any batch of 1×1 feature tensors.
pub fn serving_input_spec() -> TensorSpec {
    TensorSpec::new(vec![None, Some(1), Some(1)], DType::Float32)
}
