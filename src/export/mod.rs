pub mod manifest;
pub mod saved_model;
pub mod signature;

pub use saved_model::{load, save, LoadedModel, SERVE_TAG};
pub use signature::{DType, Signature, TensorSpec};
