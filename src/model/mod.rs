pub mod linear;

pub use linear::{LinearModel, DENSE_LAYER_NAME};
