use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::math::tensor::Tensor;

/// Element type of an exported tensor. Only 32-bit floats are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    Float32,
}

/// Shape and dtype contract for one signature argument.
/// `None` dimensions accept any size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorSpec {
    pub shape: Vec<Option<usize>>,
    pub dtype: DType,
}

impl TensorSpec {
    pub fn new(shape: Vec<Option<usize>>, dtype: DType) -> TensorSpec {
        TensorSpec { shape, dtype }
    }

    pub fn is_compatible_with(&self, shape: &[usize]) -> bool {
        self.shape.len() == shape.len()
            && self.shape.iter().zip(shape).all(|(spec, got)| spec.map_or(true, |d| d == *got))
    }

    /// Fails with `ShapeMismatch` unless `tensor` fits this spec. Unknown
    /// dimensions are reported as the tensor's own size.
    pub fn check(&self, tensor: &Tensor) -> Result<()> {
        if self.is_compatible_with(tensor.shape()) {
            return Ok(());
        }
        let expected = self.shape.iter().enumerate()
            .map(|(i, d)| d.unwrap_or_else(|| tensor.shape().get(i).copied().unwrap_or(0)))
            .collect();
        Err(Error::ShapeMismatch { expected, got: tensor.shape().to_vec() })
    }
}

/// One input or output of a signature, bound to a graph tensor name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorBinding {
    pub name: String,
    #[serde(flatten)]
    pub spec: TensorSpec,
}

/// A named, shape-typed inference entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub inputs: BTreeMap<String, TensorBinding>,
    pub outputs: BTreeMap<String, TensorBinding>,
}

impl Signature {
    /// The sole input binding. Exported signatures always have exactly one.
    pub fn input(&self) -> Option<(&String, &TensorBinding)> {
        self.inputs.iter().next()
    }
}
