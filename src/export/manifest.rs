use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::export::signature::Signature;

/// Bumped whenever the on-disk layout changes incompatibly.
pub const FORMAT_VERSION: u32 = 1;

/// One layer of the exported graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerDef {
    pub name: String,
    pub input_dim: usize,
    pub units: usize,
    pub use_bias: bool,
}

/// Graph description: the layers in evaluation order and the names of the
/// graph nodes signatures bind to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDef {
    pub layers: Vec<LayerDef>,
    pub nodes: Vec<String>,
}

/// Contents of `saved_model.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub tags: Vec<String>,
    pub graph: GraphDef,
    pub signatures: BTreeMap<String, Signature>,
}

impl Manifest {
    pub fn has_tags(&self, requested: &[&str]) -> bool {
        requested.iter().all(|t| self.tags.iter().any(|have| have == t))
    }
}
