//! Directory-based model export.
//!
//! Layout under the export directory:
//!
//! ```text
//! saved_model.json                  manifest: tags, graph, signatures
//! variables/variables.safetensors   layer parameters, F32 little-endian
//! ```
//!
//! Saving into an existing export directory overwrites both files.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::{debug, info};
use safetensors::tensor::{Dtype, TensorView};
use safetensors::SafeTensors;

use crate::error::{Error, Result};
use crate::export::manifest::{GraphDef, LayerDef, Manifest, FORMAT_VERSION};
use crate::export::signature::{Signature, TensorBinding, TensorSpec};
use crate::layers::dense::Dense;
use crate::math::{matrix::Matrix, tensor::Tensor};
use crate::model::linear::LinearModel;

pub const MANIFEST_FILENAME: &str = "saved_model.json";
pub const VARIABLES_DIR: &str = "variables";
pub const VARIABLES_FILENAME: &str = "variables.safetensors";

/// Tag attached to the exported inference graph.
pub const SERVE_TAG: &str = "serve";

/// Graph node every signature's output is read from.
const CALL_NODE: &str = "StatefulPartitionedCall";
/// Name of the single positional argument of every signature.
const INPUT_ARG: &str = "inputs";
const OUTPUT_ARG: &str = "output_0";
const MODEL_SCOPE: &str = "linear_model";

/// Exports `model` to `dir`, exposing one entry point per `(name, input spec)`.
///
/// Every spec must have the model's input dimension as its last axis; the
/// output spec is derived from it by swapping that axis for the layer width.
pub fn save(model: &LinearModel, dir: impl AsRef<Path>, signatures: &[(&str, TensorSpec)]) -> Result<()> {
    let dir = dir.as_ref();
    let dense = &model.dense;

    let mut nodes = Vec::new();
    let mut bound = BTreeMap::new();
    for (name, spec) in signatures {
        let signature = bind_signature(name, spec, dense)?;
        nodes.push(format!("{name}_{INPUT_ARG}"));
        bound.insert(name.to_string(), signature);
    }
    nodes.extend([
        format!("{}/kernel", dense.name),
        format!("{}/bias", dense.name),
        format!("{MODEL_SCOPE}/{}/MatMul", dense.name),
        format!("{MODEL_SCOPE}/{}/BiasAdd", dense.name),
        CALL_NODE.to_string(),
    ]);

    let manifest = Manifest {
        format_version: FORMAT_VERSION,
        tags: vec![SERVE_TAG.to_string()],
        graph: GraphDef {
            layers: vec![LayerDef {
                name: dense.name.clone(),
                input_dim: dense.input_dim(),
                units: dense.units(),
                use_bias: true,
            }],
            nodes,
        },
        signatures: bound,
    };

    let variables_dir = dir.join(VARIABLES_DIR);
    fs::create_dir_all(&variables_dir)?;
    write_variables(dense, &variables_dir.join(VARIABLES_FILENAME))?;

    let file = File::create(dir.join(MANIFEST_FILENAME))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &manifest)
        .map_err(|e| Error::Serialization(format!("manifest serialization failed: {e}")))?;
    writer.flush()?;

    info!("exported model to {} ({} signature(s))", dir.display(), manifest.signatures.len());
    Ok(())
}

/// Loads an export written by [`save`], selecting the graph by `tags`.
pub fn load(dir: impl AsRef<Path>, tags: &[&str]) -> Result<LoadedModel> {
    let dir = dir.as_ref();

    let file = File::open(dir.join(MANIFEST_FILENAME))?;
    let manifest: Manifest = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| Error::Serialization(format!("manifest deserialization failed: {e}")))?;

    if manifest.format_version != FORMAT_VERSION {
        return Err(Error::Serialization(format!(
            "unsupported format version {} (expected {FORMAT_VERSION})",
            manifest.format_version
        )));
    }
    if !manifest.has_tags(tags) {
        return Err(Error::TagMismatch {
            requested: tags.iter().map(|t| t.to_string()).collect(),
            available: manifest.tags.clone(),
        });
    }

    let layer = match manifest.graph.layers.as_slice() {
        [layer] => layer,
        layers => {
            return Err(Error::Serialization(format!(
                "expected exactly one layer, found {}",
                layers.len()
            )))
        }
    };

    if (layer.input_dim, layer.units) != (1, 1) {
        return Err(Error::ShapeMismatch {
            expected: vec![1, 1],
            got: vec![layer.input_dim, layer.units],
        });
    }

    let bytes = fs::read(dir.join(VARIABLES_DIR).join(VARIABLES_FILENAME))?;
    let tensors = SafeTensors::deserialize(&bytes)
        .map_err(|e| Error::Serialization(format!("variables parsing failed: {e}")))?;

    let kernel = read_f32(&tensors, &format!("{}/kernel", layer.name), &[layer.input_dim, layer.units])?;
    let bias = read_f32(&tensors, &format!("{}/bias", layer.name), &[layer.units])?;
    let dense = Dense::from_parts(
        &layer.name,
        Matrix::from_flat(layer.input_dim, layer.units, &kernel),
        Matrix::from_flat(1, layer.units, &bias),
    )?;

    info!("loaded model from {} with tags {:?}", dir.display(), manifest.tags);
    Ok(LoadedModel { manifest, model: LinearModel::from_dense(dense) })
}

/// A model restored from disk together with its exported entry points.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    manifest: Manifest,
    model: LinearModel,
}

impl LoadedModel {
    pub fn tags(&self) -> &[String] {
        &self.manifest.tags
    }

    pub fn node_names(&self) -> &[String] {
        &self.manifest.graph.nodes
    }

    pub fn signature_names(&self) -> impl Iterator<Item = &str> {
        self.manifest.signatures.keys().map(String::as_str)
    }

    pub fn signature(&self, name: &str) -> Option<&Signature> {
        self.manifest.signatures.get(name)
    }

    pub fn model(&self) -> &LinearModel {
        &self.model
    }

    /// Runs the named entry point on `input` after checking it against the
    /// signature's input spec.
    pub fn call(&self, signature: &str, input: &Tensor) -> Result<Tensor> {
        let sig = self.signature(signature)
            .ok_or_else(|| Error::SignatureNotFound(signature.to_string()))?;
        let (_, binding) = sig.input()
            .ok_or_else(|| Error::Serialization(format!("signature {signature} has no inputs")))?;
        binding.spec.check(input)?;
        debug!("calling {signature} ({}) with {:?}", binding.name, input.shape());
        self.model.forward(input)
    }
}

fn bind_signature(name: &str, spec: &TensorSpec, dense: &Dense) -> Result<Signature> {
    let trailing = spec.shape.last().copied().flatten();
    if trailing != Some(dense.input_dim()) {
        return Err(Error::ShapeMismatch {
            expected: vec![dense.input_dim()],
            got: trailing.into_iter().collect(),
        });
    }

    let mut output_shape = spec.shape.clone();
    if let Some(last) = output_shape.last_mut() {
        *last = Some(dense.units());
    }

    let inputs = BTreeMap::from([(
        INPUT_ARG.to_string(),
        TensorBinding { name: format!("{name}_{INPUT_ARG}:0"), spec: spec.clone() },
    )]);
    let outputs = BTreeMap::from([(
        OUTPUT_ARG.to_string(),
        TensorBinding {
            name: format!("{CALL_NODE}:0"),
            spec: TensorSpec::new(output_shape, spec.dtype),
        },
    )]);
    Ok(Signature { inputs, outputs })
}

fn write_variables(dense: &Dense, path: &Path) -> Result<()> {
    let kernel = to_le_bytes(&dense.weights.to_flat());
    let bias = to_le_bytes(&dense.biases.to_flat());

    let views = vec![
        (
            format!("{}/kernel", dense.name),
            TensorView::new(Dtype::F32, vec![dense.input_dim(), dense.units()], &kernel)
                .map_err(|e| Error::Serialization(format!("kernel view: {e}")))?,
        ),
        (
            format!("{}/bias", dense.name),
            TensorView::new(Dtype::F32, vec![dense.units()], &bias)
                .map_err(|e| Error::Serialization(format!("bias view: {e}")))?,
        ),
    ];

    let bytes = safetensors::serialize(views, &None::<HashMap<String, String>>)
        .map_err(|e| Error::Serialization(format!("variables serialization failed: {e}")))?;
    fs::write(path, bytes)?;
    debug!("wrote variables to {}", path.display());
    Ok(())
}

fn read_f32(tensors: &SafeTensors<'_>, name: &str, shape: &[usize]) -> Result<Vec<f32>> {
    let view = tensors.tensor(name)
        .map_err(|e| Error::Serialization(format!("missing variable {name}: {e}")))?;
    if view.dtype() != Dtype::F32 {
        return Err(Error::Serialization(format!("variable {name} is {:?}, expected F32", view.dtype())));
    }
    if view.shape() != shape {
        return Err(Error::ShapeMismatch { expected: shape.to_vec(), got: view.shape().to_vec() });
    }
    Ok(view.data()
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn to_le_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::signature::DType;
    use tempfile::TempDir;

    fn batch_spec() -> TensorSpec {
        TensorSpec::new(vec![None, Some(1), Some(1)], DType::Float32)
    }

    fn fixed_model(w: f32, b: f32) -> LinearModel {
        let dense = Dense::from_parts("dense", Matrix::from_flat(1, 1, &[w]), Matrix::from_flat(1, 1, &[b])).unwrap();
        LinearModel::from_dense(dense)
    }

    #[test]
    fn save_writes_manifest_and_variables() {
        let dir = TempDir::new().unwrap();
        save(&fixed_model(0.5, 0.25), dir.path(), &[("serving_default", batch_spec())]).unwrap();

        assert!(dir.path().join(MANIFEST_FILENAME).is_file());
        assert!(dir.path().join(VARIABLES_DIR).join(VARIABLES_FILENAME).is_file());

        let raw = fs::read_to_string(dir.path().join(MANIFEST_FILENAME)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let input = &json["signatures"]["serving_default"]["inputs"]["inputs"];
        assert_eq!(input["name"], "serving_default_inputs:0");
        assert_eq!(input["shape"], serde_json::json!([null, 1, 1]));
        assert_eq!(
            json["signatures"]["serving_default"]["outputs"]["output_0"]["name"],
            "StatefulPartitionedCall:0"
        );
    }

    #[test]
    fn load_restores_parameters() {
        let dir = TempDir::new().unwrap();
        save(&fixed_model(0.5, 0.25), dir.path(), &[("serving_default", batch_spec())]).unwrap();

        let loaded = load(dir.path(), &[SERVE_TAG]).unwrap();
        assert_eq!(loaded.model().weight(), 0.5);
        assert_eq!(loaded.model().bias(), 0.25);
        assert_eq!(loaded.signature_names().collect::<Vec<_>>(), vec!["serving_default"]);
        assert!(loaded.node_names().iter().any(|n| n == "serving_default_inputs"));
    }

    #[test]
    fn call_runs_the_restored_layer() {
        let dir = TempDir::new().unwrap();
        save(&fixed_model(2.0, 1.0), dir.path(), &[("serving_default", batch_spec())]).unwrap();
        let loaded = load(dir.path(), &[SERVE_TAG]).unwrap();

        let out = loaded.call("serving_default", &Tensor::from_samples(&[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(out.shape(), &[3, 1, 1]);
        assert_eq!(out.data(), &[3.0, 5.0, 7.0]);
    }

    #[test]
    fn call_rejects_incompatible_input() {
        let dir = TempDir::new().unwrap();
        save(&fixed_model(1.0, 0.0), dir.path(), &[("serving_default", batch_spec())]).unwrap();
        let loaded = load(dir.path(), &[SERVE_TAG]).unwrap();

        let wide = Tensor::new(vec![1, 2, 1], vec![1.0, 2.0]).unwrap();
        assert!(matches!(loaded.call("serving_default", &wide), Err(Error::ShapeMismatch { .. })));

        let missing = loaded.call("predict", &Tensor::from_samples(&[1.0]));
        assert!(matches!(missing, Err(Error::SignatureNotFound(name)) if name == "predict"));
    }

    #[test]
    fn save_rejects_spec_not_matching_layer() {
        let dir = TempDir::new().unwrap();
        let wide = TensorSpec::new(vec![None, Some(1), Some(2)], DType::Float32);
        let err = save(&fixed_model(1.0, 0.0), dir.path(), &[("serving_default", wide)]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
        assert!(!dir.path().join(MANIFEST_FILENAME).exists());
    }

    #[test]
    fn load_requires_requested_tags() {
        let dir = TempDir::new().unwrap();
        save(&fixed_model(1.0, 0.0), dir.path(), &[("serving_default", batch_spec())]).unwrap();

        match load(dir.path(), &[SERVE_TAG, "train"]) {
            Err(Error::TagMismatch { requested, available }) => {
                assert_eq!(requested, vec!["serve", "train"]);
                assert_eq!(available, vec!["serve"]);
            }
            other => panic!("expected tag mismatch, got {other:?}"),
        }
    }

    #[test]
    fn load_reports_corrupt_manifest() {
        let dir = TempDir::new().unwrap();
        save(&fixed_model(1.0, 0.0), dir.path(), &[("serving_default", batch_spec())]).unwrap();
        fs::write(dir.path().join(MANIFEST_FILENAME), "{ not json").unwrap();

        assert!(matches!(load(dir.path(), &[SERVE_TAG]), Err(Error::Serialization(_))));
    }

    #[test]
    fn load_rejects_layer_that_is_not_one_to_one() {
        let dir = TempDir::new().unwrap();
        save(&fixed_model(1.0, 0.0), dir.path(), &[("serving_default", batch_spec())]).unwrap();

        let path = dir.path().join(MANIFEST_FILENAME);
        let mut json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        json["graph"]["layers"][0]["units"] = serde_json::json!(0);
        fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();

        match load(dir.path(), &[SERVE_TAG]) {
            Err(Error::ShapeMismatch { expected, got }) => {
                assert_eq!(expected, vec![1, 1]);
                assert_eq!(got, vec![1, 0]);
            }
            other => panic!("expected shape mismatch, got {other:?}"),
        }
    }

    #[test]
    fn load_reports_corrupt_variables() {
        let dir = TempDir::new().unwrap();
        save(&fixed_model(1.0, 0.0), dir.path(), &[("serving_default", batch_spec())]).unwrap();
        fs::write(dir.path().join(VARIABLES_DIR).join(VARIABLES_FILENAME), b"garbage").unwrap();

        assert!(matches!(load(dir.path(), &[SERVE_TAG]), Err(Error::Serialization(_))));
    }

    #[test]
    fn load_rejects_stored_kernel_of_wrong_shape() {
        let dir = TempDir::new().unwrap();
        save(&fixed_model(1.0, 0.0), dir.path(), &[("serving_default", batch_spec())]).unwrap();

        let kernel = to_le_bytes(&[1.0, 2.0]);
        let bias = to_le_bytes(&[0.0]);
        let views = vec![
            ("dense/kernel".to_string(), TensorView::new(Dtype::F32, vec![2, 1], &kernel).unwrap()),
            ("dense/bias".to_string(), TensorView::new(Dtype::F32, vec![1], &bias).unwrap()),
        ];
        let bytes = safetensors::serialize(views, &None::<HashMap<String, String>>).unwrap();
        fs::write(dir.path().join(VARIABLES_DIR).join(VARIABLES_FILENAME), bytes).unwrap();

        match load(dir.path(), &[SERVE_TAG]) {
            Err(Error::ShapeMismatch { expected, got }) => {
                assert_eq!(expected, vec![1, 1]);
                assert_eq!(got, vec![2, 1]);
            }
            other => panic!("expected shape mismatch, got {other:?}"),
        }
    }

    #[test]
    fn load_of_missing_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(load(dir.path().join("absent"), &[SERVE_TAG]), Err(Error::Io(_))));
    }

    #[test]
    fn saving_twice_overwrites() {
        let dir = TempDir::new().unwrap();
        save(&fixed_model(1.0, 0.0), dir.path(), &[("serving_default", batch_spec())]).unwrap();
        save(&fixed_model(3.0, -1.0), dir.path(), &[("serving_default", batch_spec())]).unwrap();

        let loaded = load(dir.path(), &[SERVE_TAG]).unwrap();
        assert_eq!(loaded.model().weight(), 3.0);
        assert_eq!(loaded.model().bias(), -1.0);
    }
}
