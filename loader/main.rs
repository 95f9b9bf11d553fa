// Loads the exported model, lists its graph nodes and runs one inference
// through the serving signature.
use ferrite_linear::{load, Tensor, EXPORT_DIR, SERVING_SIGNATURE};
use ferrite_linear::export::SERVE_TAG;
use log::info;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let bundle = load(EXPORT_DIR, &[SERVE_TAG])?;

    for node in bundle.node_names() {
        println!("Node name: {node}");
    }

    let batch = Tensor::from_samples(&[1.0, 2.0, 3.0]);
    let output = bundle.call(SERVING_SIGNATURE, &batch)?;
    info!("output shape {:?}", output.shape());

    println!("Model output: {:?}", output.data());
    Ok(())
}
