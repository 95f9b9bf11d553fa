use ferrite_linear::{
    fit, save, serving_input_spec, LinearModel, Sgd, Tensor, TrainConfig, EPOCHS, EXPORT_DIR,
    LEARNING_RATE, SERVING_SIGNATURE,
};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut model = LinearModel::new();
    let optimizer = Sgd::new(LEARNING_RATE);

    let x_train = Tensor::from_samples(&[1.0, 2.0, 3.0, 4.0]);
    let y_train = Tensor::from_samples(&[1.0, 2.0, 3.0, 4.0]);

    fit(&mut model, &x_train, &y_train, &optimizer, &TrainConfig::new(EPOCHS))?;

    save(&model, EXPORT_DIR, &[(SERVING_SIGNATURE, serving_input_spec())])?;

    println!("Model saved in the SavedModel format.");
    Ok(())
}
