use std::time::Instant;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{Error, Result};
use crate::loss::mse::MseLoss;
use crate::math::tensor::Tensor;
use crate::model::linear::LinearModel;
use crate::optim::sgd::Sgd;
use crate::train::epoch_stats::{EpochStats, History};
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `model` against the MSE objective for `config.epochs` epochs and
/// returns the per-epoch history.
///
/// # Arguments
/// - `model`     — mutable reference to the model; modified in place
/// - `x`         — inputs, batch along axis 0, features along the last axis
/// - `y`         — targets, same batch size as `x`
/// - `optimizer` — SGD optimizer (carries learning rate)
/// - `config`    — epochs, batch size, shuffling, optional progress channel
///
/// # Early termination
/// The loop breaks early if the `progress_tx` receiver has been dropped.
///
/// # Errors
/// `InvalidConfig` for an empty dataset, zero epochs or `batch_size == 0`;
/// `ShapeMismatch` when `x` and `y` disagree on batch size or `x` does not
/// fit the model.
pub fn fit(
    model: &mut LinearModel,
    x: &Tensor,
    y: &Tensor,
    optimizer: &Sgd,
    config: &TrainConfig,
) -> Result<History> {
    let n = x.batch_size();
    if x.rank() == 0 || n == 0 {
        return Err(Error::InvalidConfig("training inputs must not be empty".into()));
    }
    if y.rank() == 0 || y.batch_size() != n {
        return Err(Error::ShapeMismatch { expected: vec![n], got: y.shape().to_vec() });
    }
    if config.epochs == 0 {
        return Err(Error::InvalidConfig("epochs must be at least 1".into()));
    }
    if config.batch_size == 0 {
        return Err(Error::InvalidConfig("batch_size must be at least 1".into()));
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut indices: Vec<usize> = (0..n).collect();
    let mut history = History::default();

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();

        if config.shuffle {
            indices.shuffle(&mut rng);
        }

        // ── One full pass over the training data ───────────────────────────
        let loss = run_one_epoch(model, x, y, &indices, optimizer, config.batch_size)?;
        let elapsed_ms = t_start.elapsed().as_millis() as u64;

        info!("Epoch {epoch}/{} - loss: {loss:.4}", config.epochs);

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            loss,
            elapsed_ms,
        };
        history.epochs.push(stats.clone());

        if let Some(ref tx) = config.progress_tx {
            // If the receiver has been dropped, stop training.
            if tx.send(stats).is_err() {
                debug!("progress receiver dropped, stopping after epoch {epoch}");
                break;
            }
        }
    }

    Ok(history)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Runs one full epoch of mini-batch SGD in the order given by `indices`.
/// Returns the mean loss over all samples.
fn run_one_epoch(
    model: &mut LinearModel,
    x: &Tensor,
    y: &Tensor,
    indices: &[usize],
    optimizer: &Sgd,
    batch_size: usize,
) -> Result<f32> {
    let n = indices.len();
    let mut total_loss = 0.0;

    for batch in indices.chunks(batch_size) {
        let xb = x.select(batch);
        let yb = y.select(batch);

        let predicted = model.forward(&xb)?.to_matrix();
        let expected = yb.to_matrix();
        if (predicted.rows, predicted.cols) != (expected.rows, expected.cols) {
            return Err(Error::ShapeMismatch {
                expected: vec![predicted.rows, predicted.cols],
                got: vec![expected.rows, expected.cols],
            });
        }

        // Batch loss is a mean; weight it by batch length for the epoch mean.
        total_loss += MseLoss::loss(&predicted, &expected) * batch.len() as f32;

        let delta = MseLoss::derivative(&predicted, &expected);
        let (w_grad, b_grad) = model.dense.compute_gradients(&xb.to_matrix(), &delta);
        optimizer.step(&mut model.dense, w_grad, b_grad);
    }

    Ok(total_loss / n as f32)
}
