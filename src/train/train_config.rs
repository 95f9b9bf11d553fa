use std::sync::mpsc;

use crate::train::epoch_stats::EpochStats;

/// Samples per mini-batch when the caller does not pick one.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Configuration for a `fit` run.
///
/// # Fields
/// - `epochs`      — total number of full passes over the training data
/// - `batch_size`  — samples per mini-batch; use `1` for online SGD
/// - `shuffle`     — reshuffle the sample order at the start of every epoch
/// - `seed`        — fixes the shuffle order; `None` seeds from OS entropy
/// - `progress_tx` — optional channel sender; one `EpochStats` is sent per
///                   completed epoch.  If the receiver is dropped the loop
///                   terminates early.
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub shuffle: bool,
    pub seed: Option<u64>,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
}

impl TrainConfig {
    /// Creates a `TrainConfig` with the default batch size, shuffling on,
    /// no seed and no progress channel.
    pub fn new(epochs: usize) -> Self {
        TrainConfig {
            epochs,
            batch_size: DEFAULT_BATCH_SIZE,
            shuffle: true,
            seed: None,
            progress_tx: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_progress(mut self, tx: mpsc::Sender<EpochStats>) -> Self {
        self.progress_tx = Some(tx);
        self
    }
}
