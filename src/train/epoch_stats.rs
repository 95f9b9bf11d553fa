use serde::{Serialize, Deserialize};

/// Per-epoch training statistics emitted by `fit`.
///
/// When a `progress_tx` channel is configured in `TrainConfig`, the training
/// loop sends one `EpochStats` value at the end of every completed epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Mean training loss over all samples in this epoch.
    pub loss: f32,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}

/// Everything `fit` recorded, one entry per completed epoch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    pub epochs: Vec<EpochStats>,
}

impl History {
    pub fn losses(&self) -> Vec<f32> {
        self.epochs.iter().map(|s| s.loss).collect()
    }
}
