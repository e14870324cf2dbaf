//! Checkpoint metadata written next to every checkpoint.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Training progress at the time a checkpoint was taken.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CheckpointMetadata {
    /// Epoch in which the checkpoint was taken (0-indexed)
    pub epoch: usize,
    /// Completed episodes so far
    pub episode_count: u64,
    /// Environment steps summed over the batch
    pub total_steps: u64,
    /// Best smoothed reward, if the reward window has filled
    pub best_avg_reward: Option<f64>,
    /// Seconds since epoch
    pub timestamp: u64,
    /// rlearn version
    pub version: String,
}

impl CheckpointMetadata {
    pub fn new(
        epoch: usize,
        episode_count: u64,
        total_steps: u64,
        best_avg_reward: Option<f64>,
    ) -> Self {
        Self {
            epoch,
            episode_count,
            total_steps,
            best_avg_reward,
            timestamp: unix_timestamp(),
            version: crate::VERSION.to_string(),
        }
    }

    pub fn write(&self, path: &Path) -> crate::Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn read(path: &Path) -> crate::Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}

fn unix_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
