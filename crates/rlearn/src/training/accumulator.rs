//! Per-environment episode return and length tracking.

use crate::{Result, RlearnError};

/// Statistics of one episode captured at its completion
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompletedEpisode {
    /// Index of the environment that finished
    pub env_index: usize,
    /// Sum of rewards over the episode
    pub reward: f64,
    /// Number of steps in the episode
    pub length: u64,
}

/// Running reward and length sums for every environment in a batch.
///
/// Episodes end at different steps in different environments, so each index
/// accumulates independently and is zeroed only when its own episode ends.
#[derive(Clone, Debug)]
pub struct EpisodeAccumulator {
    rewards: Vec<f64>,
    lengths: Vec<u64>,
}

impl EpisodeAccumulator {
    pub fn new(num_envs: usize) -> Self {
        Self {
            rewards: vec![0.0; num_envs],
            lengths: vec![0; num_envs],
        }
    }

    pub fn num_envs(&self) -> usize {
        self.rewards.len()
    }

    /// Running reward per environment
    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    /// Running length per environment
    pub fn lengths(&self) -> &[u64] {
        &self.lengths
    }

    fn check_len(&self, name: &str, len: usize) -> Result<()> {
        if len != self.num_envs() {
            return Err(RlearnError::InvalidArgument(format!(
                "{} has {} entries, expected {}",
                name,
                len,
                self.num_envs()
            )));
        }
        Ok(())
    }

    /// Add one step of rewards. Every environment advances one timestep.
    pub fn accumulate(&mut self, rewards: &[f32]) -> Result<()> {
        self.check_len("rewards", rewards.len())?;
        for ((acc, len), &r) in self
            .rewards
            .iter_mut()
            .zip(self.lengths.iter_mut())
            .zip(rewards)
        {
            *acc += r as f64;
            *len += 1;
        }
        Ok(())
    }

    /// Snapshot the finished environments, then zero them.
    pub fn take_completed(&mut self, done_mask: &[bool]) -> Result<Vec<CompletedEpisode>> {
        self.check_len("done mask", done_mask.len())?;
        let mut completed = Vec::new();
        for (i, _) in done_mask.iter().enumerate().filter(|&(_, &d)| d) {
            completed.push(CompletedEpisode {
                env_index: i,
                reward: self.rewards[i],
                length: self.lengths[i],
            });
            self.rewards[i] = 0.0;
            self.lengths[i] = 0;
        }
        Ok(completed)
    }

    /// Accumulate one step and return the episodes it finished.
    pub fn update(&mut self, rewards: &[f32], done_mask: &[bool]) -> Result<Vec<CompletedEpisode>> {
        self.check_len("done mask", done_mask.len())?;
        self.accumulate(rewards)?;
        self.take_completed(done_mask)
    }
}
