//! Vectorized environment abstraction.

use crate::env::EnvInfo;
use crate::spaces::DynSpace;
use crate::{Result, RlearnError};
use ndarray::{Array1, Array2};

/// Result from stepping all environments
#[derive(Clone, Debug, Default)]
pub struct VecEnvResult {
    /// Flattened next observation per environment, `None` where the
    /// environment had no observation to report
    pub observations: Vec<Option<Array1<f32>>>,
    /// Rewards for all environments
    pub rewards: Vec<f32>,
    /// Terminated flags
    pub terminated: Vec<bool>,
    /// Truncated flags
    pub truncated: Vec<bool>,
    /// Info dictionaries
    pub infos: Vec<EnvInfo>,
}

impl VecEnvResult {
    /// Check which environments are done
    pub fn dones(&self) -> Vec<bool> {
        self.terminated
            .iter()
            .zip(self.truncated.iter())
            .map(|(&t, &tr)| t || tr)
            .collect()
    }

    /// Verify every per-environment vector has `num_envs` entries.
    pub fn validate(&self, num_envs: usize) -> Result<()> {
        let lengths = [
            ("observations", self.observations.len()),
            ("rewards", self.rewards.len()),
            ("terminated", self.terminated.len()),
            ("truncated", self.truncated.len()),
        ];
        for (name, len) in lengths {
            if len != num_envs {
                return Err(RlearnError::InvalidArgument(format!(
                    "{} has {} entries, expected {}",
                    name, len, num_envs
                )));
            }
        }
        Ok(())
    }

    /// Stack observations into a `(num_envs, obs_size)` matrix.
    ///
    /// A done environment without an observation gets an all-zero row.
    /// A missing observation on a running environment is an error.
    pub fn observation_batch(&self, obs_size: usize) -> Result<Array2<f32>> {
        let num_envs = self.observations.len();
        let mut batch = Array2::<f32>::zeros((num_envs, obs_size));

        for (i, obs) in self.observations.iter().enumerate() {
            let done = self.terminated.get(i).copied().unwrap_or(false)
                || self.truncated.get(i).copied().unwrap_or(false);
            match obs {
                Some(obs) => {
                    if obs.len() != obs_size {
                        return Err(RlearnError::ShapeMismatch {
                            expected: vec![obs_size],
                            actual: vec![obs.len()],
                        });
                    }
                    batch.row_mut(i).assign(obs);
                }
                None if done => {
                    tracing::trace!(env = i, "Substituting zero observation for finished env");
                }
                None => {
                    return Err(RlearnError::InvalidArgument(format!(
                        "environment {} returned no observation without ending its episode",
                        i
                    )));
                }
            }
        }

        Ok(batch)
    }
}

/// Trait for vectorized environment backends
pub trait VecEnvBackend: Send {
    /// Get the observation space (single env)
    fn observation_space(&self) -> DynSpace;

    /// Get the action space (single env)
    fn action_space(&self) -> DynSpace;

    /// Get the number of environments
    fn num_envs(&self) -> usize;

    /// Reset all environments
    fn reset(&mut self, seed: Option<u64>) -> Result<(Array2<f32>, Vec<EnvInfo>)>;

    /// Step all environments with given actions, one row per environment
    fn step(&mut self, actions: &Array2<f32>) -> Result<VecEnvResult>;

    /// Close all environments
    fn close(&mut self);
}

impl<B: VecEnvBackend + ?Sized> VecEnvBackend for Box<B> {
    fn observation_space(&self) -> DynSpace {
        (**self).observation_space()
    }

    fn action_space(&self) -> DynSpace {
        (**self).action_space()
    }

    fn num_envs(&self) -> usize {
        (**self).num_envs()
    }

    fn reset(&mut self, seed: Option<u64>) -> Result<(Array2<f32>, Vec<EnvInfo>)> {
        (**self).reset(seed)
    }

    fn step(&mut self, actions: &Array2<f32>) -> Result<VecEnvResult> {
        (**self).step(actions)
    }

    fn close(&mut self) {
        (**self).close()
    }
}
