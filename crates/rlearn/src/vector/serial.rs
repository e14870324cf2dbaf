//! Serial (sequential) vectorization backend.
//!
//! Runs environments one at a time in a single thread. An environment whose
//! episode ended is reset on the following step, which reports the reset
//! observation with zero reward.

use super::vecenv::{VecEnvBackend, VecEnvResult};
use crate::env::{Env, EnvInfo};
use crate::spaces::DynSpace;
use crate::{Result, RlearnError};
use ndarray::{Array1, Array2, ArrayD, IxDyn};

/// Serial vectorization backend
pub struct Serial<E: Env> {
    envs: Vec<E>,
    /// Envs whose previous step ended an episode
    needs_reset: Vec<bool>,
    /// Cached flattened observation size
    obs_size: usize,
}

impl<E: Env> Serial<E> {
    /// Create a new serial backend
    pub fn new<F>(env_creator: F, num_envs: usize) -> Self
    where
        F: Fn() -> E,
    {
        assert!(num_envs > 0, "Serial backend needs at least one environment");
        let envs: Vec<E> = (0..num_envs).map(|_| env_creator()).collect();
        let obs_size = envs[0].observation_space().flat_size();

        Self {
            envs,
            needs_reset: vec![false; num_envs],
            obs_size,
        }
    }

    /// Access the wrapped environments
    pub fn envs(&self) -> &[E] {
        &self.envs
    }

    fn flatten(&self, obs: ArrayD<f32>) -> Result<Array1<f32>> {
        if obs.len() != self.obs_size {
            return Err(RlearnError::ShapeMismatch {
                expected: vec![self.obs_size],
                actual: obs.shape().to_vec(),
            });
        }
        Ok(obs.iter().copied().collect())
    }
}

impl<E: Env> VecEnvBackend for Serial<E> {
    fn observation_space(&self) -> DynSpace {
        self.envs[0].observation_space()
    }

    fn action_space(&self) -> DynSpace {
        self.envs[0].action_space()
    }

    fn num_envs(&self) -> usize {
        self.envs.len()
    }

    fn reset(&mut self, seed: Option<u64>) -> Result<(Array2<f32>, Vec<EnvInfo>)> {
        let num_envs = self.envs.len();
        let mut batch = Array2::<f32>::zeros((num_envs, self.obs_size));
        let mut infos = Vec::with_capacity(num_envs);

        for i in 0..num_envs {
            let env_seed = seed.map(|s| s.wrapping_add(i as u64));
            let (obs, info) = self.envs[i].reset(env_seed)?;
            let row = self.flatten(obs)?;
            batch.row_mut(i).assign(&row);
            infos.push(info);
        }
        self.needs_reset.iter_mut().for_each(|r| *r = false);

        Ok((batch, infos))
    }

    fn step(&mut self, actions: &Array2<f32>) -> Result<VecEnvResult> {
        let num_envs = self.envs.len();
        if actions.nrows() != num_envs {
            return Err(RlearnError::ShapeMismatch {
                expected: vec![num_envs, actions.ncols()],
                actual: actions.shape().to_vec(),
            });
        }

        let mut result = VecEnvResult {
            observations: Vec::with_capacity(num_envs),
            rewards: Vec::with_capacity(num_envs),
            terminated: Vec::with_capacity(num_envs),
            truncated: Vec::with_capacity(num_envs),
            infos: Vec::with_capacity(num_envs),
        };

        for i in 0..num_envs {
            if self.needs_reset[i] {
                let (obs, info) = self.envs[i].reset(None)?;
                result.observations.push(Some(self.flatten(obs)?));
                result.rewards.push(0.0);
                result.terminated.push(false);
                result.truncated.push(false);
                result.infos.push(info);
                self.needs_reset[i] = false;
                continue;
            }

            let action_row = actions.row(i);
            let action = ArrayD::from_shape_vec(IxDyn(&[action_row.len()]), action_row.to_vec())
                .map_err(|e| RlearnError::InvalidArgument(e.to_string()))?;

            let step = self.envs[i].step(&action)?;
            self.needs_reset[i] = step.done();
            let observation = match step.observation {
                Some(obs) => Some(self.flatten(obs)?),
                None => None,
            };
            result.observations.push(observation);
            result.rewards.push(step.reward);
            result.terminated.push(step.terminated);
            result.truncated.push(step.truncated);
            result.infos.push(step.info);
        }

        Ok(result)
    }

    fn close(&mut self) {
        for env in &mut self.envs {
            env.close();
        }
    }
}
