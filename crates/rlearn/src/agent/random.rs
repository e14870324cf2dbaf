//! Uniformly random agent.
//!
//! Samples every action from the action space. Useful as a baseline and for
//! exercising the training loop without a learning backend.

use super::{PolicyAgent, Transition};
use crate::spaces::DynSpace;
use crate::{Result, RlearnError};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What a random agent persists: enough to tell runs apart.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RandomAgentState {
    pub seed: u64,
    pub steps_observed: u64,
    pub reward_sum: f64,
}

/// Agent that ignores observations and samples actions uniformly
pub struct RandomAgent {
    action_space: DynSpace,
    rng: StdRng,
    state: RandomAgentState,
}

impl RandomAgent {
    pub fn new(action_space: DynSpace, seed: u64) -> Self {
        Self {
            action_space,
            rng: StdRng::seed_from_u64(seed),
            state: RandomAgentState {
                seed,
                ..Default::default()
            },
        }
    }

    pub fn state(&self) -> &RandomAgentState {
        &self.state
    }

    fn write_state(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, &self.state)?;
        Ok(())
    }
}

impl PolicyAgent for RandomAgent {
    fn select_action(&mut self, states: &Array2<f32>, _step_index: usize) -> Result<Array2<f32>> {
        let num_envs = states.nrows();
        let action_size = self.action_space.flat_size();
        let flat: Vec<f32> = (0..num_envs)
            .flat_map(|_| {
                let action = self.action_space.sample(&mut self.rng);
                action.iter().copied().collect::<Vec<f32>>()
            })
            .collect();
        Array2::from_shape_vec((num_envs, action_size), flat)
            .map_err(|e| RlearnError::Policy(e.to_string()))
    }

    fn observe_transition(
        &mut self,
        transition: &Transition<'_>,
        _epoch: usize,
        _step_index: usize,
    ) -> Result<()> {
        self.state.steps_observed += transition.rewards.len() as u64;
        self.state.reward_sum += transition.rewards.iter().map(|&r| r as f64).sum::<f64>();
        Ok(())
    }

    fn save_checkpoint(&self, path: &Path) -> Result<()> {
        self.write_state(path)
    }

    fn save_final(&self, path: &Path) -> Result<()> {
        self.write_state(path)
    }
}
