//! Multi-armed bandit environment.

use crate::discrete_action;
use ndarray::{ArrayD, IxDyn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rlearn::env::{Env, EnvInfo, StepResult};
use rlearn::spaces::{Box as BoxSpace, Discrete, DynSpace};
use rlearn::Result;

/// Multi-armed bandit environment
///
/// Every episode is a single pull. The winning arm is fixed by a seed, so
/// all instances in a batch agree on it.
pub struct Bandit {
    num_actions: usize,
    reward_scale: f32,
    /// Uniform noise half-width added to every reward
    reward_noise: f32,
    solution_idx: usize,
    rng: StdRng,
}

impl Bandit {
    pub fn new(num_actions: usize) -> Self {
        Self::with_config(num_actions, 1.0, 0.0, 42)
    }

    /// Create with full configuration
    pub fn with_config(
        num_actions: usize,
        reward_scale: f32,
        reward_noise: f32,
        solution_seed: u64,
    ) -> Self {
        let mut seed_rng = StdRng::seed_from_u64(solution_seed);
        let solution_idx = seed_rng.gen_range(0..num_actions.max(1));

        Self {
            num_actions,
            reward_scale,
            reward_noise,
            solution_idx,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn solution(&self) -> usize {
        self.solution_idx
    }

    fn observation() -> ArrayD<f32> {
        ArrayD::from_elem(IxDyn(&[1]), 1.0)
    }
}

impl Env for Bandit {
    fn observation_space(&self) -> DynSpace {
        DynSpace::Box(BoxSpace::uniform(&[1], -1.0, 1.0))
    }

    fn action_space(&self) -> DynSpace {
        DynSpace::Discrete(Discrete::new(self.num_actions))
    }

    fn reset(&mut self, seed: Option<u64>) -> Result<(ArrayD<f32>, EnvInfo)> {
        if let Some(s) = seed {
            self.rng = StdRng::seed_from_u64(s);
        }
        Ok((Self::observation(), EnvInfo::new()))
    }

    fn step(&mut self, action: &ArrayD<f32>) -> Result<StepResult> {
        let arm = discrete_action(action, self.num_actions)?;
        let correct = arm == self.solution_idx;
        let mut reward = if correct { 1.0 } else { 0.0 };

        if self.reward_noise > 0.0 {
            let noise: f32 = self.rng.gen::<f32>() * 2.0 - 1.0;
            reward += noise * self.reward_noise;
        }

        Ok(StepResult {
            observation: Some(Self::observation()),
            reward: reward * self.reward_scale,
            terminated: true,
            truncated: false,
            info: EnvInfo::new().with_extra("score", if correct { 1.0 } else { 0.0 }),
        })
    }

    fn render(&self) -> Option<String> {
        Some(format!("Bandit: solution arm = {}", self.solution_idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pull(arm: usize) -> ArrayD<f32> {
        ArrayD::from_elem(IxDyn(&[1]), arm as f32)
    }

    #[test]
    fn test_every_pull_ends_the_episode() {
        let mut env = Bandit::new(4);
        env.reset(Some(42)).unwrap();

        for arm in 0..4 {
            let result = env.step(&pull(arm)).unwrap();
            assert!(result.terminated);
            assert!(result.observation.is_some());
        }
    }

    #[test]
    fn test_solution_arm_pays() {
        let mut env = Bandit::new(5);
        env.reset(None).unwrap();
        let best = env.solution();

        assert_eq!(env.step(&pull(best)).unwrap().reward, 1.0);
        assert_eq!(env.step(&pull((best + 1) % 5)).unwrap().reward, 0.0);
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let mut env1 = Bandit::with_config(3, 2.0, 0.5, 7);
        let mut env2 = Bandit::with_config(3, 2.0, 0.5, 7);
        env1.reset(Some(123)).unwrap();
        env2.reset(Some(123)).unwrap();

        for _ in 0..5 {
            let r1 = env1.step(&pull(0)).unwrap().reward;
            let r2 = env2.step(&pull(0)).unwrap().reward;
            assert_eq!(r1, r2);
        }
    }

    #[test]
    fn test_out_of_range_arm_is_rejected() {
        let mut env = Bandit::new(2);
        env.reset(None).unwrap();
        assert!(env.step(&pull(3)).is_err());
    }
}
