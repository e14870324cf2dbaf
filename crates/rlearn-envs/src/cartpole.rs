//! CartPole classic control environment.

use crate::discrete_action;
use ndarray::{ArrayD, IxDyn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rlearn::env::{Env, EnvInfo, StepResult};
use rlearn::spaces::{Box as BoxSpace, Discrete, DynSpace};
use rlearn::Result;
use std::f32::consts::PI;

/// CartPole environment
///
/// A pole is attached to a cart on a frictionless track. The goal
/// is to balance the pole by applying forces to the cart.
///
/// Observation: [cart_pos, cart_vel, pole_angle, pole_vel]
/// Action: 0 = push left, 1 = push right
pub struct CartPole {
    gravity: f32,
    mass_pole: f32,
    total_mass: f32,
    length: f32, // half-pole length
    pole_mass_length: f32,
    force_mag: f32,
    tau: f32,

    theta_threshold: f32,
    x_threshold: f32,
    max_steps: u32,

    state: [f32; 4], // x, x_dot, theta, theta_dot
    steps: u32,
    done: bool,
    rng: StdRng,
}

impl CartPole {
    pub fn new() -> Self {
        let mass_cart = 1.0;
        let mass_pole = 0.1;
        let length = 0.5;

        Self {
            gravity: 9.8,
            mass_pole,
            total_mass: mass_cart + mass_pole,
            length,
            pole_mass_length: mass_pole * length,
            force_mag: 10.0,
            tau: 0.02,
            theta_threshold: 12.0 * 2.0 * PI / 360.0,
            x_threshold: 2.4,
            max_steps: 500,
            state: [0.0; 4],
            steps: 0,
            done: false,
            rng: StdRng::from_entropy(),
        }
    }

    /// Truncate episodes after `max_steps` steps
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    fn is_terminal(&self) -> bool {
        let x = self.state[0];
        let theta = self.state[2];

        x.abs() > self.x_threshold || theta.abs() > self.theta_threshold
    }

    fn observation(&self) -> ArrayD<f32> {
        ArrayD::from_shape_fn(IxDyn(&[4]), |idx| self.state[idx[0]])
    }
}

impl Default for CartPole {
    fn default() -> Self {
        Self::new()
    }
}

impl Env for CartPole {
    fn observation_space(&self) -> DynSpace {
        DynSpace::Box(BoxSpace::uniform(&[4], -4.8, 4.8))
    }

    fn action_space(&self) -> DynSpace {
        DynSpace::Discrete(Discrete::new(2))
    }

    fn reset(&mut self, seed: Option<u64>) -> Result<(ArrayD<f32>, EnvInfo)> {
        if let Some(s) = seed {
            self.rng = StdRng::seed_from_u64(s);
        }

        // Initial state uniform in [-0.05, 0.05]
        for value in self.state.iter_mut() {
            *value = self.rng.gen::<f32>() * 0.1 - 0.05;
        }
        self.steps = 0;
        self.done = false;

        Ok((self.observation(), EnvInfo::new()))
    }

    fn step(&mut self, action: &ArrayD<f32>) -> Result<StepResult> {
        let push_right = discrete_action(action, 2)? == 1;
        let [x, x_dot, theta, theta_dot] = self.state;
        let force = if push_right { self.force_mag } else { -self.force_mag };

        let cos_theta = theta.cos();
        let sin_theta = theta.sin();

        let temp =
            (force + self.pole_mass_length * theta_dot * theta_dot * sin_theta) / self.total_mass;
        let theta_acc = (self.gravity * sin_theta - cos_theta * temp)
            / (self.length * (4.0 / 3.0 - self.mass_pole * cos_theta * cos_theta / self.total_mass));
        let x_acc = temp - self.pole_mass_length * theta_acc * cos_theta / self.total_mass;

        // Euler integration
        self.state[0] = x + self.tau * x_dot;
        self.state[1] = x_dot + self.tau * x_acc;
        self.state[2] = theta + self.tau * theta_dot;
        self.state[3] = theta_dot + self.tau * theta_acc;

        self.steps += 1;

        let terminated = self.is_terminal();
        let truncated = !terminated && self.steps >= self.max_steps;
        self.done = terminated || truncated;

        let mut info = EnvInfo::new();
        if self.done {
            info = info.with_extra("episode_length", self.steps as f32);
        }

        Ok(StepResult {
            observation: Some(self.observation()),
            reward: if terminated { 0.0 } else { 1.0 },
            terminated,
            truncated,
            info,
        })
    }

    fn render(&self) -> Option<String> {
        let [x, _, theta, _] = self.state;

        let cart_pos = (((x + 2.4) / 4.8 * 20.0) as i32).clamp(0, 20);
        let mut line = vec![' '; 21];
        line[cart_pos as usize] = if theta.abs() < 0.1 { '|' } else { '/' };

        Some(format!("[{}]", line.iter().collect::<String>()))
    }

    fn is_done(&self) -> bool {
        self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(right: bool) -> ArrayD<f32> {
        ArrayD::from_elem(IxDyn(&[1]), if right { 1.0 } else { 0.0 })
    }

    #[test]
    fn test_cartpole_reset() {
        let mut env = CartPole::new();
        let (obs, _) = env.reset(Some(42)).unwrap();

        assert_eq!(obs.len(), 4);
        assert!(obs.iter().all(|v| v.abs() <= 0.05));
        assert!(!env.is_done());
    }

    #[test]
    fn test_cartpole_step() {
        let mut env = CartPole::new();
        env.reset(Some(42)).unwrap();

        let result = env.step(&push(true)).unwrap();
        assert_eq!(result.observation.map(|o| o.len()), Some(4));
        assert_eq!(result.reward, 1.0);
    }

    #[test]
    fn test_constant_push_falls_over() {
        let mut env = CartPole::new();
        env.reset(Some(0)).unwrap();

        let mut steps = 0;
        loop {
            steps += 1;
            let result = env.step(&push(true)).unwrap();
            if result.done() {
                assert!(result.terminated);
                assert_eq!(result.info.get("episode_length"), Some(steps as f32));
                break;
            }
            assert!(steps < 500);
        }
        assert!(env.is_done());
    }

    #[test]
    fn test_truncation() {
        let mut env = CartPole::new().with_max_steps(3);
        env.reset(Some(1)).unwrap();

        let mut last = None;
        for i in 0..3 {
            // Alternate pushes to keep the pole up for a few steps
            last = Some(env.step(&push(i % 2 == 0)).unwrap());
        }
        let last = last.unwrap();
        assert!(last.truncated);
        assert!(!last.terminated);
    }

    #[test]
    fn test_cartpole_determinism() {
        let mut env1 = CartPole::new();
        let mut env2 = CartPole::new();
        env1.reset(Some(42)).unwrap();
        env2.reset(Some(42)).unwrap();

        for _ in 0..10 {
            let res1 = env1.step(&push(true)).unwrap();
            let res2 = env2.step(&push(true)).unwrap();
            assert_eq!(res1.observation, res2.observation);
        }
    }
}
