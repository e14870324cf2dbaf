//! Deterministic corridor walk.

use crate::discrete_action;
use ndarray::{ArrayD, IxDyn};
use rlearn::env::{Env, EnvInfo, StepResult};
use rlearn::spaces::{Box as BoxSpace, Discrete, DynSpace};
use rlearn::Result;

/// Walk down a corridor of fixed length.
///
/// Every episode lasts exactly `length` steps whatever the actions. Moving
/// forward (action 1) pays 1, standing still pays 0. The terminal step has
/// no next observation.
///
/// Observation: [position / length]
pub struct Corridor {
    length: u32,
    position: u32,
    moves: u32,
    done: bool,
}

impl Corridor {
    pub fn new(length: u32) -> Self {
        Self {
            length: length.max(1),
            position: 0,
            moves: 0,
            done: false,
        }
    }

    fn observation(&self) -> ArrayD<f32> {
        ArrayD::from_elem(IxDyn(&[1]), self.moves as f32 / self.length as f32)
    }
}

impl Default for Corridor {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Env for Corridor {
    fn observation_space(&self) -> DynSpace {
        DynSpace::Box(BoxSpace::uniform(&[1], 0.0, 1.0))
    }

    fn action_space(&self) -> DynSpace {
        DynSpace::Discrete(Discrete::new(2))
    }

    fn reset(&mut self, _seed: Option<u64>) -> Result<(ArrayD<f32>, EnvInfo)> {
        self.position = 0;
        self.moves = 0;
        self.done = false;
        Ok((self.observation(), EnvInfo::new()))
    }

    fn step(&mut self, action: &ArrayD<f32>) -> Result<StepResult> {
        let forward = discrete_action(action, 2)? == 1;
        self.position += 1;
        if forward {
            self.moves += 1;
        }

        self.done = self.position >= self.length;
        let observation = (!self.done).then(|| self.observation());
        let mut info = EnvInfo::new();
        if self.done {
            info = info.with_extra("progress", self.moves as f32 / self.length as f32);
        }

        Ok(StepResult {
            observation,
            reward: if forward { 1.0 } else { 0.0 },
            terminated: self.done,
            truncated: false,
            info,
        })
    }

    fn render(&self) -> Option<String> {
        let mut line = vec!['.'; self.length as usize];
        if let Some(cell) = line.get_mut(self.position.saturating_sub(1) as usize) {
            *cell = '@';
        }
        Some(line.iter().collect())
    }

    fn is_done(&self) -> bool {
        self.done
    }
}
