//! Core environment trait definitions.

use crate::spaces::DynSpace;
use crate::Result;
use ndarray::ArrayD;

/// Information returned from environment resets and steps
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnvInfo {
    /// Custom metrics (kept minimal for performance)
    pub extra: smallvec::SmallVec<[(&'static str, f32); 4]>,
}

impl EnvInfo {
    /// Create empty info
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a custom metric
    pub fn with_extra(mut self, key: &'static str, value: f32) -> Self {
        self.extra.push((key, value));
        self
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<f32> {
        self.extra.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    pub fn is_empty(&self) -> bool {
        self.extra.is_empty()
    }
}

/// Result from a single environment step
#[derive(Clone, Debug)]
pub struct StepResult {
    /// Observation after the step.
    ///
    /// `None` is only meaningful on a terminal or truncated step, where some
    /// environments have no well-defined next state.
    pub observation: Option<ArrayD<f32>>,
    /// Reward received
    pub reward: f32,
    /// Whether episode terminated (goal reached, failure, etc.)
    pub terminated: bool,
    /// Whether episode truncated (time limit, etc.)
    pub truncated: bool,
    /// Additional info
    pub info: EnvInfo,
}

impl StepResult {
    /// Check if episode is done (terminated or truncated)
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Core trait for single environments.
///
/// # Example
///
/// ```rust,ignore
/// use rlearn::env::{Env, EnvInfo, StepResult};
/// use rlearn::spaces::{Box as BoxSpace, Discrete, DynSpace};
///
/// struct Coin;
///
/// impl Env for Coin {
///     fn observation_space(&self) -> DynSpace {
///         DynSpace::Box(BoxSpace::uniform(&[1], 0.0, 1.0))
///     }
///
///     fn action_space(&self) -> DynSpace {
///         DynSpace::Discrete(Discrete::new(2))
///     }
///
///     fn reset(&mut self, _seed: Option<u64>) -> Result<(ArrayD<f32>, EnvInfo)> {
///         Ok((ArrayD::zeros(IxDyn(&[1])), EnvInfo::new()))
///     }
///
///     fn step(&mut self, action: &ArrayD<f32>) -> Result<StepResult> {
///         // ...
///     }
/// }
/// ```
pub trait Env: Send {
    /// Get the observation space
    fn observation_space(&self) -> DynSpace;

    /// Get the action space
    fn action_space(&self) -> DynSpace;

    /// Reset the environment to an initial state
    fn reset(&mut self, seed: Option<u64>) -> Result<(ArrayD<f32>, EnvInfo)>;

    /// Take a single step in the environment
    fn step(&mut self, action: &ArrayD<f32>) -> Result<StepResult>;

    /// Optional: Render the environment
    fn render(&self) -> Option<String> {
        None
    }

    /// Optional: Close the environment and free resources
    fn close(&mut self) {}

    /// Check if the last step ended an episode and the env needs a reset
    fn is_done(&self) -> bool {
        false
    }
}
