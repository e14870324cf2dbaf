//! Built-in environments for rlearn.
//!
//! Small environments for exercising the training loop:
//! - `Bandit` - Multi-armed bandit, one step per episode
//! - `CartPole` - Classic control with staggered episode ends
//! - `Corridor` - Fixed-length walk whose terminal step has no observation

mod bandit;
mod cartpole;
mod corridor;

pub use bandit::Bandit;
pub use cartpole::CartPole;
pub use corridor::Corridor;

use ndarray::ArrayD;
use rlearn::{Result, RlearnError};

/// Names of the built-in environments
pub const ENV_NAMES: &[&str] = &["bandit", "cartpole", "corridor"];

/// One-line summary of a built-in environment.
pub fn describe(name: &str) -> Option<&'static str> {
    match name {
        "bandit" => Some("Multi-armed bandit (discrete, 4 arms), one-step episodes"),
        "cartpole" => Some("CartPole classic control, staggered episode ends"),
        "corridor" => Some("Fixed-length corridor (10 steps), no terminal observation"),
        _ => None,
    }
}

/// Read a discrete action index from a one-element action array.
pub(crate) fn discrete_action(action: &ArrayD<f32>, num_actions: usize) -> Result<usize> {
    let value = action
        .iter()
        .next()
        .copied()
        .ok_or_else(|| RlearnError::InvalidArgument("empty action".to_string()))?;
    let index = value.round();
    if !value.is_finite() || index < 0.0 || index as usize >= num_actions {
        return Err(RlearnError::InvalidArgument(format!(
            "action {} out of range for {} actions",
            value, num_actions
        )));
    }
    Ok(index as usize)
}
