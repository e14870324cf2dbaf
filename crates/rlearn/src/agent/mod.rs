//! Agent interface consumed by the training loop.
//!
//! An agent chooses actions for a whole batch, observes every transition and
//! owns its own learning update. The orchestrator only calls the hooks below;
//! it never inspects the agent's internals.

mod random;

pub use random::RandomAgent;

use crate::env::EnvInfo;
use crate::Result;
use ndarray::Array2;
use std::path::Path;

/// One batched environment step as seen by the agent
#[derive(Clone, Copy, Debug)]
pub struct Transition<'a> {
    /// Next observations, one row per environment, with zero rows standing in
    /// for terminal steps that reported no observation
    pub next_observations: &'a Array2<f32>,
    pub rewards: &'a [f32],
    pub terminated: &'a [bool],
    pub truncated: &'a [bool],
    pub infos: &'a [EnvInfo],
}

/// Answer of [`PolicyAgent::on_episode_end`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EpisodeEnd {
    /// Ask the orchestrator to stop training after this epoch
    pub should_stop: bool,
    /// Free-form context logged alongside a stop request
    pub info: Option<String>,
}

impl EpisodeEnd {
    /// Keep training
    pub fn proceed() -> Self {
        Self::default()
    }

    /// Stop training, with a reason for the log
    pub fn stop(info: impl Into<String>) -> Self {
        Self {
            should_stop: true,
            info: Some(info.into()),
        }
    }
}

/// Trait for agents driven by the [`TrainingOrchestrator`](crate::training::TrainingOrchestrator).
///
/// Errors returned from any hook abort the run and reach the caller unchanged.
pub trait PolicyAgent {
    /// Called once after the environment reset, before the first step
    fn on_train_start(&mut self, _observations: &Array2<f32>, _infos: &[EnvInfo]) -> Result<()> {
        Ok(())
    }

    /// Called at the start of every epoch
    fn on_epoch_start(&mut self, _epoch: usize) -> Result<()> {
        Ok(())
    }

    /// Choose actions for every environment, one row per environment
    fn select_action(&mut self, states: &Array2<f32>, step_index: usize) -> Result<Array2<f32>>;

    /// Consume the outcome of the last batched step
    fn observe_transition(
        &mut self,
        transition: &Transition<'_>,
        epoch: usize,
        step_index: usize,
    ) -> Result<()>;

    /// Called after the last step of every epoch
    fn on_episode_end(&mut self, _epoch: usize) -> Result<EpisodeEnd> {
        Ok(EpisodeEnd::proceed())
    }

    /// Called once after the loop ends, before the final model is saved
    fn on_train_end(&mut self) -> Result<()> {
        Ok(())
    }

    /// Write an intermediate checkpoint to `path`
    fn save_checkpoint(&self, path: &Path) -> Result<()>;

    /// Write the final model to `path`
    fn save_final(&self, path: &Path) -> Result<()>;
}

impl<A: PolicyAgent + ?Sized> PolicyAgent for Box<A> {
    fn on_train_start(&mut self, observations: &Array2<f32>, infos: &[EnvInfo]) -> Result<()> {
        (**self).on_train_start(observations, infos)
    }

    fn on_epoch_start(&mut self, epoch: usize) -> Result<()> {
        (**self).on_epoch_start(epoch)
    }

    fn select_action(&mut self, states: &Array2<f32>, step_index: usize) -> Result<Array2<f32>> {
        (**self).select_action(states, step_index)
    }

    fn observe_transition(
        &mut self,
        transition: &Transition<'_>,
        epoch: usize,
        step_index: usize,
    ) -> Result<()> {
        (**self).observe_transition(transition, epoch, step_index)
    }

    fn on_episode_end(&mut self, epoch: usize) -> Result<EpisodeEnd> {
        (**self).on_episode_end(epoch)
    }

    fn on_train_end(&mut self) -> Result<()> {
        (**self).on_train_end()
    }

    fn save_checkpoint(&self, path: &Path) -> Result<()> {
        (**self).save_checkpoint(path)
    }

    fn save_final(&self, path: &Path) -> Result<()> {
        (**self).save_final(path)
    }
}
