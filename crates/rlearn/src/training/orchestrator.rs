//! The epoch/step training loop.

use super::accumulator::EpisodeAccumulator;
use super::config::{OrchestratorConfig, StoppingConfig};
use super::monitor::{ExitReason, StoppingMonitor};
use crate::agent::{EpisodeEnd, PolicyAgent, Transition};
use crate::checkpoint::{CheckpointManager, CheckpointMetadata, CheckpointPolicy};
use crate::i18n::Translator;
use crate::log::{MetricLogger, Metrics, NoOpLogger};
use crate::utils::{abbreviate, format_duration, steps_per_second};
use crate::vector::VecEnvBackend;
use crate::{Result, RlearnError};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;

/// Outcome of a finished [`TrainingOrchestrator::run`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub total_episodes: u64,
    /// Environment steps summed over the batch
    pub total_steps: u64,
    pub duration_seconds: f64,
    pub exit_reason: ExitReason,
    pub final_model_path: PathBuf,
    /// Best smoothed reward, `None` if the reward window never filled
    pub best_avg_reward: Option<f64>,
    pub epochs_run: usize,
}

/// Drives an agent against a batch of environments until a stop condition.
///
/// # Example
///
/// ```ignore
/// let mut orchestrator = TrainingOrchestrator::new(agent)
///     .with_env(Serial::new(CartPole::new, 8))
///     .with_config(OrchestratorConfig::default().with_seed(7));
///
/// let stopping = StoppingConfig::default().with_window(20).with_target_reward(195.0);
/// let policy = CheckpointPolicy::new("checkpoints").every(100).keep_last(3);
/// let summary = orchestrator.run(50, 256, stopping, policy)?;
/// ```
pub struct TrainingOrchestrator<A: PolicyAgent> {
    agent: A,
    env: Option<Box<dyn VecEnvBackend>>,
    config: OrchestratorConfig,
    logger: Box<dyn MetricLogger>,
    translator: Translator,
}

impl<A: PolicyAgent> TrainingOrchestrator<A> {
    /// Create an orchestrator with no environment attached yet.
    pub fn new(agent: A) -> Self {
        Self {
            agent,
            env: None,
            config: OrchestratorConfig::default(),
            logger: Box::new(NoOpLogger),
            translator: Translator::default(),
        }
    }

    pub fn with_env<B: VecEnvBackend + 'static>(mut self, env: B) -> Self {
        self.set_env(env);
        self
    }

    /// Attach or replace the environment batch
    pub fn set_env<B: VecEnvBackend + 'static>(&mut self, env: B) {
        self.env = Some(Box::new(env));
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn MetricLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_translator(mut self, translator: Translator) -> Self {
        self.translator = translator;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut A {
        &mut self.agent
    }

    pub fn into_agent(self) -> A {
        self.agent
    }

    /// Run up to `max_epochs * steps_per_epoch` batched steps.
    ///
    /// The environment batch is reset exactly once. Episode boundaries are
    /// tracked by the accumulator and the monitor, never by another reset.
    /// Early stopping returns a summary with the reason; only failures of
    /// the environment, the agent or the filesystem are errors.
    pub fn run(
        &mut self,
        max_epochs: usize,
        steps_per_epoch: usize,
        stopping: StoppingConfig,
        checkpoint_policy: CheckpointPolicy,
    ) -> Result<TrainingSummary> {
        let Self {
            agent,
            env,
            config,
            logger,
            translator,
        } = self;
        let env = env.as_mut().ok_or_else(|| {
            RlearnError::Configuration(
                "no environment attached, call with_env or set_env before run".to_string(),
            )
        })?;

        let mut monitor = StoppingMonitor::new(stopping)?;
        let mut checkpoints = CheckpointManager::new(checkpoint_policy);
        let num_envs = env.num_envs();
        let obs_size = env.observation_space().flat_size();
        let mut accumulator = EpisodeAccumulator::new(num_envs);

        let (mut states, infos) = env.reset(config.seed)?;
        if states.dim() != (num_envs, obs_size) {
            return Err(RlearnError::ShapeMismatch {
                expected: vec![num_envs, obs_size],
                actual: states.shape().to_vec(),
            });
        }
        agent.on_train_start(&states, &infos)?;

        tracing::info!(num_envs, obs_size, max_epochs, steps_per_epoch, "Starting training");
        let start = Instant::now();
        let planned_steps = (max_epochs as u64).saturating_mul(steps_per_epoch as u64);
        let progress = progress_bar(config.show_progress, planned_steps);
        let mut total_steps: u64 = 0;
        let mut exit_reason = ExitReason::MaximumEpochsReached;
        let mut epochs_run = 0;

        'epochs: for epoch in 0..max_epochs {
            agent.on_epoch_start(epoch)?;
            epochs_run = epoch + 1;

            for step_index in 0..steps_per_epoch {
                let actions = agent.select_action(&states, step_index)?;
                if actions.nrows() != num_envs {
                    return Err(RlearnError::ShapeMismatch {
                        expected: vec![num_envs, actions.ncols()],
                        actual: actions.shape().to_vec(),
                    });
                }

                let result = env.step(&actions)?;
                result.validate(num_envs)?;
                let dones = result.dones();
                let next_states = result.observation_batch(obs_size)?;
                total_steps += num_envs as u64;

                let transition = Transition {
                    next_observations: &next_states,
                    rewards: &result.rewards,
                    terminated: &result.terminated,
                    truncated: &result.truncated,
                    infos: &result.infos,
                };
                agent.observe_transition(&transition, epoch, step_index)?;
                accumulator.accumulate(&result.rewards)?;
                states = next_states;
                progress.inc(1);

                // The hook runs before the monitor, but a monitor exit wins.
                let episode_end = if step_index + 1 == steps_per_epoch {
                    agent.on_episode_end(epoch)?
                } else {
                    EpisodeEnd::proceed()
                };

                if dones.iter().any(|&d| d) {
                    let decision = monitor.evaluate(
                        total_steps,
                        &dones,
                        accumulator.rewards(),
                        accumulator.lengths(),
                    )?;
                    accumulator.take_completed(&dones)?;

                    if decision.should_exit {
                        tracing::info!(
                            epoch,
                            step_index,
                            episodes = monitor.episode_count(),
                            "{}: {}",
                            translator.translate("exit_reason"),
                            translator.exit_reason(decision.reason)
                        );
                        exit_reason = decision.reason;
                        break 'epochs;
                    }
                }

                if episode_end.should_stop {
                    tracing::info!(
                        epoch,
                        "{}: {}",
                        translator.translate("early_stopping"),
                        episode_end.info.as_deref().unwrap_or("")
                    );
                    exit_reason = ExitReason::AgentRequestedStop;
                    break 'epochs;
                }
            }

            let metadata = CheckpointMetadata::new(
                epoch,
                monitor.episode_count(),
                total_steps,
                best_reward(&monitor),
            );
            if let Some(path) = checkpoints.maybe_save(&*agent, &metadata)? {
                tracing::info!(
                    "{}: {}",
                    translator.translate("checkpoint_saved"),
                    path.display()
                );
            }

            if config.log_interval > 0 && epochs_run % config.log_interval == 0 {
                log_progress(&**logger, &monitor, epoch, total_steps, start);
                if progress.is_hidden() {
                    tracing::info!(
                        epoch,
                        episodes = monitor.episode_count(),
                        steps = %abbreviate(total_steps),
                        elapsed = %format_duration(start.elapsed()),
                        "Training progress"
                    );
                }
            }
            progress.set_message(progress_message(&monitor));
        }

        progress.finish_and_clear();
        agent.on_train_end()?;

        let final_model_path = config.final_model.resolve(&mut rand::thread_rng());
        if let Some(parent) = final_model_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        agent.save_final(&final_model_path)?;
        tracing::info!(
            "{}: {}",
            translator.translate("final_model_saved"),
            final_model_path.display()
        );

        env.close();
        logger.close();

        let summary = TrainingSummary {
            total_episodes: monitor.episode_count(),
            total_steps,
            duration_seconds: start.elapsed().as_secs_f64(),
            exit_reason,
            final_model_path,
            best_avg_reward: best_reward(&monitor),
            epochs_run,
        };
        tracing::info!(
            episodes = summary.total_episodes,
            steps = summary.total_steps,
            reason = %summary.exit_reason,
            "Training finished"
        );
        Ok(summary)
    }
}

fn best_reward(monitor: &StoppingMonitor) -> Option<f64> {
    Some(monitor.best_avg_reward()).filter(|best| best.is_finite())
}

fn progress_bar(enabled: bool, len: u64) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

fn progress_message(monitor: &StoppingMonitor) -> String {
    match monitor.status().smoothed_reward {
        Some(reward) => format!("Episodes: {} Reward: {:.2}", monitor.episode_count(), reward),
        None => format!("Episodes: {}", monitor.episode_count()),
    }
}

fn log_progress(
    logger: &dyn MetricLogger,
    monitor: &StoppingMonitor,
    epoch: usize,
    total_steps: u64,
    start: Instant,
) {
    let status = monitor.status();
    let mut metrics = Metrics::new();
    metrics.insert("epoch".to_string(), epoch as f64);
    metrics.insert("episodes".to_string(), status.episode_count as f64);
    metrics.insert("sps".to_string(), steps_per_second(total_steps, start.elapsed()));
    if let Some(reward) = status.smoothed_reward {
        metrics.insert("smoothed_reward".to_string(), reward);
    }
    if let Some(length) = status.smoothed_length {
        metrics.insert("smoothed_length".to_string(), length);
    }
    if let Some(best) = status.best_avg_reward {
        metrics.insert("best_avg_reward".to_string(), best);
    }
    logger.log_metrics(&metrics, total_steps);
}
