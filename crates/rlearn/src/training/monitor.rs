//! Early-stopping monitor.
//!
//! The monitor ingests completed episodes from a vectorized run, keeps a
//! rolling window of their returns and lengths, and decides whether training
//! should stop. Criteria are checked in a fixed order and the first one that
//! holds wins:
//!
//! 1. episode budget
//! 2. step budget
//! 3. wall-clock budget
//! 4. (full window only) reward target, reward ceiling, improvement plateau

use super::config::{validate_alpha, SmoothingMethod, StoppingConfig};
use super::window::RollingWindow;
use crate::{Result, RlearnError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Why training stopped, or `ShouldContinue` when it has not
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    ShouldContinue,
    MaximumEpisodesReached,
    MaximumTotalStepsReached,
    MaximumRuntimeReached,
    RewardThresholdReached,
    ExceededMaximumRewardThreshold,
    NoImprovementForTooLong,
    /// The agent's episode-end hook asked to stop
    AgentRequestedStop,
    /// Every epoch ran without an early stop
    MaximumEpochsReached,
}

impl ExitReason {
    /// Stable snake_case identifier, also used as the translation key
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::ShouldContinue => "should_continue",
            ExitReason::MaximumEpisodesReached => "maximum_episodes_reached",
            ExitReason::MaximumTotalStepsReached => "maximum_total_steps_reached",
            ExitReason::MaximumRuntimeReached => "maximum_runtime_reached",
            ExitReason::RewardThresholdReached => "reward_threshold_reached",
            ExitReason::ExceededMaximumRewardThreshold => "exceeded_maximum_reward_threshold",
            ExitReason::NoImprovementForTooLong => "no_improvement_for_too_long",
            ExitReason::AgentRequestedStop => "agent_requested_stop",
            ExitReason::MaximumEpochsReached => "maximum_epochs_reached",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one [`StoppingMonitor::evaluate`] call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExitDecision {
    pub should_exit: bool,
    pub reason: ExitReason,
}

impl ExitDecision {
    pub fn proceed() -> Self {
        Self {
            should_exit: false,
            reason: ExitReason::ShouldContinue,
        }
    }

    pub fn exit(reason: ExitReason) -> Self {
        Self {
            should_exit: true,
            reason,
        }
    }
}

/// Read-only snapshot of the monitor
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonitorStatus {
    pub episode_count: u64,
    pub total_steps: u64,
    pub runtime_seconds: f64,
    /// Current smoothed reward, `None` while the window is empty
    pub smoothed_reward: Option<f64>,
    pub smoothed_length: Option<f64>,
    /// Best smoothed reward, `None` before the first full-window evaluation
    pub best_avg_reward: Option<f64>,
    pub episodes_without_improvement: u64,
    pub window_len: usize,
    pub window_capacity: usize,
    pub smoothing_method: SmoothingMethod,
}

/// Multi-criterion early-stopping monitor for vectorized training.
pub struct StoppingMonitor {
    config: StoppingConfig,
    start: Instant,
    window: RollingWindow,
    /// Every completed episode as `(reward, length)`
    history: Vec<(f64, u64)>,
    total_steps: u64,
    episode_count: u64,
    best_avg_reward: f64,
    episodes_without_improvement: u64,
    ema_reward: Option<f64>,
    ema_length: Option<f64>,
}

impl StoppingMonitor {
    /// Create a monitor, validating the configuration.
    pub fn new(config: StoppingConfig) -> Result<Self> {
        config.validate()?;
        let window = RollingWindow::new(config.reward_window_size);
        Ok(Self {
            config,
            start: Instant::now(),
            window,
            history: Vec::new(),
            total_steps: 0,
            episode_count: 0,
            best_avg_reward: f64::NEG_INFINITY,
            episodes_without_improvement: 0,
            ema_reward: None,
            ema_length: None,
        })
    }

    pub fn config(&self) -> &StoppingConfig {
        &self.config
    }

    pub fn episode_count(&self) -> u64 {
        self.episode_count
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Best smoothed reward so far; negative infinity until the window first fills.
    pub fn best_avg_reward(&self) -> f64 {
        self.best_avg_reward
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn window(&self) -> &RollingWindow {
        &self.window
    }

    /// Every completed episode seen since construction or the last reset
    pub fn history(&self) -> &[(f64, u64)] {
        &self.history
    }

    /// Ingest the episodes completed in one batched step and decide whether to stop.
    ///
    /// `acc_reward` and `acc_length` hold the running sums *before* the
    /// completed indices were reset. Only indices set in `done_mask` are read.
    pub fn evaluate(
        &mut self,
        total_steps_so_far: u64,
        done_mask: &[bool],
        acc_reward: &[f64],
        acc_length: &[u64],
    ) -> Result<ExitDecision> {
        if acc_reward.len() != done_mask.len() || acc_length.len() != done_mask.len() {
            return Err(RlearnError::InvalidArgument(format!(
                "batch length mismatch: done mask {}, rewards {}, lengths {}",
                done_mask.len(),
                acc_reward.len(),
                acc_length.len()
            )));
        }
        let completions = done_mask.iter().filter(|&&d| d).count();
        if completions == 0 {
            return Err(RlearnError::InvalidArgument(
                "evaluate called without any completed episode".to_string(),
            ));
        }

        for i in (0..done_mask.len()).filter(|&i| done_mask[i]) {
            self.window.push(acc_reward[i], acc_length[i] as f64);
            self.history.push((acc_reward[i], acc_length[i]));
        }
        self.episode_count += completions as u64;
        self.total_steps = total_steps_so_far;

        if let Some(max) = self.config.max_episodes {
            if self.episode_count >= max {
                return Ok(ExitDecision::exit(ExitReason::MaximumEpisodesReached));
            }
        }
        if let Some(max) = self.config.max_total_steps {
            if self.total_steps >= max {
                return Ok(ExitDecision::exit(ExitReason::MaximumTotalStepsReached));
            }
        }
        if let Some(max) = self.config.max_runtime {
            if self.start.elapsed().as_secs_f64() >= max {
                return Ok(ExitDecision::exit(ExitReason::MaximumRuntimeReached));
            }
        }

        if !self.window.is_full() {
            return Ok(ExitDecision::proceed());
        }

        let (smoothed_reward, smoothed_length) = self.advance_smoothing();
        tracing::debug!(
            episodes = self.episode_count,
            smoothed_reward,
            smoothed_length,
            best = self.best_avg_reward,
            "Evaluated rolling window"
        );

        if let Some(target) = self.config.target_episode_reward {
            let floor_met = match self.config.min_reward_threshold {
                Some(floor) => self.window.min_reward().is_some_and(|min| min >= floor),
                None => true,
            };
            if smoothed_reward >= target && floor_met {
                return Ok(ExitDecision::exit(ExitReason::RewardThresholdReached));
            }
        }
        if let Some(ceiling) = self.config.max_reward_threshold {
            if smoothed_reward > ceiling {
                return Ok(ExitDecision::exit(ExitReason::ExceededMaximumRewardThreshold));
            }
        }

        if self
            .config
            .improvement
            .is_improvement(smoothed_reward, self.best_avg_reward)
        {
            self.best_avg_reward = smoothed_reward;
            self.episodes_without_improvement = 0;
        } else {
            self.episodes_without_improvement += 1;
        }

        if let Some(patience) = self.config.max_episodes_without_improvement {
            if self.episodes_without_improvement >= patience {
                return Ok(ExitDecision::exit(ExitReason::NoImprovementForTooLong));
            }
        }

        Ok(ExitDecision::proceed())
    }

    /// Compute the smoothed reward/length for a full window, advancing the
    /// EMA recursion by one step.
    fn advance_smoothing(&mut self) -> (f64, f64) {
        let (mean_reward, mean_length) = self.window.mean().unwrap_or((0.0, 0.0));
        match self.config.smoothing_method {
            SmoothingMethod::Sma => (mean_reward, mean_length),
            SmoothingMethod::Ema => {
                let alpha = self.config.ema_alpha;
                let (latest_reward, latest_length) = self.window.latest().unwrap_or((0.0, 0.0));
                let reward = match self.ema_reward {
                    Some(prev) => alpha * latest_reward + (1.0 - alpha) * prev,
                    None => mean_reward,
                };
                let length = match self.ema_length {
                    Some(prev) => alpha * latest_length + (1.0 - alpha) * prev,
                    None => mean_length,
                };
                self.ema_reward = Some(reward);
                self.ema_length = Some(length);
                (reward, length)
            }
        }
    }

    /// Current smoothed values without advancing any recursion.
    fn current_smoothing(&self) -> Option<(f64, f64)> {
        let mean = self.window.mean()?;
        match (self.config.smoothing_method, self.ema_reward, self.ema_length) {
            (SmoothingMethod::Ema, Some(reward), Some(length)) => Some((reward, length)),
            _ => Some(mean),
        }
    }

    pub fn status(&self) -> MonitorStatus {
        let smoothed = self.current_smoothing();
        MonitorStatus {
            episode_count: self.episode_count,
            total_steps: self.total_steps,
            runtime_seconds: self.start.elapsed().as_secs_f64(),
            smoothed_reward: smoothed.map(|(r, _)| r),
            smoothed_length: smoothed.map(|(_, l)| l),
            best_avg_reward: self.best_avg_reward.is_finite().then_some(self.best_avg_reward),
            episodes_without_improvement: self.episodes_without_improvement,
            window_len: self.window.len(),
            window_capacity: self.window.capacity(),
            smoothing_method: self.config.smoothing_method,
        }
    }

    /// Switch smoothing method mid-run. The EMA is re-seeded on the next
    /// full-window evaluation.
    pub fn set_smoothing_method(&mut self, method: SmoothingMethod, alpha: Option<f64>) -> Result<()> {
        let alpha = alpha.unwrap_or(self.config.ema_alpha);
        if method == SmoothingMethod::Ema {
            validate_alpha(alpha)?;
        }
        self.config.smoothing_method = method;
        self.config.ema_alpha = alpha;
        self.ema_reward = None;
        self.ema_length = None;
        Ok(())
    }

    /// Restart the clock and forget every episode.
    pub fn reset(&mut self) {
        self.start = Instant::now();
        self.window.clear();
        self.history.clear();
        self.total_steps = 0;
        self.episode_count = 0;
        self.best_avg_reward = f64::NEG_INFINITY;
        self.episodes_without_improvement = 0;
        self.ema_reward = None;
        self.ema_length = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::ImprovementStrategy;

    /// Feed one single-env completion per call.
    fn feed(monitor: &mut StoppingMonitor, reward: f64) -> ExitDecision {
        let steps = monitor.total_steps() + 1;
        monitor.evaluate(steps, &[true], &[reward], &[1]).unwrap()
    }

    #[test]
    fn test_sma_over_full_window() {
        let mut monitor = StoppingMonitor::new(StoppingConfig::default().with_window(3)).unwrap();
        feed(&mut monitor, 1.0);
        feed(&mut monitor, 2.0);
        assert_eq!(monitor.best_avg_reward(), f64::NEG_INFINITY);
        feed(&mut monitor, 3.0);
        assert_eq!(monitor.best_avg_reward(), 2.0);
        assert_eq!(monitor.status().smoothed_reward, Some(2.0));
    }

    #[test]
    fn test_ema_seeds_then_recurses() {
        let config = StoppingConfig::default().with_window(3).ema(0.5);
        let mut monitor = StoppingMonitor::new(config).unwrap();
        for r in [1.0, 2.0, 3.0] {
            feed(&mut monitor, r);
        }
        assert_eq!(monitor.status().smoothed_reward, Some(2.0));
        feed(&mut monitor, 4.0);
        assert_eq!(monitor.status().smoothed_reward, Some(3.0));
        assert_eq!(monitor.best_avg_reward(), 3.0);
    }

    #[test]
    fn test_ema_tracks_lengths_separately() {
        let config = StoppingConfig::default().with_window(3).ema(0.5);
        let mut monitor = StoppingMonitor::new(config).unwrap();
        for (i, length) in [1u64, 2, 3].into_iter().enumerate() {
            monitor.evaluate(i as u64 + 1, &[true], &[10.0], &[length]).unwrap();
        }
        let status = monitor.status();
        assert_eq!(status.smoothed_length, Some(2.0));
        assert_eq!(status.smoothed_reward, Some(10.0));

        monitor.evaluate(4, &[true], &[10.0], &[6]).unwrap();
        let status = monitor.status();
        assert_eq!(status.smoothed_length, Some(4.0));
        assert_eq!(status.smoothed_reward, Some(10.0));
    }

    #[test]
    fn test_ema_advances_once_per_call() {
        let config = StoppingConfig::default().with_window(2).ema(0.5);
        let mut monitor = StoppingMonitor::new(config).unwrap();
        // Seeds at mean(2, 4) = 3.
        monitor.evaluate(2, &[true, true], &[2.0, 4.0], &[1, 1]).unwrap();
        assert_eq!(monitor.status().smoothed_reward, Some(3.0));
        // Two completions in one call: one recursion step with the newest (env 1) reward.
        monitor.evaluate(4, &[true, true], &[0.0, 8.0], &[1, 1]).unwrap();
        assert_eq!(monitor.status().smoothed_reward, Some(5.5));
    }

    #[test]
    fn test_plateau_triggers_on_second_non_improvement() {
        let config = StoppingConfig::default().with_window(1).with_patience(2);
        let mut monitor = StoppingMonitor::new(config).unwrap();
        assert!(!feed(&mut monitor, 5.0).should_exit);
        assert!(!feed(&mut monitor, 5.0).should_exit);
        let decision = feed(&mut monitor, 5.0);
        assert!(decision.should_exit);
        assert_eq!(decision.reason, ExitReason::NoImprovementForTooLong);
    }

    #[test]
    fn test_improvement_resets_counter() {
        let config = StoppingConfig::default().with_window(1).with_patience(2);
        let mut monitor = StoppingMonitor::new(config).unwrap();
        feed(&mut monitor, 5.0);
        feed(&mut monitor, 4.0);
        assert_eq!(monitor.status().episodes_without_improvement, 1);
        feed(&mut monitor, 6.0);
        assert_eq!(monitor.status().episodes_without_improvement, 0);
        assert!(!feed(&mut monitor, 6.0).should_exit);
    }

    #[test]
    fn test_episode_limit_beats_reward_target() {
        let config = StoppingConfig::default()
            .with_window(1)
            .with_max_episodes(1)
            .with_target_reward(0.0);
        let mut monitor = StoppingMonitor::new(config).unwrap();
        let decision = feed(&mut monitor, 10.0);
        assert_eq!(decision, ExitDecision::exit(ExitReason::MaximumEpisodesReached));
    }

    #[test]
    fn test_step_limit_and_runtime() {
        let config = StoppingConfig::default().with_max_total_steps(10);
        let mut monitor = StoppingMonitor::new(config).unwrap();
        let decision = monitor.evaluate(10, &[true], &[0.0], &[10]).unwrap();
        assert_eq!(decision.reason, ExitReason::MaximumTotalStepsReached);

        let config = StoppingConfig::default().with_max_runtime(0.0);
        let mut monitor = StoppingMonitor::new(config).unwrap();
        assert_eq!(feed(&mut monitor, 0.0).reason, ExitReason::MaximumRuntimeReached);
    }

    #[test]
    fn test_target_requires_floor() {
        let config = StoppingConfig::default()
            .with_window(2)
            .with_target_reward(5.0)
            .with_min_reward(3.0);
        let mut monitor = StoppingMonitor::new(config).unwrap();
        feed(&mut monitor, 8.0);
        // mean 5.0 but min 2.0 < 3.0
        assert!(!feed(&mut monitor, 2.0).should_exit);
        // window [2, 9]: mean 5.5, min 2.0
        assert!(!feed(&mut monitor, 9.0).should_exit);
        // window [9, 4]: mean 6.5, min 4.0
        assert_eq!(feed(&mut monitor, 4.0).reason, ExitReason::RewardThresholdReached);
    }

    #[test]
    fn test_reward_ceiling() {
        let config = StoppingConfig::default().with_window(1).with_max_reward(10.0);
        let mut monitor = StoppingMonitor::new(config).unwrap();
        assert!(!feed(&mut monitor, 10.0).should_exit);
        assert_eq!(
            feed(&mut monitor, 10.5).reason,
            ExitReason::ExceededMaximumRewardThreshold
        );
    }

    #[test]
    fn test_absolute_delta_strategy() {
        let config = StoppingConfig::default()
            .with_window(1)
            .with_patience(2)
            .with_improvement(ImprovementStrategy::AbsoluteDelta { min_delta: 1.0 });
        let mut monitor = StoppingMonitor::new(config).unwrap();
        feed(&mut monitor, 1.0);
        assert!(!feed(&mut monitor, 1.5).should_exit);
        assert_eq!(feed(&mut monitor, 1.9).reason, ExitReason::NoImprovementForTooLong);
        assert_eq!(monitor.best_avg_reward(), 1.0);
    }

    #[test]
    fn test_status_is_read_only() {
        let config = StoppingConfig::default().with_window(2).ema(0.5);
        let mut monitor = StoppingMonitor::new(config).unwrap();
        feed(&mut monitor, 1.0);
        feed(&mut monitor, 3.0);
        feed(&mut monitor, 5.0);

        let before = monitor.status();
        let window_before: Vec<_> = monitor.window().iter().collect();
        for _ in 0..5 {
            let again = monitor.status();
            assert_eq!(again.episode_count, before.episode_count);
            assert_eq!(again.best_avg_reward, before.best_avg_reward);
            assert_eq!(again.smoothed_reward, before.smoothed_reward);
        }
        assert_eq!(monitor.window().iter().collect::<Vec<_>>(), window_before);
    }

    #[test]
    fn test_reconfigure_reseeds_ema() {
        let config = StoppingConfig::default().with_window(2).ema(0.5);
        let mut monitor = StoppingMonitor::new(config).unwrap();
        feed(&mut monitor, 2.0);
        feed(&mut monitor, 4.0);
        feed(&mut monitor, 10.0);
        assert_eq!(monitor.status().smoothed_reward, Some(6.5));

        monitor.set_smoothing_method(SmoothingMethod::Ema, Some(0.25)).unwrap();
        // Cleared EMA falls back to the window mean until re-seeded.
        assert_eq!(monitor.status().smoothed_reward, Some(7.0));
        feed(&mut monitor, 0.0);
        assert_eq!(monitor.status().smoothed_reward, Some(5.0));

        assert!(monitor
            .set_smoothing_method(SmoothingMethod::Ema, Some(0.0))
            .is_err());
    }

    #[test]
    fn test_invalid_calls() {
        let mut monitor = StoppingMonitor::new(StoppingConfig::default()).unwrap();
        assert!(matches!(
            monitor.evaluate(1, &[false, false], &[0.0, 0.0], &[1, 1]),
            Err(RlearnError::InvalidArgument(_))
        ));
        assert!(matches!(
            monitor.evaluate(1, &[true, false], &[0.0], &[1, 1]),
            Err(RlearnError::InvalidArgument(_))
        ));
        assert_eq!(monitor.episode_count(), 0);
    }

    #[test]
    fn test_invalid_config_fails_at_construction() {
        assert!(matches!(
            StoppingMonitor::new(StoppingConfig::default().ema(0.0)),
            Err(RlearnError::Configuration(_))
        ));
    }

    #[test]
    fn test_reset_clears_everything() {
        let config = StoppingConfig::default().with_window(1);
        let mut monitor = StoppingMonitor::new(config).unwrap();
        feed(&mut monitor, 3.0);
        monitor.reset();
        let status = monitor.status();
        assert_eq!(status.episode_count, 0);
        assert_eq!(status.window_len, 0);
        assert_eq!(status.best_avg_reward, None);
        assert!(monitor.history().is_empty());
    }
}
