//! Stopping and orchestrator configuration.

use crate::checkpoint::FinalModelConfig;
use crate::{Result, RlearnError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reward smoothing applied over the rolling window
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmoothingMethod {
    /// Simple moving average over the window
    #[default]
    Sma,
    /// Exponential moving average, seeded from the window mean
    Ema,
}

impl SmoothingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SmoothingMethod::Sma => "sma",
            SmoothingMethod::Ema => "ema",
        }
    }
}

impl fmt::Display for SmoothingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SmoothingMethod {
    type Err = RlearnError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sma" => Ok(SmoothingMethod::Sma),
            "ema" => Ok(SmoothingMethod::Ema),
            other => Err(RlearnError::Configuration(format!(
                "unknown smoothing method '{}', expected 'sma' or 'ema'",
                other
            ))),
        }
    }
}

/// How a new smoothed reward is judged against the best one seen so far
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ImprovementStrategy {
    /// Any strictly higher smoothed reward is an improvement
    #[default]
    Streak,
    /// Must beat the best by more than `min_delta`
    AbsoluteDelta { min_delta: f64 },
    /// Must beat the best by more than `min_ratio` of its magnitude
    RelativeRatio { min_ratio: f64 },
}

impl ImprovementStrategy {
    /// Whether `smoothed` counts as an improvement over `best`.
    ///
    /// `best` is negative infinity until the first full-window evaluation,
    /// which always counts as an improvement.
    pub fn is_improvement(&self, smoothed: f64, best: f64) -> bool {
        if best == f64::NEG_INFINITY {
            return true;
        }
        match *self {
            ImprovementStrategy::Streak => smoothed > best,
            ImprovementStrategy::AbsoluteDelta { min_delta } => smoothed > best + min_delta,
            ImprovementStrategy::RelativeRatio { min_ratio } => {
                if best == 0.0 {
                    smoothed > 0.0
                } else {
                    (smoothed - best) / best.abs() > min_ratio
                }
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let (name, value) = match *self {
            ImprovementStrategy::Streak => return Ok(()),
            ImprovementStrategy::AbsoluteDelta { min_delta } => ("min_delta", min_delta),
            ImprovementStrategy::RelativeRatio { min_ratio } => ("min_ratio", min_ratio),
        };
        if !value.is_finite() || value < 0.0 {
            return Err(RlearnError::Configuration(format!(
                "{} must be a finite non-negative number, got {}",
                name, value
            )));
        }
        Ok(())
    }
}

/// Early-stopping criteria evaluated by the [`StoppingMonitor`](super::StoppingMonitor).
///
/// Every limit is optional; an unset limit never triggers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoppingConfig {
    /// Stop once this many environment steps (summed over the batch) ran
    pub max_total_steps: Option<u64>,
    /// Stop after this much wall-clock time, in seconds
    pub max_runtime: Option<f64>,
    /// Stop once this many episodes completed
    pub max_episodes: Option<u64>,
    /// Stop once the smoothed episode reward reaches this value
    pub target_episode_reward: Option<f64>,
    /// Number of most recent episodes used for smoothing
    pub reward_window_size: usize,
    /// Every episode in the window must reach this before the target counts
    pub min_reward_threshold: Option<f64>,
    /// Stop if the smoothed reward exceeds this value
    pub max_reward_threshold: Option<f64>,
    /// Stop after this many consecutive non-improving evaluations
    pub max_episodes_without_improvement: Option<u64>,
    pub smoothing_method: SmoothingMethod,
    /// EMA smoothing coefficient, in (0, 1]
    pub ema_alpha: f64,
    pub improvement: ImprovementStrategy,
}

impl Default for StoppingConfig {
    fn default() -> Self {
        Self {
            max_total_steps: None,
            max_runtime: None,
            max_episodes: None,
            target_episode_reward: None,
            reward_window_size: 100,
            min_reward_threshold: None,
            max_reward_threshold: None,
            max_episodes_without_improvement: None,
            smoothing_method: SmoothingMethod::Sma,
            ema_alpha: 0.2,
            improvement: ImprovementStrategy::Streak,
        }
    }
}

impl StoppingConfig {
    /// Parse a JSON document, validating the result.
    ///
    /// Malformed values (such as an unknown smoothing method) are reported as
    /// configuration errors rather than syntax errors.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            if e.is_data() {
                RlearnError::Configuration(e.to_string())
            } else {
                RlearnError::Serialization(e)
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the monitor relies on.
    pub fn validate(&self) -> Result<()> {
        if self.reward_window_size == 0 {
            return Err(RlearnError::Configuration(
                "reward_window_size must be at least 1".to_string(),
            ));
        }
        if self.smoothing_method == SmoothingMethod::Ema {
            validate_alpha(self.ema_alpha)?;
        }
        if let Some(runtime) = self.max_runtime {
            if runtime.is_nan() || runtime < 0.0 {
                return Err(RlearnError::Configuration(format!(
                    "max_runtime must be non-negative, got {}",
                    runtime
                )));
            }
        }
        self.improvement.validate()
    }

    /// Set the episode limit
    pub fn with_max_episodes(mut self, episodes: u64) -> Self {
        self.max_episodes = Some(episodes);
        self
    }

    /// Set the total step limit
    pub fn with_max_total_steps(mut self, steps: u64) -> Self {
        self.max_total_steps = Some(steps);
        self
    }

    /// Set the wall-clock limit in seconds
    pub fn with_max_runtime(mut self, seconds: f64) -> Self {
        self.max_runtime = Some(seconds);
        self
    }

    /// Set the smoothed reward target
    pub fn with_target_reward(mut self, reward: f64) -> Self {
        self.target_episode_reward = Some(reward);
        self
    }

    /// Set the per-episode floor required alongside the target
    pub fn with_min_reward(mut self, reward: f64) -> Self {
        self.min_reward_threshold = Some(reward);
        self
    }

    /// Set the smoothed reward ceiling
    pub fn with_max_reward(mut self, reward: f64) -> Self {
        self.max_reward_threshold = Some(reward);
        self
    }

    /// Set the rolling window size
    pub fn with_window(mut self, size: usize) -> Self {
        self.reward_window_size = size;
        self
    }

    /// Set the plateau patience
    pub fn with_patience(mut self, evaluations: u64) -> Self {
        self.max_episodes_without_improvement = Some(evaluations);
        self
    }

    /// Use simple moving average smoothing
    pub fn sma(mut self) -> Self {
        self.smoothing_method = SmoothingMethod::Sma;
        self
    }

    /// Use exponential moving average smoothing
    pub fn ema(mut self, alpha: f64) -> Self {
        self.smoothing_method = SmoothingMethod::Ema;
        self.ema_alpha = alpha;
        self
    }

    /// Set the improvement strategy
    pub fn with_improvement(mut self, strategy: ImprovementStrategy) -> Self {
        self.improvement = strategy;
        self
    }
}

pub(crate) fn validate_alpha(alpha: f64) -> Result<()> {
    if alpha > 0.0 && alpha <= 1.0 {
        Ok(())
    } else {
        Err(RlearnError::Configuration(format!(
            "ema_alpha must be in (0, 1], got {}",
            alpha
        )))
    }
}

/// Settings for the training loop itself
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Seed passed to the single environment reset
    pub seed: Option<u64>,
    /// Emit progress metrics every N epochs (0 disables)
    pub log_interval: usize,
    /// Draw a terminal progress bar
    pub show_progress: bool,
    /// Where the final model is written
    pub final_model: FinalModelConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            log_interval: 10,
            show_progress: false,
            final_model: FinalModelConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Set the reset seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the logging interval in epochs
    pub fn with_log_interval(mut self, epochs: usize) -> Self {
        self.log_interval = epochs;
        self
    }

    /// Enable/disable the progress bar
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Set the final model destination
    pub fn with_final_model(mut self, final_model: FinalModelConfig) -> Self {
        self.final_model = final_model;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothing_method_parse() {
        assert_eq!("sma".parse::<SmoothingMethod>().unwrap(), SmoothingMethod::Sma);
        assert_eq!(" EMA ".parse::<SmoothingMethod>().unwrap(), SmoothingMethod::Ema);
        assert!(matches!(
            "wma".parse::<SmoothingMethod>(),
            Err(RlearnError::Configuration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_alpha_only_for_ema() {
        let mut config = StoppingConfig::default();
        config.ema_alpha = 0.0;
        assert!(config.validate().is_ok());

        let config = StoppingConfig::default().ema(0.0);
        assert!(matches!(config.validate(), Err(RlearnError::Configuration(_))));
        let config = StoppingConfig::default().ema(1.5);
        assert!(config.validate().is_err());
        let config = StoppingConfig::default().ema(1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_window() {
        let config = StoppingConfig::default().with_window(0);
        assert!(matches!(config.validate(), Err(RlearnError::Configuration(_))));
    }

    #[test]
    fn test_from_json_defaults_and_unknown_method() {
        let config = StoppingConfig::from_json(r#"{"max_episodes": 50}"#).unwrap();
        assert_eq!(config.max_episodes, Some(50));
        assert_eq!(config.reward_window_size, 100);
        assert_eq!(config.smoothing_method, SmoothingMethod::Sma);

        let err = StoppingConfig::from_json(r#"{"smoothing_method": "median"}"#).unwrap_err();
        assert!(matches!(err, RlearnError::Configuration(_)));

        let err = StoppingConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, RlearnError::Serialization(_)));
    }

    #[test]
    fn test_from_json_improvement_strategy() {
        let config = StoppingConfig::from_json(
            r#"{"improvement": {"kind": "absolute_delta", "min_delta": 0.5}}"#,
        )
        .unwrap();
        assert_eq!(
            config.improvement,
            ImprovementStrategy::AbsoluteDelta { min_delta: 0.5 }
        );
    }

    #[test]
    fn test_improvement_strategies() {
        let streak = ImprovementStrategy::Streak;
        assert!(streak.is_improvement(-100.0, f64::NEG_INFINITY));
        assert!(streak.is_improvement(5.1, 5.0));
        assert!(!streak.is_improvement(5.0, 5.0));

        let delta = ImprovementStrategy::AbsoluteDelta { min_delta: 1.0 };
        assert!(!delta.is_improvement(5.5, 5.0));
        assert!(delta.is_improvement(6.5, 5.0));

        let ratio = ImprovementStrategy::RelativeRatio { min_ratio: 0.1 };
        assert!(!ratio.is_improvement(10.5, 10.0));
        assert!(ratio.is_improvement(11.5, 10.0));
        assert!(ratio.is_improvement(-8.0, -10.0));
        assert!(!ratio.is_improvement(-12.0, -10.0));
        assert!(ratio.is_improvement(0.1, 0.0));
    }

    #[test]
    fn test_negative_delta_is_rejected() {
        let config = StoppingConfig::default()
            .with_improvement(ImprovementStrategy::AbsoluteDelta { min_delta: -1.0 });
        assert!(config.validate().is_err());
    }
}
