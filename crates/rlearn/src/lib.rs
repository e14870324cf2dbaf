//! # rlearn
//!
//! Online training control loop for agents acting on a batch of parallel
//! environments, with a configurable early-stopping monitor.
//!
//! ## Overview
//!
//! rlearn provides:
//! - The `Env` trait for single environments and `VecEnvBackend` for batches
//! - A serial vectorization backend that advances every environment in lockstep
//! - `EpisodeAccumulator` for per-environment running returns and lengths
//! - `StoppingMonitor` with SMA/EMA smoothing and ordered exit criteria
//! - `TrainingOrchestrator`, the epoch/step loop tying them together
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rlearn::prelude::*;
//! use rlearn_envs::CartPole;
//!
//! let backend = Serial::new(CartPole::new, 8);
//! let agent = RandomAgent::new(backend.action_space(), 42);
//!
//! let mut orchestrator = TrainingOrchestrator::new(agent).with_env(backend);
//! let stopping = StoppingConfig::default()
//!     .with_window(20)
//!     .with_target_reward(195.0);
//! let summary = orchestrator.run(100, 500, stopping, CheckpointPolicy::disabled())?;
//! println!("{:?}", summary.exit_reason);
//! ```

pub mod agent;
pub mod checkpoint;
pub mod env;
pub mod i18n;
pub mod log;
pub mod spaces;
pub mod training;
pub mod utils;
pub mod vector;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::agent::{EpisodeEnd, PolicyAgent, RandomAgent, Transition};
    pub use crate::checkpoint::{
        CheckpointManager, CheckpointMetadata, CheckpointPolicy, FinalModelConfig,
    };
    pub use crate::env::{Env, EnvInfo, StepResult};
    pub use crate::i18n::Translator;
    pub use crate::log::{CompositeLogger, ConsoleLogger, MetricLogger, NoOpLogger};
    pub use crate::spaces::{Box as BoxSpace, Discrete, DynSpace, Space};
    pub use crate::training::{
        EpisodeAccumulator, ExitDecision, ExitReason, ImprovementStrategy, MonitorStatus,
        OrchestratorConfig, SmoothingMethod, StoppingConfig, StoppingMonitor,
        TrainingOrchestrator, TrainingSummary,
    };
    pub use crate::vector::{Serial, VecEnvBackend, VecEnvResult};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for the library
#[derive(Debug, thiserror::Error)]
pub enum RlearnError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Environment error: {0}")]
    Environment(String),

    #[error("Policy error: {0}")]
    Policy(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, RlearnError>;
