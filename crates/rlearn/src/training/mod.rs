//! Training loop and early stopping.
//!
//! - [`EpisodeAccumulator`] tracks running returns per environment
//! - [`StoppingMonitor`] decides when training should end
//! - [`TrainingOrchestrator`] runs the epoch/step loop

mod accumulator;
mod config;
mod monitor;
mod orchestrator;
mod window;

pub use accumulator::{CompletedEpisode, EpisodeAccumulator};
pub use config::{ImprovementStrategy, OrchestratorConfig, SmoothingMethod, StoppingConfig};
pub use monitor::{ExitDecision, ExitReason, MonitorStatus, StoppingMonitor};
pub use orchestrator::{TrainingOrchestrator, TrainingSummary};
pub use window::RollingWindow;
