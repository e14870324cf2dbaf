//! Checkpoint and final-model persistence.
//!
//! Provides:
//! - `CheckpointPolicy` for the episode-count checkpoint cadence
//! - `CheckpointManager` for writing, listing and rotating checkpoints
//! - `FinalModelConfig` for the end-of-training model path
//!
//! The bytes themselves are written by the agent; this module only decides
//! where and when.

mod final_model;
mod manager;
mod state;

pub use final_model::FinalModelConfig;
pub use manager::{CheckpointManager, CheckpointPolicy};
pub use state::CheckpointMetadata;
