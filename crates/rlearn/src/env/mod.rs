//! Environment traits.
//!
//! Provides the `Env` trait that single environments implement. Batches of
//! environments are assembled by the backends in [`crate::vector`].

mod traits;

pub use traits::{Env, EnvInfo, StepResult};
