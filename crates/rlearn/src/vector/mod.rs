//! Vectorized environment backends.
//!
//! A backend advances a batch of independent environments as one logical
//! step. Batching here is data-parallel within a single call; there is no
//! cross-thread execution.

mod serial;
mod vecenv;

pub use serial::Serial;
pub use vecenv::{VecEnvBackend, VecEnvResult};
