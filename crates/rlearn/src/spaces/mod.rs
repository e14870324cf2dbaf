//! Observation and action space types.
//!
//! Spaces describe the shape of a single environment's observations and
//! actions. The orchestrator uses the observation shape to build zero-filled
//! placeholder rows, and agents use the action space to size their outputs.

mod r#box;

pub use r#box::Box;

use ndarray::{ArrayD, IxDyn};
use rand::Rng;

/// Trait for observation and action spaces
pub trait Space: Clone + Send + Sync {
    /// The type of samples from this space
    type Sample;

    /// Sample a random element from this space
    fn sample<R: Rng>(&self, rng: &mut R) -> Self::Sample;

    /// Check if a value is contained in this space
    fn contains(&self, value: &Self::Sample) -> bool;

    /// Get the shape of samples from this space
    fn shape(&self) -> &[usize];

    /// Get the total number of elements in a sample
    fn num_elements(&self) -> usize {
        self.shape().iter().product()
    }
}

/// Action indices `0..n`, carried as a single scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Discrete {
    pub n: usize,
}

impl Discrete {
    /// # Panics
    /// If `n` is zero.
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "Discrete space needs at least one value");
        Self { n }
    }
}

impl Space for Discrete {
    type Sample = usize;

    fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        rng.gen_range(0..self.n)
    }

    fn contains(&self, value: &usize) -> bool {
        *value < self.n
    }

    fn shape(&self) -> &[usize] {
        &[1]
    }
}

/// Enum for dynamic space types
#[derive(Clone, Debug, PartialEq)]
pub enum DynSpace {
    Discrete(Discrete),
    Box(Box),
}

impl DynSpace {
    /// Get the shape of this space
    pub fn shape(&self) -> Vec<usize> {
        match self {
            DynSpace::Discrete(s) => s.shape().to_vec(),
            DynSpace::Box(s) => s.shape().to_vec(),
        }
    }

    /// Number of scalars in one flattened sample
    pub fn flat_size(&self) -> usize {
        match self {
            DynSpace::Discrete(s) => s.num_elements(),
            DynSpace::Box(s) => s.num_elements(),
        }
    }

    /// Sample from this space
    pub fn sample<R: Rng>(&self, rng: &mut R) -> ArrayD<f32> {
        match self {
            DynSpace::Discrete(s) => ArrayD::from_elem(IxDyn(&[1]), s.sample(rng) as f32),
            DynSpace::Box(s) => s.sample(rng),
        }
    }

    /// Check if this space contains the value
    pub fn contains(&self, value: &ArrayD<f32>) -> bool {
        match self {
            DynSpace::Discrete(s) => match value.iter().next() {
                Some(&v) if value.len() == 1 && v >= 0.0 => s.contains(&(v.round() as usize)),
                _ => false,
            },
            DynSpace::Box(s) => s.contains(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_flat_size_of_each_kind() {
        assert_eq!(DynSpace::Box(Box::uniform(&[2, 3], -1.0, 1.0)).flat_size(), 6);
        let discrete = DynSpace::Discrete(Discrete::new(4));
        assert_eq!(discrete.flat_size(), 1);
        assert_eq!(discrete.shape(), vec![1]);
    }

    #[test]
    fn test_discrete_samples_stay_below_n() {
        let space = Discrete::new(4);
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        assert!((0..100).all(|_| space.sample(&mut rng) < 4));
        assert!(space.contains(&3));
        assert!(!space.contains(&4));
    }

    #[test]
    #[should_panic(expected = "at least one value")]
    fn test_empty_discrete_panics() {
        Discrete::new(0);
    }

    #[test]
    fn test_dyn_sample_is_contained() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let spaces = [
            DynSpace::Discrete(Discrete::new(3)),
            DynSpace::Box(Box::uniform(&[4], 0.0, 2.0)),
        ];
        for space in &spaces {
            for _ in 0..50 {
                assert!(space.contains(&space.sample(&mut rng)));
            }
        }
    }

    #[test]
    fn test_discrete_rejects_negative() {
        let space = DynSpace::Discrete(Discrete::new(3));
        assert!(!space.contains(&ArrayD::from_elem(IxDyn(&[1]), -1.0)));
        assert!(!space.contains(&ArrayD::from_elem(IxDyn(&[2]), 1.0)));
    }
}
