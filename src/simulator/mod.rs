//! Synthetic constellation and measurement generation, used to exercise
//! and validate the estimator end to end.
pub mod bias;
pub mod constellation;
pub mod measurements;

use rand::Rng;
use rand_distr::StandardNormal;

/// Source of standard normal draws. Satisfied by any [rand::Rng]; the
/// generators consume a deterministic number of draws per call so that
/// seeded runs are reproducible.
pub trait GaussianSource {
    /// Next draw from N(0, 1).
    fn next_gaussian(&mut self) -> f64;
}

impl<R: Rng> GaussianSource for R {
    fn next_gaussian(&mut self) -> f64 {
        self.sample(StandardNormal)
    }
}
