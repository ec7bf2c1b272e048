//! Random-walk proposals for Metropolis–Hastings.

use ndarray::Array1;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::{Result, SamplerError};

/// Generates a candidate state from the current one.
///
/// Implementors must be symmetric, `q(x' | x) = q(x | x')`: the sampler does not apply a
/// Hastings correction.
pub trait Proposal {
    fn propose<R: Rng + ?Sized>(&self, current: &Array1<f64>, rng: &mut R) -> Array1<f64>;
}

/// Gaussian random walk `x' = x + ε Z` with `Z ~ N(0, I)`.
///
/// The proposal carries no state between calls; all randomness comes from the
/// caller's generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalProposal {
    step_size: f64,
}

impl NormalProposal {
    /// A zero step size is allowed and proposes the current state again.
    pub fn new(step_size: f64) -> Result<Self> {
        if !(step_size.is_finite() && step_size >= 0.0) {
            return Err(SamplerError::invalid(
                "step_size",
                step_size,
                "must be finite and non-negative",
            ));
        }
        Ok(Self { step_size })
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }
}

impl Proposal for NormalProposal {
    fn propose<R: Rng + ?Sized>(&self, current: &Array1<f64>, rng: &mut R) -> Array1<f64> {
        current.mapv(|x| x + self.step_size * rng.sample::<f64, _>(StandardNormal))
    }
}
