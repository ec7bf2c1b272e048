/*!
Run configurations.

A configuration is a plain value that fully describes one sampler run apart from the
target itself. It is validated once, before the first iteration, and is never mutated
while the run is in progress.

If no seed is set, one is drawn from the thread-local generator at construction time, so
every configuration carries the seed that reproduces it.

# Examples

```rust
use verlet_mcmc::config::HmcConfig;

let config = HmcConfig::new(0.1, 50, 10_000, &[1.0]).set_seed(42);
assert!(config.validate().is_ok());
assert_eq!(config.seed, 42);

let bad = HmcConfig::new(-0.1, 50, 10_000, &[1.0]);
assert!(bad.validate().is_err());
```
*/

use ndarray::Array1;
use rand::{thread_rng, Rng};

use crate::error::{Result, SamplerError};
use crate::integrator::LeapFrog;

pub(crate) fn validate_step_size(step_size: f64) -> Result<()> {
    if step_size.is_finite() && step_size >= 0.0 {
        Ok(())
    } else {
        Err(SamplerError::invalid(
            "step_size",
            step_size,
            "must be finite and non-negative",
        ))
    }
}

pub(crate) fn validate_n_leapfrog(n_leapfrog: usize) -> Result<()> {
    if n_leapfrog == 0 {
        return Err(SamplerError::invalid(
            "n_leapfrog",
            0.0,
            "at least one integration step is required",
        ));
    }
    Ok(())
}

fn validate_n_samples(n_samples: usize) -> Result<()> {
    if n_samples == 0 {
        return Err(SamplerError::invalid(
            "n_samples",
            0.0,
            "at least one sample is required",
        ));
    }
    Ok(())
}

fn validate_initial_state(name: &'static str, state: &Array1<f64>) -> Result<()> {
    if state.is_empty() {
        return Err(SamplerError::invalid(name, 0.0, "must not be empty"));
    }
    if let Some(&bad) = state.iter().find(|v| !v.is_finite()) {
        return Err(SamplerError::invalid(name, bad, "must be finite"));
    }
    Ok(())
}

/// Configuration of one Metropolis–Hastings run with a Gaussian random-walk proposal.
#[derive(Debug, Clone, PartialEq)]
pub struct MhConfig {
    /// Standard deviation of the random-walk increment.
    pub step_size: f64,
    /// Number of iterations, and therefore the length of the chain.
    pub n_samples: usize,
    /// Starting state `x0`.
    pub initial_state: Array1<f64>,
    /// Seed of the run's generator.
    pub seed: u64,
}

impl MhConfig {
    pub fn new(step_size: f64, n_samples: usize, initial_state: &[f64]) -> Self {
        Self {
            step_size,
            n_samples,
            initial_state: Array1::from(initial_state.to_vec()),
            seed: thread_rng().gen::<u64>(),
        }
    }

    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn set_step_size(mut self, step_size: f64) -> Self {
        self.step_size = step_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_step_size(self.step_size)?;
        self.validate_run()
    }

    /// Checks everything but the step size, which a custom proposal replaces.
    pub(crate) fn validate_run(&self) -> Result<()> {
        validate_n_samples(self.n_samples)?;
        validate_initial_state("initial_state", &self.initial_state)
    }
}

/// Configuration of one Hamiltonian Monte Carlo run with the leapfrog integrator.
///
/// Masses and target parameters belong to the model, not to the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct HmcConfig {
    /// Leapfrog step size `ε`.
    pub step_size: f64,
    /// Leapfrog steps `L` per proposal.
    pub n_leapfrog: usize,
    /// Number of iterations, and therefore the length of the chain.
    pub n_samples: usize,
    /// Starting position `q0`.
    pub initial_position: Array1<f64>,
    /// Seed of the run's generator.
    pub seed: u64,
}

impl HmcConfig {
    pub fn new(
        step_size: f64,
        n_leapfrog: usize,
        n_samples: usize,
        initial_position: &[f64],
    ) -> Self {
        Self {
            step_size,
            n_leapfrog,
            n_samples,
            initial_position: Array1::from(initial_position.to_vec()),
            seed: thread_rng().gen::<u64>(),
        }
    }

    /// Picks `L = floor(t / ε)` so one trajectory covers integration time `t`.
    pub fn with_integration_time(
        step_size: f64,
        time: f64,
        n_samples: usize,
        initial_position: &[f64],
    ) -> Self {
        let n_leapfrog = if step_size > 0.0 && time.is_finite() {
            (time / step_size).floor() as usize
        } else {
            0
        };
        Self::new(step_size, n_leapfrog, n_samples, initial_position)
    }

    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn set_step_size(mut self, step_size: f64) -> Self {
        self.step_size = step_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_step_size(self.step_size)?;
        validate_n_leapfrog(self.n_leapfrog)?;
        self.validate_run()
    }

    /// Checks everything but the integration parameters, which a custom integrator
    /// replaces.
    pub(crate) fn validate_run(&self) -> Result<()> {
        validate_n_samples(self.n_samples)?;
        validate_initial_state("initial_position", &self.initial_position)
    }

    pub fn integrator(&self) -> LeapFrog {
        LeapFrog::new(self.step_size, self.n_leapfrog)
    }
}
