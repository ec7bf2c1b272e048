//! A Hamiltonian (Hybrid) Monte Carlo sampler.
//!
//! Every iteration draws a fresh momentum `p0 ~ exp(-K(p))`, integrates Hamilton's
//! equations from `(p0, q)` for `L` leapfrog steps of size `ε`, negates the final momentum
//! and accepts the end point `(p', q')` with probability
//!
//! ```text
//! α = min(1, exp(H(p0, q) - H(p', q')))
//! ```
//!
//! The negation makes the proposal its own inverse. It does not change `K` for the
//! Gaussian kinetic energy, but the recorded momentum is the negated one.
//!
//! A non-finite value during integration, or a non-finite proposed energy, ends the run:
//! [`run`](HamiltonianMonteCarlo::run) returns the iterations completed so far with a
//! [`Diverged`](crate::core::RunStatus::Diverged) status.

use ndarray::Array1;
use rand::prelude::*;

use crate::config::{validate_n_leapfrog, validate_step_size, HmcConfig};
use crate::core::{run_chain, run_chain_progress, ChainOutput, MarkovChain, Transition};
use crate::error::{Result, SamplerError};
use crate::hamiltonian::Hamiltonian;
use crate::integrator::{Integrator, LeapFrog};

/// `min(1, exp(h_current - h_proposed))`, with `NaN` mapped to `0`.
pub fn acceptance_probability(h_current: f64, h_proposed: f64) -> f64 {
    let alpha = (h_current - h_proposed).exp();
    if alpha.is_nan() {
        0.0
    } else {
        alpha.clamp(0.0, 1.0)
    }
}

/// A single HMC chain.
///
/// # Examples
///
/// ```rust
/// use verlet_mcmc::config::HmcConfig;
/// use verlet_mcmc::hamiltonian::UnivariateNormal;
/// use verlet_mcmc::hmc::HamiltonianMonteCarlo;
///
/// let model = UnivariateNormal::new(1.0, 1.0).unwrap();
/// let config = HmcConfig::new(0.1, 20, 1_000, &[1.0]).set_seed(42);
/// let mut hmc = HamiltonianMonteCarlo::new(model, &config).unwrap();
/// let out = hmc.run();
///
/// assert!(out.is_completed());
/// assert_eq!(out.len(), 1_000);
/// assert_eq!(out.momenta.unwrap().dim(), (1_000, 1));
/// ```
#[derive(Debug, Clone)]
pub struct HamiltonianMonteCarlo<H, I = LeapFrog> {
    /// The model providing energies and gradients.
    pub model: H,
    /// The integrator used to build each proposal.
    pub integrator: I,
    position: Array1<f64>,
    n_samples: usize,
    /// The seed the generator was initialized with.
    pub seed: u64,
    rng: SmallRng,
}

impl<H: Hamiltonian> HamiltonianMonteCarlo<H, LeapFrog> {
    /// Creates a sampler with the leapfrog integrator described by `config`.
    pub fn new(model: H, config: &HmcConfig) -> Result<Self> {
        Self::with_integrator(model, config.integrator(), config)
    }
}

impl<H: Hamiltonian, I: Integrator> HamiltonianMonteCarlo<H, I> {
    /// Creates a sampler with a custom integrator. The integrator's step size and number
    /// of steps are used and validated; those of `config` are ignored.
    pub fn with_integrator(model: H, integrator: I, config: &HmcConfig) -> Result<Self> {
        validate_step_size(integrator.step_size())?;
        validate_n_leapfrog(integrator.n_steps())?;
        config.validate_run()?;
        let found = config.initial_position.len();
        if found != model.dim() {
            return Err(SamplerError::DimensionMismatch {
                expected: model.dim(),
                found,
            });
        }
        Ok(Self {
            model,
            integrator,
            position: config.initial_position.clone(),
            n_samples: config.n_samples,
            seed: config.seed,
            rng: SmallRng::seed_from_u64(config.seed),
        })
    }

    /// Runs the configured number of iterations.
    pub fn run(&mut self) -> ChainOutput {
        let n = self.n_samples;
        run_chain(self, n)
    }

    /// Like [`HamiltonianMonteCarlo::run`], with a progress bar.
    pub fn run_progress(&mut self) -> ChainOutput {
        let n = self.n_samples;
        run_chain_progress(self, n, "HMC")
    }
}

impl<H: Hamiltonian, I: Integrator> MarkovChain for HamiltonianMonteCarlo<H, I> {
    fn step(&mut self) -> Result<Transition> {
        let p0 = self.model.sample_momentum(&mut self.rng);
        let h0 = self.model.hamiltonian(&p0, &self.position);

        let (p1, q1) = self.integrator.integrate(&self.model, &p0, &self.position)?;
        let p1 = -p1;
        let h1 = self.model.hamiltonian(&p1, &q1);
        if !h1.is_finite() {
            return Err(SamplerError::NumericInstability {
                step: self.integrator.n_steps(),
            });
        }

        let alpha = acceptance_probability(h0, h1);
        let u: f64 = self.rng.gen();
        let accepted = u < alpha;
        let (momentum, energy) = if accepted {
            self.position = q1;
            (p1, h1)
        } else {
            (p0, h0)
        };
        Ok(Transition {
            accepted,
            acceptance_prob: alpha,
            energy,
            momentum: Some(momentum),
        })
    }

    fn current_state(&self) -> &Array1<f64> {
        &self.position
    }
}
