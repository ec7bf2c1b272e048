/*!
# Metropolis–Hastings Sampler

A random-walk Metropolis–Hastings sampler for any target implementing [`Target`] and any
symmetric proposal implementing [`Proposal`].

Each iteration proposes `x'` from the current state `x`, accepts it with probability

```text
α = min(1, f(x') / f(x))
```

and records the retained state, so a rejection repeats `x` at the new index. The chain
therefore always has exactly `n_samples` rows.

## Example Usage

```rust
use verlet_mcmc::config::MhConfig;
use verlet_mcmc::distributions::Weibull;
use verlet_mcmc::metropolis_hastings::MetropolisHastings;

let target = Weibull::new(5.0, 1.0).unwrap();
let config = MhConfig::new(0.4, 5_000, &[0.5]).set_seed(42);
let mut mh = MetropolisHastings::new(target, &config).unwrap();
let out = mh.run();

assert_eq!(out.len(), 5_000);
assert!(out.accepted <= 5_000);
```
*/

use ndarray::Array1;
use rand::prelude::*;

use crate::config::MhConfig;
use crate::core::{run_chain, run_chain_progress, ChainOutput, MarkovChain, Transition};
use crate::distributions::Target;
use crate::error::{Result, SamplerError};
use crate::proposal::{NormalProposal, Proposal};

/**
Acceptance probability `min(1, proposed / current)` of a symmetric proposal.

The ratio is sanitized rather than trusted: `NaN` (both densities zero) and negative
ratios give `0`, `+∞` (leaving a zero-density state) gives `1`.

```rust
use verlet_mcmc::metropolis_hastings::acceptance_probability;

assert_eq!(acceptance_probability(0.2, 0.1), 0.5);
assert_eq!(acceptance_probability(0.1, 0.2), 1.0);
assert_eq!(acceptance_probability(0.0, 0.0), 0.0);
assert_eq!(acceptance_probability(0.0, 0.3), 1.0);
```
*/
pub fn acceptance_probability(current_density: f64, proposed_density: f64) -> f64 {
    let ratio = proposed_density / current_density;
    if ratio.is_nan() || ratio <= 0.0 {
        0.0
    } else {
        ratio.min(1.0)
    }
}

/// A single Metropolis–Hastings chain.
#[derive(Debug, Clone)]
pub struct MetropolisHastings<D, Q = NormalProposal> {
    /// The target distribution to sample from.
    pub target: D,
    /// The proposal used to generate candidate states.
    pub proposal: Q,
    current_state: Array1<f64>,
    current_density: f64,
    n_samples: usize,
    /// The seed the generator was initialized with.
    pub seed: u64,
    rng: SmallRng,
}

impl<D: Target> MetropolisHastings<D, NormalProposal> {
    /// Creates a sampler with a Gaussian random-walk proposal of width
    /// `config.step_size`.
    pub fn new(target: D, config: &MhConfig) -> Result<Self> {
        let proposal = NormalProposal::new(config.step_size)?;
        Self::with_proposal(target, proposal, config)
    }
}

impl<D: Target, Q: Proposal> MetropolisHastings<D, Q> {
    /// Creates a sampler with a custom symmetric proposal. `config.step_size` is ignored.
    pub fn with_proposal(target: D, proposal: Q, config: &MhConfig) -> Result<Self> {
        config.validate_run()?;
        let found = config.initial_state.len();
        if found != target.dim() {
            return Err(SamplerError::DimensionMismatch {
                expected: target.dim(),
                found,
            });
        }
        let current_state = config.initial_state.clone();
        let current_density = target.density(&current_state);
        Ok(Self {
            target,
            proposal,
            current_state,
            current_density,
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

    /// Like [`MetropolisHastings::run`], with a progress bar.
    pub fn run_progress(&mut self) -> ChainOutput {
        let n = self.n_samples;
        run_chain_progress(self, n, "MH")
    }
}

impl<D: Target, Q: Proposal> MarkovChain for MetropolisHastings<D, Q> {
    fn step(&mut self) -> Result<Transition> {
        let proposed = self.proposal.propose(&self.current_state, &mut self.rng);
        let proposed_density = self.target.density(&proposed);
        let alpha = acceptance_probability(self.current_density, proposed_density);

        let u: f64 = self.rng.gen();
        let accepted = u < alpha;
        if accepted {
            self.current_state = proposed;
            self.current_density = proposed_density;
        }
        Ok(Transition {
            accepted,
            acceptance_prob: alpha,
            energy: -self.current_density.ln(),
            momentum: None,
        })
    }

    fn current_state(&self) -> &Array1<f64> {
        &self.current_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::{Normal, NormalMixture, Weibull};
    use approx::assert_abs_diff_eq;
    use ndarray::arr1;

    fn normal_run(step_size: f64, n: usize, seed: u64) -> ChainOutput {
        let target = Normal::new(0.0, 1.0).unwrap();
        let config = MhConfig::new(step_size, n, &[0.0]).set_seed(seed);
        MetropolisHastings::new(target, &config).unwrap().run()
    }

    #[test]
    fn test_acceptance_probability_sanitized() {
        assert_eq!(acceptance_probability(1.0, f64::NAN), 0.0);
        assert_eq!(acceptance_probability(1.0, -1.0), 0.0);
        assert_eq!(acceptance_probability(f64::MIN_POSITIVE, f64::MAX), 1.0);
        assert_eq!(acceptance_probability(1.0, 1.0), 1.0);
    }

    #[test]
    fn test_alpha_in_unit_interval() {
        let out = normal_run(2.5, 5_000, 1);
        assert!(out
            .acceptance_probs
            .iter()
            .all(|a| (0.0..=1.0).contains(a)));
    }

    #[test]
    fn test_rejection_repeats_current_state() {
        let out = normal_run(2.5, 5_000, 2);
        let x = out.coordinate(0);
        let moves = x.windows(2).filter(|w| w[0] != w[1]).count();
        let first_moved = x[0] != 0.0;
        assert_eq!(moves + first_moved as usize, out.accepted);
        assert!(out.accepted > 0 && out.accepted < 5_000);
    }

    #[test]
    fn test_huge_step_rejects_everything() {
        let out = normal_run(1e12, 1_000, 3);
        assert_eq!(out.len(), 1_000);
        assert_eq!(out.accepted, 0);
        assert!(out.positions.iter().all(|&x| x == 0.0));
        assert_eq!(out.acceptance_percent(), 0.0);
    }

    #[test]
    fn test_zero_step_accepts_everything() {
        let target = Normal::new(0.0, 1.0).unwrap();
        let config = MhConfig::new(0.0, 1_000, &[0.3]).set_seed(4);
        let mut mh = MetropolisHastings::new(target, &config).unwrap();
        for i in 0..1_000 {
            let transition = mh.step().unwrap();
            assert!(transition.accepted, "rejected at iteration {i}");
            assert_eq!(transition.acceptance_prob, 1.0);
            assert_eq!(mh.current_state(), &config.initial_state);
        }

        let out = normal_run(0.0, 1_000, 4);
        assert_eq!(out.len(), 1_000);
        assert_eq!(out.accepted, 1_000);
        assert_eq!(out.acceptance_percent(), 100.0);
    }

    #[test]
    fn test_tiny_step_follows_proposals() {
        let step_size = 1e-12;
        let seed = 12;
        let out = normal_run(step_size, 1_000, seed);
        assert_eq!(out.accepted, 1_000);

        // Replay the generator: one proposal draw and one uniform per iteration.
        let proposal = NormalProposal::new(step_size).unwrap();
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut x = arr1(&[0.0]);
        let mut previous = x.clone();
        let mut moves = 0;
        for (i, row) in out.positions.rows().into_iter().enumerate() {
            x = proposal.propose(&x, &mut rng);
            let _u: f64 = rng.gen();
            assert_eq!(row.to_owned(), x);
            if row.to_owned() != previous {
                moves += 1;
            }
            assert_eq!(moves, i + 1);
            previous = row.to_owned();
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let target = Normal::new(0.0, 1.0).unwrap();
        let config = MhConfig::new(1.0, 100, &[0.0, 0.0]);
        assert_eq!(
            MetropolisHastings::new(target, &config).unwrap_err(),
            SamplerError::DimensionMismatch {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn test_custom_proposal_ignores_config_step_size() {
        let target = Normal::new(0.0, 1.0).unwrap();
        let config = MhConfig::new(-1.0, 100, &[0.0]).set_seed(3);
        assert!(MetropolisHastings::new(target, &config).is_err());
        let proposal = NormalProposal::new(1.0).unwrap();
        let out = MetropolisHastings::with_proposal(target, proposal, &config)
            .unwrap()
            .run();
        assert_eq!(out.len(), 100);
        assert!(out.accepted > 0);
    }

    #[test]
    fn test_same_seed_same_chain() {
        assert_eq!(normal_run(1.0, 500, 9), normal_run(1.0, 500, 9));
        assert_ne!(normal_run(1.0, 500, 9), normal_run(1.0, 500, 10));
    }

    #[test]
    fn test_energy_is_negative_log_density() {
        let target = Weibull::new(5.0, 1.0).unwrap();
        let config = MhConfig::new(0.3, 200, &[0.8]).set_seed(5);
        let out = MetropolisHastings::new(target, &config).unwrap().run();
        for (row, energy) in out.positions.rows().into_iter().zip(out.energy.iter()) {
            assert_abs_diff_eq!(*energy, target.potential_energy(&row.to_owned()), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_escapes_zero_density_start() {
        let target = Weibull::new(5.0, 1.0).unwrap();
        let config = MhConfig::new(1.0, 2_000, &[-1.0]).set_seed(6);
        let out = MetropolisHastings::new(target, &config).unwrap().run();
        assert_eq!(out.len(), 2_000);
        assert!(out.positions[[1_999, 0]] > 0.0);
    }

    #[test]
    fn test_normal_moments() {
        let out = normal_run(2.4, 50_000, 7);
        let mean = out.cummean(0);
        let sigma = out.cumsigma(0);
        assert_abs_diff_eq!(mean[49_999], 0.0, epsilon = 0.05);
        assert_abs_diff_eq!(sigma[49_999], 1.0, epsilon = 0.05);
    }

    #[test]
    fn test_bimodal_visits_both_modes() {
        let config = MhConfig::new(3.0, 20_000, &[-2.0]).set_seed(8);
        let out = MetropolisHastings::new(NormalMixture::bimodal(), &config)
            .unwrap()
            .run();
        let x = out.coordinate(0);
        assert!(x.iter().any(|&v| v > 2.0));
        assert!(x.iter().any(|&v| v < -1.0));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let target = Normal::new(0.0, 1.0).unwrap();
        assert!(MetropolisHastings::new(target, &MhConfig::new(-1.0, 10, &[0.0])).is_err());
        assert!(MetropolisHastings::new(target, &MhConfig::new(1.0, 0, &[0.0])).is_err());
    }
}
