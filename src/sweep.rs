/*!
Parallel parameter sweeps.

A sweep runs one independent chain per step size on the `rayon` pool. Run `i` uses the
base configuration with its step size replaced and its seed set to `base.seed + i`, so
a sweep is reproducible as a whole and no two runs share a stream. Results come back in
the order of the step sizes, and a failing run (an invalid step size, a diverged
trajectory) only affects its own entry.

# Examples

```rust
use verlet_mcmc::config::MhConfig;
use verlet_mcmc::distributions::Weibull;
use verlet_mcmc::sweep::{logspace, mh_step_size_scan};

let target = Weibull::new(5.0, 1.0).unwrap();
let base = MhConfig::new(1.0, 2_000, &[0.5]).set_seed(42);
let points = mh_step_size_scan(&target, &base, &logspace(-3.0, 2.0, 6));

assert_eq!(points.len(), 6);
// Tiny steps accept almost everything, huge steps almost nothing.
let first = points[0].acceptance_percent().unwrap();
let last = points[5].acceptance_percent().unwrap();
assert!(first > last);
```
*/

use indicatif::{MultiProgress, ProgressBar};
use rayon::prelude::*;

use crate::config::{HmcConfig, MhConfig};
use crate::core::{progress_style, run_chain, run_chain_with_progress, ChainOutput, MarkovChain};
use crate::distributions::Target;
use crate::error::Result;
use crate::hamiltonian::Hamiltonian;
use crate::hmc::HamiltonianMonteCarlo;
use crate::metropolis_hastings::MetropolisHastings;

/// `n` points `10^a, …, 10^b`, evenly spaced in the exponent.
///
/// ```rust
/// use verlet_mcmc::sweep::logspace;
///
/// let grid = logspace(-1.0, 1.0, 3);
/// assert!((grid[0] - 0.1).abs() < 1e-15);
/// assert!((grid[1] - 1.0).abs() < 1e-15);
/// assert!((grid[2] - 10.0).abs() < 1e-13);
/// ```
pub fn logspace(start_exp: f64, stop_exp: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![10f64.powf(start_exp)],
        _ => {
            let delta = (stop_exp - start_exp) / (n - 1) as f64;
            (0..n)
                .map(|i| 10f64.powf(start_exp + i as f64 * delta))
                .collect()
        }
    }
}

/// One entry of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPoint {
    pub step_size: f64,
    pub seed: u64,
    pub result: Result<ChainOutput>,
}

impl ScanPoint {
    /// Acceptance percentage of the run, or `None` if it could not start.
    pub fn acceptance_percent(&self) -> Option<f64> {
        self.result.as_ref().ok().map(ChainOutput::acceptance_percent)
    }
}

fn drive<M: MarkovChain>(chain: &mut M, n_samples: usize, pb: Option<&ProgressBar>) -> ChainOutput {
    match pb {
        Some(pb) => run_chain_with_progress(chain, n_samples, pb),
        None => run_chain(chain, n_samples),
    }
}

fn scan<F>(
    step_sizes: &[f64],
    base_seed: u64,
    n_samples: usize,
    progress: bool,
    run: F,
) -> Vec<ScanPoint>
where
    F: Fn(f64, u64, Option<&ProgressBar>) -> Result<ChainOutput> + Sync,
{
    let multi = progress.then(MultiProgress::new);
    step_sizes
        .par_iter()
        .enumerate()
        .map(|(i, &step_size)| {
            let seed = base_seed.wrapping_add(i as u64);
            let pb = multi.as_ref().map(|multi| {
                let pb = multi.add(ProgressBar::new(n_samples as u64));
                pb.set_prefix(format!("Run {i}"));
                pb.set_style(progress_style());
                pb
            });
            let result = run(step_size, seed, pb.as_ref());
            if let (Some(pb), Err(e)) = (&pb, &result) {
                pb.abandon_with_message(e.to_string());
            }
            ScanPoint {
                step_size,
                seed,
                result,
            }
        })
        .collect()
}

fn mh_scan<D: Target + Clone + Sync>(
    target: &D,
    base: &MhConfig,
    step_sizes: &[f64],
    progress: bool,
) -> Vec<ScanPoint> {
    scan(
        step_sizes,
        base.seed,
        base.n_samples,
        progress,
        |step_size, seed, pb| {
            let config = base.clone().set_step_size(step_size).set_seed(seed);
            let mut mh = MetropolisHastings::new(target.clone(), &config)?;
            Ok(drive(&mut mh, config.n_samples, pb))
        },
    )
}

fn hmc_scan<H: Hamiltonian + Clone + Sync>(
    model: &H,
    base: &HmcConfig,
    step_sizes: &[f64],
    progress: bool,
) -> Vec<ScanPoint> {
    scan(
        step_sizes,
        base.seed,
        base.n_samples,
        progress,
        |step_size, seed, pb| {
            let config = base.clone().set_step_size(step_size).set_seed(seed);
            let mut hmc = HamiltonianMonteCarlo::new(model.clone(), &config)?;
            Ok(drive(&mut hmc, config.n_samples, pb))
        },
    )
}

/// Runs one Metropolis–Hastings chain per step size, in parallel.
pub fn mh_step_size_scan<D: Target + Clone + Sync>(
    target: &D,
    base: &MhConfig,
    step_sizes: &[f64],
) -> Vec<ScanPoint> {
    mh_scan(target, base, step_sizes, false)
}

/// Like [`mh_step_size_scan`], with one progress bar per run.
pub fn mh_step_size_scan_progress<D: Target + Clone + Sync>(
    target: &D,
    base: &MhConfig,
    step_sizes: &[f64],
) -> Vec<ScanPoint> {
    mh_scan(target, base, step_sizes, true)
}

/// Runs one HMC chain per leapfrog step size, in parallel. The number of leapfrog
/// steps is kept from `base`.
pub fn hmc_step_size_scan<H: Hamiltonian + Clone + Sync>(
    model: &H,
    base: &HmcConfig,
    step_sizes: &[f64],
) -> Vec<ScanPoint> {
    hmc_scan(model, base, step_sizes, false)
}

/// Like [`hmc_step_size_scan`], with one progress bar per run.
pub fn hmc_step_size_scan_progress<H: Hamiltonian + Clone + Sync>(
    model: &H,
    base: &HmcConfig,
    step_sizes: &[f64],
) -> Vec<ScanPoint> {
    hmc_scan(model, base, step_sizes, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RunStatus;
    use crate::distributions::Normal;
    use crate::error::SamplerError;
    use crate::hamiltonian::UnivariateNormal;
    use approx::assert_relative_eq;

    #[test]
    fn test_logspace() {
        let grid = logspace(-3.0, 2.0, 25);
        assert_eq!(grid.len(), 25);
        assert_relative_eq!(grid[0], 1e-3, max_relative = 1e-12);
        assert_relative_eq!(grid[24], 1e2, max_relative = 1e-12);
        assert!(grid.windows(2).all(|w| w[0] < w[1]));
        assert!(logspace(0.0, 1.0, 0).is_empty());
        assert_eq!(logspace(0.0, 1.0, 1), vec![1.0]);
    }

    #[test]
    fn test_seeds_follow_index() {
        let target = Normal::new(0.0, 1.0).unwrap();
        let base = MhConfig::new(1.0, 100, &[0.0]).set_seed(10);
        let points = mh_step_size_scan(&target, &base, &[0.5, 0.5, 0.5]);
        let seeds: Vec<u64> = points.iter().map(|p| p.seed).collect();
        assert_eq!(seeds, vec![10, 11, 12]);
        // Same step size, different seeds, different chains.
        assert_ne!(points[0].result, points[1].result);
    }

    #[test]
    fn test_scan_matches_individual_runs() {
        let target = Normal::new(0.0, 1.0).unwrap();
        let base = MhConfig::new(1.0, 300, &[0.0]).set_seed(4);
        let points = mh_step_size_scan(&target, &base, &[0.1, 2.0]);
        let config = base.clone().set_step_size(2.0).set_seed(5);
        let single = MetropolisHastings::new(target, &config).unwrap().run();
        assert_eq!(points[1].result.as_ref().unwrap(), &single);
    }

    #[test]
    fn test_acceptance_decreases_with_step_size() {
        let target = Normal::new(0.0, 1.0).unwrap();
        let base = MhConfig::new(1.0, 5_000, &[0.0]).set_seed(1);
        let points = mh_step_size_scan(&target, &base, &logspace(-3.0, 2.0, 6));
        let rates: Vec<f64> = points.iter().filter_map(ScanPoint::acceptance_percent).collect();
        assert_eq!(rates.len(), 6);
        assert!(rates[0] > 99.0);
        assert!(rates[5] < 5.0);
    }

    #[test]
    fn test_failures_do_not_stop_the_batch() {
        let model = UnivariateNormal::new(1.0, 1.0).unwrap();
        let base = HmcConfig::new(0.1, 10, 200, &[1.0]).set_seed(3);
        let points = hmc_step_size_scan(&model, &base, &[0.1, -1.0, 1e200, 0.2]);
        assert_eq!(points.len(), 4);

        assert!(points[0].result.as_ref().unwrap().is_completed());
        assert!(matches!(
            points[1].result,
            Err(SamplerError::InvalidParameter { name: "step_size", .. })
        ));
        let diverged = points[2].result.as_ref().unwrap();
        assert!(matches!(diverged.status, RunStatus::Diverged { iteration: 0, .. }));
        assert_eq!(points[3].result.as_ref().unwrap().len(), 200);
        assert_eq!(points[1].acceptance_percent(), None);
    }

    #[test]
    fn test_progress_scan_matches_plain_scan() {
        let target = Normal::new(0.0, 1.0).unwrap();
        let base = MhConfig::new(1.0, 200, &[0.0]).set_seed(8);
        let plain = mh_step_size_scan(&target, &base, &[0.5, 1.5]);
        let shown = mh_step_size_scan_progress(&target, &base, &[0.5, 1.5]);
        assert_eq!(plain, shown);
    }
}
