//! Metropolis–Hastings against a Weibull(k = 5, λ = 1) target.
//!
//! 1. `test_running_moments_converge`: the running mean and sigma end near the analytic
//!    values.
//! 2. `test_agrees_with_inverse_cdf_samples`: a thinned chain passes a two-sample KS test
//!    against exact inverse-CDF samples.
//! 3. `test_wrong_target_is_rejected`: the same KS test rejects a chain with the wrong
//!    shape.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use verlet_mcmc::config::MhConfig;
use verlet_mcmc::core::ChainOutput;
use verlet_mcmc::distributions::Weibull;
use verlet_mcmc::inverse_cdf::sample_weibull;
use verlet_mcmc::metropolis_hastings::MetropolisHastings;
use verlet_mcmc::sweep::{logspace, mh_step_size_scan};

const SEED: u64 = 42;

fn weibull_chain(k: f64, n_samples: usize, seed: u64) -> ChainOutput {
    let target = Weibull::new(k, 1.0).unwrap();
    let config = MhConfig::new(0.4, n_samples, &[0.5]).set_seed(seed);
    MetropolisHastings::new(target, &config).unwrap().run()
}

fn thin(xs: &[f64], every: usize) -> Vec<f64> {
    xs.iter().step_by(every).copied().collect()
}

#[test]
fn test_running_moments_converge() {
    let target = Weibull::new(5.0, 1.0).unwrap();
    let out = weibull_chain(5.0, 100_000, SEED);
    assert!(out.is_completed());
    assert_eq!(out.len(), 100_000);

    let mean = out.cummean(0);
    let sigma = out.cumsigma(0);
    assert!(
        (mean[99_999] - 0.9182).abs() < 0.02,
        "running mean ended at {}",
        mean[99_999]
    );
    assert!(
        (sigma[99_999] - target.sigma()).abs() < 0.02,
        "running sigma ended at {}",
        sigma[99_999]
    );
    // The chain never leaves the support.
    assert!(out.positions.iter().all(|&x| x > 0.0));
}

#[test]
fn test_agrees_with_inverse_cdf_samples() {
    let target = Weibull::new(5.0, 1.0).unwrap();
    let out = weibull_chain(5.0, 200_000, SEED);
    let chain = thin(&out.coordinate(0), 50);

    let mut rng = SmallRng::seed_from_u64(SEED);
    let exact = sample_weibull(&target, chain.len(), &mut rng);

    let result = kolmogorov_smirnov::test_f64(&chain, &exact, 0.99);
    assert!(
        !result.is_rejected,
        "KS statistic {} above critical value {}",
        result.statistic, result.critical_value
    );
}

#[test]
fn test_wrong_target_is_rejected() {
    let target = Weibull::new(5.0, 1.0).unwrap();
    let out = weibull_chain(2.0, 200_000, SEED);
    let chain = thin(&out.coordinate(0), 50);

    let mut rng = SmallRng::seed_from_u64(SEED);
    let exact = sample_weibull(&target, chain.len(), &mut rng);

    let result = kolmogorov_smirnov::test_f64(&chain, &exact, 0.99);
    assert!(result.is_rejected);
}

#[test]
fn test_step_size_scan_extremes() {
    let target = Weibull::new(5.0, 1.0).unwrap();
    let base = MhConfig::new(1.0, 10_000, &[0.5]).set_seed(SEED);
    let points = mh_step_size_scan(&target, &base, &logspace(-3.0, 2.0, 25));
    assert_eq!(points.len(), 25);

    let first = points[0].acceptance_percent().unwrap();
    let last = points[24].acceptance_percent().unwrap();
    assert!(first > 95.0, "acceptance {first}% at the smallest step");
    assert!(last < 5.0, "acceptance {last}% at the largest step");
    for point in &points {
        let out = point.result.as_ref().unwrap();
        assert_eq!(out.len(), 10_000);
        assert!(out.acceptance_probs.iter().all(|a| (0.0..=1.0).contains(a)));
    }
}
