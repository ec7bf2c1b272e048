//! Compares leapfrog and Euler integration of a unit Gaussian in phase space, then runs
//! HMC on a strongly correlated bivariate normal.

use std::error::Error;

use ndarray::{arr1, Axis};
use ndarray_stats::CorrelationExt;
use verlet_mcmc::config::HmcConfig;
use verlet_mcmc::diagnostics::{autocorrelation, energy_drift, max_energy_drift};
use verlet_mcmc::hamiltonian::{BivariateNormal, UnivariateNormal};
use verlet_mcmc::hmc::HamiltonianMonteCarlo;
use verlet_mcmc::integrator::{Euler, Integrator, LeapFrog};

fn main() -> Result<(), Box<dyn Error>> {
    const SEED: u64 = 42;

    let normal = UnivariateNormal::new(1.0, 1.0)?;
    let p0 = arr1(&[-1.0]);
    let q0 = arr1(&[1.0]);
    let leapfrog = LeapFrog::new(0.05, 500).trajectory(&normal, &p0, &q0)?;
    let euler = Euler::new(0.05, 500).trajectory(&normal, &p0, &q0)?;
    let leapfrog_drift = energy_drift(&leapfrog.energies(&normal));
    if let Some(max) = max_energy_drift(&leapfrog.energies(&normal)) {
        println!("leapfrog max |H - H0| over 500 steps: {max:.3e}");
    }
    let euler_drift = energy_drift(&euler.energies(&normal));

    println!("{:>6} {:>10} {:>10} {:>12} {:>12}", "step", "q leap", "q euler", "ΔH leap", "ΔH euler");
    for step in (0..=500).step_by(50) {
        println!(
            "{:>6} {:>10.4} {:>10.4} {:>12.3e} {:>12.3e}",
            step,
            leapfrog.positions[step][0],
            euler.positions[step][0],
            leapfrog_drift[step],
            euler_drift[step]
        );
    }

    let model = BivariateNormal::new(1.0, 1.0, 0.9, [1.0, 1.0])?;
    let config = HmcConfig::new(0.1, 15, 20_000, &[1.0, -1.0]).set_seed(SEED);
    let mut hmc = HamiltonianMonteCarlo::new(model.clone(), &config)?;
    let out = hmc.run_progress();

    println!("status: {:?}", out.status);
    println!("acceptance: {:.2}%", out.acceptance_percent());
    if let Some(mean) = out.positions.mean_axis(Axis(0)) {
        println!("mean: {mean}");
    }
    println!("sample covariance:\n{}", out.positions.t().cov(1.0)?);
    println!("target covariance:\n{}", model.covariance());
    let rho = autocorrelation(&out.coordinate(0), 5);
    println!("autocorrelation of q1, lags 0-5: {rho:.3?}");
    Ok(())
}
