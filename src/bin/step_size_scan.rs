//! Scans the random-walk step size of a Metropolis–Hastings sampler on a Weibull target
//! and prints acceptance and the final running moments for each step size.

use std::error::Error;

use verlet_mcmc::config::MhConfig;
use verlet_mcmc::distributions::Weibull;
use verlet_mcmc::sweep::{logspace, mh_step_size_scan_progress};

fn main() -> Result<(), Box<dyn Error>> {
    const N_SAMPLES: usize = 100_000;
    const SEED: u64 = 42;

    let target = Weibull::new(5.0, 1.0)?;
    let base = MhConfig::new(1.0, N_SAMPLES, &[0.5]).set_seed(SEED);
    let step_sizes = logspace(-3.0, 2.0, 25);

    let points = mh_step_size_scan_progress(&target, &base, &step_sizes);

    println!(
        "Weibull k={}, λ={}: μ={:.4}, σ={:.4}",
        target.shape(),
        target.scale(),
        target.mean(),
        target.sigma()
    );
    println!("{:>12} {:>10} {:>10} {:>10}", "step size", "accept %", "mean", "sigma");
    for point in &points {
        match &point.result {
            Ok(out) => {
                let x = out.coordinate(0);
                let n = x.len() as f64;
                let mean = x.iter().sum::<f64>() / n;
                let var = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                println!(
                    "{:>12.4e} {:>10.2} {:>10.4} {:>10.4}",
                    point.step_size,
                    out.acceptance_percent(),
                    mean,
                    var.sqrt()
                );
            }
            Err(e) => println!("{:>12.4e} failed: {e}", point.step_size),
        }
    }
    Ok(())
}
