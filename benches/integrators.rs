use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use ndarray::arr1;
use verlet_mcmc::config::HmcConfig;
use verlet_mcmc::hamiltonian::{BivariateNormal, UnivariateNormal};
use verlet_mcmc::hmc::HamiltonianMonteCarlo;
use verlet_mcmc::integrator::{Euler, Integrator, LeapFrog};

fn criterion_benchmark(c: &mut Criterion) {
    let model = BivariateNormal::new(1.0, 1.0, 0.9, [1.0, 1.0]).unwrap();
    let p0 = arr1(&[-1.0, 1.0]);
    let q0 = arr1(&[1.0, -1.0]);

    let leapfrog = LeapFrog::new(0.05, 500);
    c.bench_function("leapfrog bivariate 500", |b| {
        b.iter(|| leapfrog.integrate(black_box(&model), black_box(&p0), black_box(&q0)))
    });
    c.bench_function("leapfrog trajectory bivariate 500", |b| {
        b.iter(|| leapfrog.trajectory(black_box(&model), black_box(&p0), black_box(&q0)))
    });

    let euler = Euler::new(0.05, 500);
    c.bench_function("euler bivariate 500", |b| {
        b.iter(|| euler.integrate(black_box(&model), black_box(&p0), black_box(&q0)))
    });

    let normal = UnivariateNormal::new(1.0, 1.0).unwrap();
    c.bench_function("hmc normal 1000 samples", |b| {
        b.iter_batched(
            || {
                let config = HmcConfig::new(0.1, 20, 1_000, &[1.0]).set_seed(42);
                HamiltonianMonteCarlo::new(normal.clone(), &config).unwrap()
            },
            |mut hmc| hmc.run(),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
