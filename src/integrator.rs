/*!
Numerical integrators for Hamilton's equations

```text
dq/dt =  dK/dp
dp/dt = -dU/dq
```

[`LeapFrog`] (momentum Verlet) is the integrator used by the HMC sampler. It is
time-reversible and volume preserving, so its energy error stays bounded over long
trajectories. [`Euler`] is the explicit Euler scheme; it is not symplectic and its energy
drifts, which makes it useful as a point of comparison.

Both integrators stop at the first non-finite momentum or position and report the
offending step as [`SamplerError::NumericInstability`].

# Examples

```rust
use ndarray::arr1;
use verlet_mcmc::hamiltonian::{Hamiltonian, UnivariateNormal};
use verlet_mcmc::integrator::{Integrator, LeapFrog};

let model = UnivariateNormal::new(1.0, 1.0).unwrap();
let leapfrog = LeapFrog::new(0.05, 500);
let path = leapfrog.trajectory(&model, &arr1(&[-1.0]), &arr1(&[1.0])).unwrap();
assert_eq!(path.len(), 501);

let h0 = model.hamiltonian(&path.momenta[0], &path.positions[0]);
let drift = path.energies(&model).iter().map(|h| (h - h0).abs()).fold(0.0, f64::max);
assert!(drift < 0.05);
```
*/

use ndarray::Array1;

use crate::error::{Result, SamplerError};
use crate::hamiltonian::Hamiltonian;

/// The phase-space path of one deterministic integration, including the start point.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub momenta: Vec<Array1<f64>>,
    pub positions: Vec<Array1<f64>>,
}

impl Trajectory {
    fn with_start(p0: &Array1<f64>, q0: &Array1<f64>, n_steps: usize) -> Self {
        let mut momenta = Vec::with_capacity(n_steps + 1);
        let mut positions = Vec::with_capacity(n_steps + 1);
        momenta.push(p0.clone());
        positions.push(q0.clone());
        Self { momenta, positions }
    }

    fn push(&mut self, p: Array1<f64>, q: Array1<f64>) {
        self.momenta.push(p);
        self.positions.push(q);
    }

    /// Number of recorded points (`n_steps + 1`).
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// `H(p, q)` at every recorded point.
    pub fn energies<H: Hamiltonian>(&self, model: &H) -> Array1<f64> {
        self.momenta
            .iter()
            .zip(self.positions.iter())
            .map(|(p, q)| model.hamiltonian(p, q))
            .collect()
    }
}

/// Evolves a phase-space point under a model's Hamiltonian.
pub trait Integrator {
    /// Step size `ε`.
    fn step_size(&self) -> f64;

    /// Number of steps `L` per call.
    fn n_steps(&self) -> usize;

    /// Integrates `L` steps from `(p0, q0)` and returns only the end point.
    fn integrate<H: Hamiltonian>(
        &self,
        model: &H,
        p0: &Array1<f64>,
        q0: &Array1<f64>,
    ) -> Result<(Array1<f64>, Array1<f64>)>;

    /// Integrates `L` steps from `(p0, q0)` and returns every synchronized point.
    fn trajectory<H: Hamiltonian>(
        &self,
        model: &H,
        p0: &Array1<f64>,
        q0: &Array1<f64>,
    ) -> Result<Trajectory>;
}

fn all_finite(x: &Array1<f64>) -> bool {
    x.iter().all(|v| v.is_finite())
}

fn ensure_finite(step: usize, p: &Array1<f64>, q: &Array1<f64>) -> Result<()> {
    if all_finite(p) && all_finite(q) {
        Ok(())
    } else {
        Err(SamplerError::NumericInstability { step })
    }
}

/// Leapfrog (momentum Verlet) integrator.
///
/// One call performs
///
/// 1. `p ← p - ε dU/dq(q) / 2`
/// 2. `L` times: `q ← q + ε dK/dp(p)`, then, except after the last position update,
///    `p ← p - ε dU/dq(q)`
/// 3. `p ← p - ε dU/dq(q) / 2`
///
/// The interior full momentum steps fuse the closing and opening half steps of
/// consecutive Verlet steps, so the gradient is evaluated once per position update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeapFrog {
    pub step_size: f64,
    pub n_steps: usize,
}

impl LeapFrog {
    pub fn new(step_size: f64, n_steps: usize) -> Self {
        Self { step_size, n_steps }
    }

    /// Runs the integration, handing the synchronized `(p, q)` after every step to
    /// `record`. Momenta between interior steps sit at half-integer times, so the
    /// synchronized momentum is reconstructed with the gradient already computed for the
    /// next full step.
    fn run<H, F>(
        &self,
        model: &H,
        p0: &Array1<f64>,
        q0: &Array1<f64>,
        mut record: F,
    ) -> Result<(Array1<f64>, Array1<f64>)>
    where
        H: Hamiltonian,
        F: FnMut(&Array1<f64>, &Array1<f64>),
    {
        let eps = self.step_size;
        let mut p = p0.clone();
        let mut q = q0.clone();
        if self.n_steps == 0 {
            return Ok((p, q));
        }

        let mut grad = model.potential_gradient(&q);
        p.scaled_add(-0.5 * eps, &grad);
        ensure_finite(0, &p, &q)?;

        for i in 0..self.n_steps {
            q.scaled_add(eps, &model.kinetic_gradient(&p));
            grad = model.potential_gradient(&q);
            if i + 1 == self.n_steps {
                p.scaled_add(-0.5 * eps, &grad);
                ensure_finite(i + 1, &p, &q)?;
                record(&p, &q);
            } else {
                let synchronized = &p - &(0.5 * eps * &grad);
                p.scaled_add(-eps, &grad);
                ensure_finite(i + 1, &p, &q)?;
                record(&synchronized, &q);
            }
        }
        Ok((p, q))
    }
}

impl Integrator for LeapFrog {
    fn step_size(&self) -> f64 {
        self.step_size
    }

    fn n_steps(&self) -> usize {
        self.n_steps
    }

    fn integrate<H: Hamiltonian>(
        &self,
        model: &H,
        p0: &Array1<f64>,
        q0: &Array1<f64>,
    ) -> Result<(Array1<f64>, Array1<f64>)> {
        self.run(model, p0, q0, |_, _| {})
    }

    fn trajectory<H: Hamiltonian>(
        &self,
        model: &H,
        p0: &Array1<f64>,
        q0: &Array1<f64>,
    ) -> Result<Trajectory> {
        let mut path = Trajectory::with_start(p0, q0, self.n_steps);
        self.run(model, p0, q0, |p, q| path.push(p.clone(), q.clone()))?;
        Ok(path)
    }
}

/// Explicit Euler integrator: `p' = p - ε dU/dq(q)`, `q' = q + ε dK/dp(p)`, both
/// evaluated at the old point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Euler {
    pub step_size: f64,
    pub n_steps: usize,
}

impl Euler {
    pub fn new(step_size: f64, n_steps: usize) -> Self {
        Self { step_size, n_steps }
    }

    fn run<H, F>(
        &self,
        model: &H,
        p0: &Array1<f64>,
        q0: &Array1<f64>,
        mut record: F,
    ) -> Result<(Array1<f64>, Array1<f64>)>
    where
        H: Hamiltonian,
        F: FnMut(&Array1<f64>, &Array1<f64>),
    {
        let eps = self.step_size;
        let mut p = p0.clone();
        let mut q = q0.clone();
        for i in 0..self.n_steps {
            let dudq = model.potential_gradient(&q);
            let dkdp = model.kinetic_gradient(&p);
            p.scaled_add(-eps, &dudq);
            q.scaled_add(eps, &dkdp);
            ensure_finite(i + 1, &p, &q)?;
            record(&p, &q);
        }
        Ok((p, q))
    }
}

impl Integrator for Euler {
    fn step_size(&self) -> f64 {
        self.step_size
    }

    fn n_steps(&self) -> usize {
        self.n_steps
    }

    fn integrate<H: Hamiltonian>(
        &self,
        model: &H,
        p0: &Array1<f64>,
        q0: &Array1<f64>,
    ) -> Result<(Array1<f64>, Array1<f64>)> {
        self.run(model, p0, q0, |_, _| {})
    }

    fn trajectory<H: Hamiltonian>(
        &self,
        model: &H,
        p0: &Array1<f64>,
        q0: &Array1<f64>,
    ) -> Result<Trajectory> {
        let mut path = Trajectory::with_start(p0, q0, self.n_steps);
        self.run(model, p0, q0, |p, q| path.push(p.clone(), q.clone()))?;
        Ok(path)
    }
}
