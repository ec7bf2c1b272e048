/*!
Target densities for the Metropolis–Hastings sampler.

A [`Target`] only has to provide an unnormalized density. Densities are evaluated
everywhere: outside the support they return `0.0`, which the sampler turns into a
rejected proposal. No target ever reports an error for an out-of-support state.

# Examples

```rust
use ndarray::arr1;
use verlet_mcmc::distributions::{Target, Weibull};

let weibull = Weibull::new(5.0, 1.0).unwrap();
assert!(weibull.density(&arr1(&[0.9])) > 0.0);
// Negative states lie outside the support.
assert_eq!(weibull.density(&arr1(&[-0.5])), 0.0);
assert!((weibull.mean() - 0.9182).abs() < 1e-4);
```
*/

use ndarray::Array1;
use std::f64::consts::PI;

use crate::error::{ensure_positive, Result, SamplerError};
use crate::math::gamma;

/// A continuous target distribution for Metropolis–Hastings.
pub trait Target {
    /// Returns the (possibly unnormalized) density at `x`, or `0.0` outside the support.
    fn density(&self, x: &Array1<f64>) -> f64;

    /// Length of the state vector the density is defined on.
    fn dim(&self) -> usize;

    /// Potential energy `-ln f(x)`. Infinite outside the support.
    fn potential_energy(&self, x: &Array1<f64>) -> f64 {
        -self.density(x).ln()
    }
}

fn normal_pdf(x: f64, mu: f64, sigma: f64) -> f64 {
    let z = (x - mu) / sigma;
    (-0.5 * z * z).exp() / (2.0 * PI * sigma * sigma).sqrt()
}

/**
A univariate normal density `N(mu, sigma)`. Reads the first coordinate of the state.

# Examples

```rust
use ndarray::arr1;
use verlet_mcmc::distributions::{Normal, Target};

let normal = Normal::new(0.0, 1.0).unwrap();
let p = normal.density(&arr1(&[1.0]));
assert!((p - 0.24197072451914337).abs() < 1e-12);
```
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normal {
    mu: f64,
    sigma: f64,
}

impl Normal {
    pub fn new(mu: f64, sigma: f64) -> Result<Self> {
        ensure_positive("sigma", sigma)?;
        if !mu.is_finite() {
            return Err(SamplerError::invalid("mu", mu, "must be finite"));
        }
        Ok(Self { mu, sigma })
    }

    pub fn mean(&self) -> f64 {
        self.mu
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl Target for Normal {
    fn dim(&self) -> usize {
        1
    }

    fn density(&self, x: &Array1<f64>) -> f64 {
        normal_pdf(x[0], self.mu, self.sigma)
    }
}

/// A Weibull density with shape `k` and scale `lambda`, supported on `x > 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weibull {
    k: f64,
    lambda: f64,
}

impl Weibull {
    pub fn new(k: f64, lambda: f64) -> Result<Self> {
        ensure_positive("k", k)?;
        ensure_positive("lambda", lambda)?;
        Ok(Self { k, lambda })
    }

    pub fn shape(&self) -> f64 {
        self.k
    }

    pub fn scale(&self) -> f64 {
        self.lambda
    }

    /// Analytic mean `λ Γ(1 + 1/k)`.
    pub fn mean(&self) -> f64 {
        self.lambda * gamma(1.0 + 1.0 / self.k)
    }

    /// Analytic standard deviation `λ sqrt(Γ(1 + 2/k) - Γ(1 + 1/k)²)`.
    pub fn sigma(&self) -> f64 {
        let g1 = gamma(1.0 + 1.0 / self.k);
        let g2 = gamma(1.0 + 2.0 / self.k);
        self.lambda * (g2 - g1 * g1).max(0.0).sqrt()
    }

    /// Cumulative distribution function `1 - exp(-(x/λ)^k)`.
    pub fn cdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            0.0
        } else {
            1.0 - (-(x / self.lambda).powf(self.k)).exp()
        }
    }
}

impl Target for Weibull {
    fn dim(&self) -> usize {
        1
    }

    fn density(&self, x: &Array1<f64>) -> f64 {
        let x = x[0];
        if x.is_nan() || x <= 0.0 {
            return 0.0;
        }
        let r = x / self.lambda;
        (self.k / self.lambda) * r.powf(self.k - 1.0) * (-r.powf(self.k)).exp()
    }
}

/// One weighted component of a [`NormalMixture`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixtureComponent {
    pub weight: f64,
    pub mu: f64,
    pub sigma: f64,
}

/**
A univariate mixture of normal densities. Weights need not sum to one; they are
normalized on construction.

# Examples

```rust
use ndarray::arr1;
use verlet_mcmc::distributions::{NormalMixture, Target};

let bimodal = NormalMixture::bimodal();
// The density has a valley between the two modes.
let left = bimodal.density(&arr1(&[-2.0]));
let valley = bimodal.density(&arr1(&[0.5]));
assert!(valley < left);
```
*/
#[derive(Debug, Clone, PartialEq)]
pub struct NormalMixture {
    components: Vec<MixtureComponent>,
}

impl NormalMixture {
    pub fn new(components: Vec<MixtureComponent>) -> Result<Self> {
        if components.is_empty() {
            return Err(SamplerError::invalid(
                "components",
                0.0,
                "mixture needs at least one component",
            ));
        }
        for c in &components {
            ensure_positive("weight", c.weight)?;
            ensure_positive("sigma", c.sigma)?;
            if !c.mu.is_finite() {
                return Err(SamplerError::invalid("mu", c.mu, "must be finite"));
            }
        }
        let total: f64 = components.iter().map(|c| c.weight).sum();
        let components = components
            .into_iter()
            .map(|c| MixtureComponent {
                weight: c.weight / total,
                ..c
            })
            .collect();
        Ok(Self { components })
    }

    /// Two well separated modes: `0.5 N(-2, 1) + 0.5 N(3, 0.75)`.
    pub fn bimodal() -> Self {
        Self {
            components: vec![
                MixtureComponent {
                    weight: 0.5,
                    mu: -2.0,
                    sigma: 1.0,
                },
                MixtureComponent {
                    weight: 0.5,
                    mu: 3.0,
                    sigma: 0.75,
                },
            ],
        }
    }

    pub fn components(&self) -> &[MixtureComponent] {
        &self.components
    }

    pub fn mean(&self) -> f64 {
        self.components.iter().map(|c| c.weight * c.mu).sum()
    }

    pub fn sigma(&self) -> f64 {
        let mean = self.mean();
        let second: f64 = self
            .components
            .iter()
            .map(|c| c.weight * (c.sigma * c.sigma + c.mu * c.mu))
            .sum();
        (second - mean * mean).max(0.0).sqrt()
    }
}

impl Target for NormalMixture {
    fn dim(&self) -> usize {
        1
    }

    fn density(&self, x: &Array1<f64>) -> f64 {
        self.components
            .iter()
            .map(|c| c.weight * normal_pdf(x[0], c.mu, c.sigma))
            .sum()
    }
}
