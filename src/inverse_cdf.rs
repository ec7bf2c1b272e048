/*!
Direct sampling by inverse transform: `X = F⁻¹(U)` with `U ~ U[0, 1)`.

The continuous inverses are closed-form. These samplers draw exact, independent samples
and serve as the reference the Markov chain samplers are checked against.

# Examples

```rust
use rand::rngs::SmallRng;
use rand::SeedableRng;
use verlet_mcmc::distributions::Weibull;
use verlet_mcmc::inverse_cdf::sample_weibull;

let weibull = Weibull::new(5.0, 1.0).unwrap();
let mut rng = SmallRng::seed_from_u64(42);
let samples = sample_weibull(&weibull, 10_000, &mut rng);
let mean = samples.iter().sum::<f64>() / samples.len() as f64;
assert!((mean - weibull.mean()).abs() < 0.01);
```
*/

use ndarray::Array1;
use rand::Rng;

use crate::distributions::Weibull;
use crate::error::{Result, SamplerError};

/// Tolerance on the total probability of a [`DiscreteDistribution`].
const PROBABILITY_SUM_TOL: f64 = 1e-9;

/// Inverse CDF of the unit-rate exponential distribution, `ln(1 / (1 - u))`.
pub fn exponential_inverse_cdf(u: f64) -> f64 {
    (1.0 / (1.0 - u)).ln()
}

/// Inverse CDF of a Weibull distribution, `λ (ln(1 / (1 - u)))^(1/k)`.
pub fn weibull_inverse_cdf(weibull: &Weibull, u: f64) -> f64 {
    weibull.scale() * exponential_inverse_cdf(u).powf(1.0 / weibull.shape())
}

pub fn sample_exponential<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<f64> {
    (0..n)
        .map(|_| exponential_inverse_cdf(rng.gen::<f64>()))
        .collect()
}

pub fn sample_weibull<R: Rng + ?Sized>(weibull: &Weibull, n: usize, rng: &mut R) -> Vec<f64> {
    (0..n)
        .map(|_| weibull_inverse_cdf(weibull, rng.gen::<f64>()))
        .collect()
}

/**
A distribution over the indices `0..n` given by a probability vector.

Sampling returns the first index whose cumulative probability reaches `u`.

```rust
use verlet_mcmc::inverse_cdf::DiscreteDistribution;

let dist = DiscreteDistribution::new(&[0.25, 0.25, 0.5]).unwrap();
assert_eq!(dist.cdf().to_vec(), vec![0.25, 0.5, 1.0]);
assert_eq!(dist.index_of(0.3), 1);
assert!((dist.mean() - 1.25).abs() < 1e-15);
```
*/
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteDistribution {
    probabilities: Array1<f64>,
    cdf: Array1<f64>,
}

impl DiscreteDistribution {
    pub fn new(probabilities: &[f64]) -> Result<Self> {
        if probabilities.is_empty() {
            return Err(SamplerError::invalid(
                "probabilities",
                0.0,
                "needs at least one entry",
            ));
        }
        if let Some(&p) = probabilities.iter().find(|p| !(p.is_finite() && **p >= 0.0)) {
            return Err(SamplerError::invalid(
                "probabilities",
                p,
                "entries must be finite and non-negative",
            ));
        }
        let total: f64 = probabilities.iter().sum();
        if (total - 1.0).abs() > PROBABILITY_SUM_TOL {
            return Err(SamplerError::invalid(
                "probabilities",
                total,
                "entries must sum to one",
            ));
        }
        let probabilities = Array1::from(probabilities.to_vec());
        let mut cdf = probabilities.clone();
        cdf.accumulate_axis_inplace(ndarray::Axis(0), |&prev, cur| *cur += prev);
        Ok(Self { probabilities, cdf })
    }

    pub fn probabilities(&self) -> &Array1<f64> {
        &self.probabilities
    }

    pub fn cdf(&self) -> &Array1<f64> {
        &self.cdf
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    /// The smallest index `i` with `cdf[i] >= u`. Rounding can leave the last cumulative
    /// value just below one, so `u` above every entry maps to the last index.
    pub fn index_of(&self, u: f64) -> usize {
        self.cdf
            .iter()
            .position(|&c| c >= u)
            .unwrap_or(self.len() - 1)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.index_of(rng.gen::<f64>())
    }

    pub fn sample_n<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<usize> {
        (0..n).map(|_| self.sample(rng)).collect()
    }

    /// `Σ i p_i`.
    pub fn mean(&self) -> f64 {
        self.probabilities
            .iter()
            .enumerate()
            .map(|(i, p)| i as f64 * p)
            .sum()
    }

    /// `sqrt(Σ i² p_i - mean²)`, clamped at zero.
    pub fn sigma(&self) -> f64 {
        let mean = self.mean();
        let second: f64 = self
            .probabilities
            .iter()
            .enumerate()
            .map(|(i, p)| (i * i) as f64 * p)
            .sum();
        (second - mean * mean).max(0.0).sqrt()
    }
}
