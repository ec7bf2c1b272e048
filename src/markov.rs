/*!
Finite-state Markov chains given by a row-stochastic transition matrix.

Distributions are row vectors: one step maps `π` to `π P`. For an irreducible, aperiodic
chain `π P^n` converges to the unique stationary distribution from any start, which is
what [`TransitionMatrix::stationary_distribution`] iterates towards.

# Examples

```rust
use ndarray::{arr1, arr2};
use verlet_mcmc::markov::TransitionMatrix;

let p = TransitionMatrix::new(arr2(&[[0.5, 0.5], [0.2, 0.8]])).unwrap();
let pi = p.stationary_distribution(1e-12, 10_000).unwrap();
assert!((pi[0] - 2.0 / 7.0).abs() < 1e-10);
assert!((p.step(&pi).unwrap() - &pi).iter().all(|d| d.abs() < 1e-10));
```
*/

use ndarray::{Array1, Array2, Axis};

use crate::error::{Result, SamplerError};

/// Tolerance on each row sum of a transition matrix.
const ROW_SUM_TOL: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    p: Array2<f64>,
}

impl TransitionMatrix {
    /// Accepts a square matrix with finite, non-negative entries whose rows each sum to
    /// one.
    pub fn new(p: Array2<f64>) -> Result<Self> {
        let (rows, cols) = p.dim();
        if rows != cols {
            return Err(SamplerError::DimensionMismatch {
                expected: rows,
                found: cols,
            });
        }
        if rows == 0 {
            return Err(SamplerError::invalid(
                "transition_matrix",
                0.0,
                "needs at least one state",
            ));
        }
        if let Some(&bad) = p.iter().find(|v| !(v.is_finite() && **v >= 0.0)) {
            return Err(SamplerError::invalid(
                "transition_matrix",
                bad,
                "entries must be finite and non-negative",
            ));
        }
        for &sum in p.sum_axis(Axis(1)).iter() {
            if (sum - 1.0).abs() > ROW_SUM_TOL {
                return Err(SamplerError::invalid(
                    "transition_matrix",
                    sum,
                    "rows must sum to one",
                ));
            }
        }
        Ok(Self { p })
    }

    pub fn n_states(&self) -> usize {
        self.p.nrows()
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.p
    }

    fn check_len(&self, distribution: &Array1<f64>) -> Result<()> {
        if distribution.len() != self.n_states() {
            return Err(SamplerError::DimensionMismatch {
                expected: self.n_states(),
                found: distribution.len(),
            });
        }
        Ok(())
    }

    /// `π P`.
    pub fn step(&self, distribution: &Array1<f64>) -> Result<Array1<f64>> {
        self.check_len(distribution)?;
        Ok(distribution.dot(&self.p))
    }

    /// `π P^n`.
    pub fn n_step_distribution(&self, initial: &Array1<f64>, n: usize) -> Result<Array1<f64>> {
        self.check_len(initial)?;
        Ok((0..n).fold(initial.clone(), |pi, _| pi.dot(&self.p)))
    }

    /// `P^n` by repeated squaring.
    pub fn power(&self, n: usize) -> Array2<f64> {
        let mut result = Array2::eye(self.n_states());
        let mut base = self.p.clone();
        let mut n = n;
        while n > 0 {
            if n & 1 == 1 {
                result = result.dot(&base);
            }
            base = base.dot(&base);
            n >>= 1;
        }
        result
    }

    /// Power iteration from the uniform distribution until successive iterates differ
    /// by less than `tol` in L1 norm.
    pub fn stationary_distribution(&self, tol: f64, max_iter: usize) -> Result<Array1<f64>> {
        let n = self.n_states();
        let mut pi = Array1::from_elem(n, 1.0 / n as f64);
        for _ in 0..max_iter {
            let next = pi.dot(&self.p);
            let diff: f64 = (&next - &pi).mapv(f64::abs).sum();
            pi = next;
            if diff < tol {
                return Ok(pi);
            }
        }
        Err(SamplerError::NoConvergence {
            iterations: max_iter,
        })
    }
}
