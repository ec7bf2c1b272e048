//! Running statistics and post-hoc diagnostics of a recorded chain.

use ndarray::prelude::*;
use ndarray::Zip;
use ndarray_stats::QuantileExt;
use num_traits::Float;
use rustfft::{num_complex::Complex, FftPlanner};
use std::collections::VecDeque;

/// Incremental per-dimension sum and sum of squares of the states pushed so far.
#[derive(Debug, Clone, PartialEq)]
pub struct RunningMoments {
    n: usize,
    sum: Array1<f64>,
    sum_sq: Array1<f64>,
}

impl RunningMoments {
    pub fn new(dim: usize) -> Self {
        Self {
            n: 0,
            sum: Array1::zeros(dim),
            sum_sq: Array1::zeros(dim),
        }
    }

    pub fn push(&mut self, x: &Array1<f64>) {
        self.n += 1;
        self.sum += x;
        self.sum_sq.zip_mut_with(x, |s, &v| *s += v * v);
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Per-dimension mean. `NaN` before the first push.
    pub fn mean(&self) -> Array1<f64> {
        &self.sum / self.n as f64
    }

    /// Per-dimension population standard deviation `sqrt(max(0, Σx²/n - mean²))`.
    ///
    /// Cancellation can make the difference slightly negative; it is clamped to zero.
    pub fn sigma(&self) -> Array1<f64> {
        let n = self.n as f64;
        let mean = self.mean();
        Zip::from(&self.sum_sq)
            .and(&mean)
            .map_collect(|&sq, &m| (sq / n - m * m).max(0.0).sqrt())
    }
}

/// Acceptance rate over the last `size` iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptanceWindow {
    size: usize,
    window: VecDeque<bool>,
    accepted: usize,
}

impl AcceptanceWindow {
    pub fn new(size: usize) -> Self {
        Self {
            size: size.max(1),
            window: VecDeque::with_capacity(size.max(1)),
            accepted: 0,
        }
    }

    pub fn push(&mut self, accepted: bool) {
        self.window.push_back(accepted);
        if accepted {
            self.accepted += 1;
        }
        if self.window.len() > self.size && self.window.pop_front() == Some(true) {
            self.accepted -= 1;
        }
    }

    /// `0.0` while the window is empty.
    pub fn rate(&self) -> f64 {
        if self.window.is_empty() {
            0.0
        } else {
            self.accepted as f64 / self.window.len() as f64
        }
    }
}

/// Running mean `x̄_i = (x_0 + … + x_i) / (i + 1)` of a series.
///
/// ```rust
/// use verlet_mcmc::diagnostics::cummean;
///
/// assert_eq!(cummean(&[1.0, 3.0, 5.0]), vec![1.0, 2.0, 3.0]);
/// ```
pub fn cummean<T: Float>(xs: &[T]) -> Vec<T> {
    let mut sum = T::zero();
    let mut count = T::zero();
    xs.iter()
        .map(|&x| {
            sum = sum + x;
            count = count + T::one();
            sum / count
        })
        .collect()
}

/// Running population standard deviation of a series, clamped at zero like
/// [`RunningMoments::sigma`].
pub fn cumsigma<T: Float>(xs: &[T]) -> Vec<T> {
    let mut sum = T::zero();
    let mut sum_sq = T::zero();
    let mut count = T::zero();
    xs.iter()
        .map(|&x| {
            sum = sum + x;
            sum_sq = sum_sq + x * x;
            count = count + T::one();
            let mean = sum / count;
            (sum_sq / count - mean * mean).max(T::zero()).sqrt()
        })
        .collect()
}

/// Percentage of accepted proposals. `0.0` for an empty run.
pub fn acceptance_percent(accepted: usize, n_iterations: usize) -> f64 {
    if n_iterations == 0 {
        0.0
    } else {
        100.0 * accepted as f64 / n_iterations as f64
    }
}

/// `|H(t) - H(0)|` for every entry of an energy trace.
pub fn energy_drift(energy: &Array1<f64>) -> Array1<f64> {
    match energy.get(0) {
        Some(&h0) => energy.mapv(|h| (h - h0).abs()),
        None => Array1::zeros(0),
    }
}

/// Largest entry of [`energy_drift`], or `None` for an empty trace or one containing
/// `NaN`.
pub fn max_energy_drift(energy: &Array1<f64>) -> Option<f64> {
    energy_drift(energy).max().ok().copied()
}

/**
Normalized autocorrelation `ρ(0), …, ρ(n_lags)` of a series, computed with a
zero-padded FFT.

Lags beyond `xs.len() - 1` are dropped. A constant series has no variance to normalize
by and is reported as perfectly correlated at every lag.

```rust
use verlet_mcmc::diagnostics::autocorrelation;

let alternating: Vec<f64> = (0..100).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
let rho = autocorrelation(&alternating, 2);
assert!((rho[0] - 1.0).abs() < 1e-12);
assert!(rho[1] < -0.9);
assert!(rho[2] > 0.9);
```
*/
pub fn autocorrelation(xs: &[f64], n_lags: usize) -> Vec<f64> {
    let n = xs.len();
    if n == 0 {
        return Vec::new();
    }
    let n_out = n_lags.min(n - 1) + 1;
    let mean = xs.iter().sum::<f64>() / n as f64;

    let m = (2 * n).next_power_of_two();
    let mut buffer: Vec<Complex<f64>> = xs
        .iter()
        .map(|&x| Complex::new(x - mean, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(m)
        .collect();

    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_forward(m).process(&mut buffer);
    for c in buffer.iter_mut() {
        *c = Complex::new(c.norm_sqr(), 0.0);
    }
    planner.plan_fft_inverse(m).process(&mut buffer);

    let c0 = buffer[0].re;
    if c0 <= 0.0 {
        return vec![1.0; n_out];
    }
    buffer[..n_out].iter().map(|c| c.re / c0).collect()
}
