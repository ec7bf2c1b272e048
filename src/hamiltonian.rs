//! Potential and kinetic energies of the models sampled with Hamiltonian Monte Carlo.
//!
//! A model is a pure mathematical object: every method is deterministic, side-effect free
//! and uses closed-form derivatives. The only randomness is [`Hamiltonian::sample_momentum`],
//! which draws from the caller's generator.
//!
//! The position distribution is `exp(-U(q))` and the momentum distribution is
//! `exp(-K(p))` with `K(p) = pᵀ M⁻¹ p / 2` for a diagonal mass matrix `M`.

use ndarray::{arr1, arr2, Array1, Array2};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::{ensure_positive, Result, SamplerError};

/// Energies and gradients of a separable Hamiltonian `H(p, q) = U(q) + K(p)`.
pub trait Hamiltonian {
    /// Dimension of `p` and `q`.
    fn dim(&self) -> usize;

    /// `U(q) = -ln π(q)` up to an additive constant.
    fn potential_energy(&self, q: &Array1<f64>) -> f64;

    /// `dU/dq`.
    fn potential_gradient(&self, q: &Array1<f64>) -> Array1<f64>;

    /// `K(p) = pᵀ M⁻¹ p / 2`.
    fn kinetic_energy(&self, p: &Array1<f64>) -> f64;

    /// `dK/dp = M⁻¹ p`.
    fn kinetic_gradient(&self, p: &Array1<f64>) -> Array1<f64>;

    /// Draws a momentum from the distribution `exp(-K(p))`.
    fn sample_momentum<R: Rng + ?Sized>(&self, rng: &mut R) -> Array1<f64>;

    /// Total energy `U(q) + K(p)`.
    fn hamiltonian(&self, p: &Array1<f64>, q: &Array1<f64>) -> f64 {
        self.potential_energy(q) + self.kinetic_energy(p)
    }
}

/// A diagonal mass matrix and the Gaussian kinetic energy it induces.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagonalMass {
    masses: Array1<f64>,
}

impl DiagonalMass {
    pub fn new(masses: &[f64]) -> Result<Self> {
        if masses.is_empty() {
            return Err(SamplerError::invalid("mass", 0.0, "needs at least one entry"));
        }
        for &m in masses {
            ensure_positive("mass", m)?;
        }
        Ok(Self {
            masses: Array1::from(masses.to_vec()),
        })
    }

    pub fn masses(&self) -> &Array1<f64> {
        &self.masses
    }

    pub fn energy(&self, p: &Array1<f64>) -> f64 {
        p.iter()
            .zip(self.masses.iter())
            .map(|(p, m)| p * p / (2.0 * m))
            .sum()
    }

    pub fn gradient(&self, p: &Array1<f64>) -> Array1<f64> {
        p / &self.masses
    }

    /// `p_i ~ N(0, sqrt(m_i))`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Array1<f64> {
        self.masses
            .mapv(|m| m.sqrt() * rng.sample::<f64, _>(StandardNormal))
    }
}

/// One-dimensional normal target `N(0, sigma)` with `U(q) = q² / (2σ²)`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnivariateNormal {
    sigma: f64,
    mass: DiagonalMass,
}

impl UnivariateNormal {
    pub fn new(sigma: f64, mass: f64) -> Result<Self> {
        ensure_positive("sigma", sigma)?;
        Ok(Self {
            sigma,
            mass: DiagonalMass::new(&[mass])?,
        })
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl Hamiltonian for UnivariateNormal {
    fn dim(&self) -> usize {
        1
    }

    fn potential_energy(&self, q: &Array1<f64>) -> f64 {
        q[0] * q[0] / (2.0 * self.sigma * self.sigma)
    }

    fn potential_gradient(&self, q: &Array1<f64>) -> Array1<f64> {
        arr1(&[q[0] / (self.sigma * self.sigma)])
    }

    fn kinetic_energy(&self, p: &Array1<f64>) -> f64 {
        self.mass.energy(p)
    }

    fn kinetic_gradient(&self, p: &Array1<f64>) -> Array1<f64> {
        self.mass.gradient(p)
    }

    fn sample_momentum<R: Rng + ?Sized>(&self, rng: &mut R) -> Array1<f64> {
        self.mass.sample(rng)
    }
}

/// Zero-mean bivariate normal target with standard deviations `sigma1`, `sigma2` and
/// correlation `gamma`.
///
/// With `Σ = [[σ1², γσ1σ2], [γσ1σ2, σ2²]]` the potential is `U(q) = qᵀ Σ⁻¹ q / 2`,
/// expanded in closed form:
///
/// ```text
/// U(q)     = (q1²/σ1² + q2²/σ2² - 2γ q1 q2 / (σ1σ2)) / (2(1 - γ²))
/// dU/dq1   = (q1/σ1² - γ q2 / (σ1σ2)) / (1 - γ²)
/// dU/dq2   = (q2/σ2² - γ q1 / (σ1σ2)) / (1 - γ²)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BivariateNormal {
    sigma1: f64,
    sigma2: f64,
    gamma: f64,
    mass: DiagonalMass,
}

impl BivariateNormal {
    pub fn new(sigma1: f64, sigma2: f64, gamma: f64, masses: [f64; 2]) -> Result<Self> {
        ensure_positive("sigma1", sigma1)?;
        ensure_positive("sigma2", sigma2)?;
        if !(gamma.is_finite() && gamma.abs() < 1.0) {
            return Err(SamplerError::invalid(
                "gamma",
                gamma,
                "correlation must lie strictly between -1 and 1",
            ));
        }
        Ok(Self {
            sigma1,
            sigma2,
            gamma,
            mass: DiagonalMass::new(&masses)?,
        })
    }

    pub fn covariance(&self) -> Array2<f64> {
        let off = self.gamma * self.sigma1 * self.sigma2;
        arr2(&[
            [self.sigma1 * self.sigma1, off],
            [off, self.sigma2 * self.sigma2],
        ])
    }

    fn one_minus_gamma_sq(&self) -> f64 {
        1.0 - self.gamma * self.gamma
    }
}

impl Hamiltonian for BivariateNormal {
    fn dim(&self) -> usize {
        2
    }

    fn potential_energy(&self, q: &Array1<f64>) -> f64 {
        let (s1, s2, g) = (self.sigma1, self.sigma2, self.gamma);
        let quad = q[0] * q[0] / (s1 * s1) + q[1] * q[1] / (s2 * s2)
            - 2.0 * g * q[0] * q[1] / (s1 * s2);
        quad / (2.0 * self.one_minus_gamma_sq())
    }

    fn potential_gradient(&self, q: &Array1<f64>) -> Array1<f64> {
        let (s1, s2, g) = (self.sigma1, self.sigma2, self.gamma);
        let scale = self.one_minus_gamma_sq();
        arr1(&[
            (q[0] / (s1 * s1) - g * q[1] / (s1 * s2)) / scale,
            (q[1] / (s2 * s2) - g * q[0] / (s1 * s2)) / scale,
        ])
    }

    fn kinetic_energy(&self, p: &Array1<f64>) -> f64 {
        self.mass.energy(p)
    }

    fn kinetic_gradient(&self, p: &Array1<f64>) -> Array1<f64> {
        self.mass.gradient(p)
    }

    fn sample_momentum<R: Rng + ?Sized>(&self, rng: &mut R) -> Array1<f64> {
        self.mass.sample(rng)
    }
}

/// The shipped models as one tagged type, so a run (or a sweep of runs) can pick its
/// model from data.
#[derive(Debug, Clone, PartialEq)]
pub enum Model {
    Univariate(UnivariateNormal),
    Bivariate(BivariateNormal),
}

impl From<UnivariateNormal> for Model {
    fn from(model: UnivariateNormal) -> Self {
        Model::Univariate(model)
    }
}

impl From<BivariateNormal> for Model {
    fn from(model: BivariateNormal) -> Self {
        Model::Bivariate(model)
    }
}

impl Hamiltonian for Model {
    fn dim(&self) -> usize {
        match self {
            Model::Univariate(m) => m.dim(),
            Model::Bivariate(m) => m.dim(),
        }
    }

    fn potential_energy(&self, q: &Array1<f64>) -> f64 {
        match self {
            Model::Univariate(m) => m.potential_energy(q),
            Model::Bivariate(m) => m.potential_energy(q),
        }
    }

    fn potential_gradient(&self, q: &Array1<f64>) -> Array1<f64> {
        match self {
            Model::Univariate(m) => m.potential_gradient(q),
            Model::Bivariate(m) => m.potential_gradient(q),
        }
    }

    fn kinetic_energy(&self, p: &Array1<f64>) -> f64 {
        match self {
            Model::Univariate(m) => m.kinetic_energy(p),
            Model::Bivariate(m) => m.kinetic_energy(p),
        }
    }

    fn kinetic_gradient(&self, p: &Array1<f64>) -> Array1<f64> {
        match self {
            Model::Univariate(m) => m.kinetic_gradient(p),
            Model::Bivariate(m) => m.kinetic_gradient(p),
        }
    }

    fn sample_momentum<R: Rng + ?Sized>(&self, rng: &mut R) -> Array1<f64> {
        match self {
            Model::Univariate(m) => m.sample_momentum(rng),
            Model::Bivariate(m) => m.sample_momentum(rng),
        }
    }
}
