//! Error type shared by every sampler in the crate.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplerError {
    /// A configuration or model parameter is outside its admissible range.
    /// Raised before any iteration runs.
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// The integrator produced a non-finite position, momentum or energy.
    /// `step` is the integration step (within one trajectory) at which it happened.
    #[error("numeric instability at integration step {step}: non-finite phase-space value")]
    NumericInstability { step: usize },

    /// Two arrays that must agree in shape do not.
    #[error("dimension mismatch: expected {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// An iterative computation did not reach its tolerance.
    #[error("no convergence after {iterations} iterations")]
    NoConvergence { iterations: usize },
}

pub type Result<T> = std::result::Result<T, SamplerError>;

impl SamplerError {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        SamplerError::InvalidParameter {
            name,
            value,
            reason,
        }
    }
}

/// Fails with [`SamplerError::InvalidParameter`] unless `value` is finite and `> 0`.
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SamplerError::invalid(name, value, "must be finite and positive"))
    }
}
