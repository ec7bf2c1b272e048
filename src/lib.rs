pub mod config;
pub mod core;
pub mod diagnostics;
pub mod distributions;
pub mod error;
pub mod hamiltonian;
pub mod hmc;
pub mod integrator;
pub mod inverse_cdf;
pub mod markov;
pub mod math;
pub mod metropolis_hastings;
pub mod proposal;
pub mod sweep;
