/*!
The sampler seam shared by Metropolis–Hastings and HMC, and the loop that drives it.

A [`MarkovChain`] performs one iteration per [`MarkovChain::step`] call and reports the
outcome as a [`Transition`]. [`run_chain`] and [`run_chain_progress`] call `step` exactly
`n_samples` times and record every retained state, whether it is a newly accepted
proposal or a repetition of the current state after a rejection.

If a step fails, the run stops at that iteration and returns the rows recorded so far
together with [`RunStatus::Diverged`].
*/

use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{s, Array1, Array2};

use crate::diagnostics::{acceptance_percent, cummean, cumsigma, AcceptanceWindow, RunningMoments};
use crate::error::{Result, SamplerError};

/// Width of the acceptance window shown in progress messages.
const ACCEPT_WINDOW: usize = 100;

/// The outcome of one iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub accepted: bool,
    /// Acceptance probability `α ∈ [0, 1]` of this iteration's proposal.
    pub acceptance_prob: f64,
    /// Energy of the retained state.
    pub energy: f64,
    /// Momentum of the retained phase-space point, for samplers that have one.
    pub momentum: Option<Array1<f64>>,
}

pub trait MarkovChain {
    /// Performs one iteration. After it returns `Ok`, [`MarkovChain::current_state`]
    /// is the state retained at this iteration.
    fn step(&mut self) -> Result<Transition>;

    fn current_state(&self) -> &Array1<f64>;
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Completed,
    /// The step at `iteration` failed; rows `0..iteration` were recorded.
    Diverged {
        iteration: usize,
        error: SamplerError,
    },
}

/// The record of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutput {
    /// Retained positions, shape `[n_iterations, dim]`.
    pub positions: Array2<f64>,
    /// Retained momenta, same shape as `positions`, for HMC runs.
    pub momenta: Option<Array2<f64>>,
    /// Energy of the retained state per iteration.
    pub energy: Array1<f64>,
    /// Acceptance probability of each iteration's proposal.
    pub acceptance_probs: Array1<f64>,
    pub accepted: usize,
    pub status: RunStatus,
}

impl ChainOutput {
    /// Number of recorded iterations.
    pub fn len(&self) -> usize {
        self.positions.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dim(&self) -> usize {
        self.positions.ncols()
    }

    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn acceptance_percent(&self) -> f64 {
        acceptance_percent(self.accepted, self.len())
    }

    /// The recorded values of coordinate `i`.
    pub fn coordinate(&self, i: usize) -> Vec<f64> {
        self.positions.column(i).to_vec()
    }

    /// Running mean of coordinate `i`.
    pub fn cummean(&self, i: usize) -> Vec<f64> {
        cummean(&self.coordinate(i))
    }

    /// Running standard deviation of coordinate `i`.
    pub fn cumsigma(&self, i: usize) -> Vec<f64> {
        cumsigma(&self.coordinate(i))
    }
}

/// Preallocated storage for a run of known length.
struct ChainRecorder {
    positions: Array2<f64>,
    momenta: Option<Array2<f64>>,
    energy: Array1<f64>,
    acceptance_probs: Array1<f64>,
    accepted: usize,
    len: usize,
}

impl ChainRecorder {
    fn new(n_samples: usize, dim: usize) -> Self {
        Self {
            positions: Array2::zeros((n_samples, dim)),
            momenta: None,
            energy: Array1::zeros(n_samples),
            acceptance_probs: Array1::zeros(n_samples),
            accepted: 0,
            len: 0,
        }
    }

    fn record(&mut self, state: &Array1<f64>, transition: Transition) {
        let i = self.len;
        self.positions.row_mut(i).assign(state);
        if let Some(p) = transition.momentum {
            let shape = self.positions.dim();
            self.momenta
                .get_or_insert_with(|| Array2::zeros(shape))
                .row_mut(i)
                .assign(&p);
        }
        self.energy[i] = transition.energy;
        self.acceptance_probs[i] = transition.acceptance_prob;
        if transition.accepted {
            self.accepted += 1;
        }
        self.len += 1;
    }

    fn finish(self, status: RunStatus) -> ChainOutput {
        let n = self.len;
        ChainOutput {
            positions: self.positions.slice(s![..n, ..]).to_owned(),
            momenta: self.momenta.map(|m| m.slice(s![..n, ..]).to_owned()),
            energy: self.energy.slice(s![..n]).to_owned(),
            acceptance_probs: self.acceptance_probs.slice(s![..n]).to_owned(),
            accepted: self.accepted,
            status,
        }
    }
}

/// Runs `n_samples` iterations of `chain` and records every retained state.
pub fn run_chain<M: MarkovChain>(chain: &mut M, n_samples: usize) -> ChainOutput {
    let mut recorder = ChainRecorder::new(n_samples, chain.current_state().len());
    for i in 0..n_samples {
        match chain.step() {
            Ok(transition) => recorder.record(chain.current_state(), transition),
            Err(error) => return recorder.finish(RunStatus::Diverged { iteration: i, error }),
        }
    }
    recorder.finish(RunStatus::Completed)
}

pub(crate) fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:8} {bar:40.white} ETA {eta:3} | {msg}")
        .map(|style| style.progress_chars("=>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Like [`run_chain`], reporting on `pb`. The message shows the acceptance rate over
/// the last 100 iterations and the running mean of the first coordinate.
pub fn run_chain_with_progress<M: MarkovChain>(
    chain: &mut M,
    n_samples: usize,
    pb: &ProgressBar,
) -> ChainOutput {
    let dim = chain.current_state().len();
    let mut recorder = ChainRecorder::new(n_samples, dim);
    let mut window = AcceptanceWindow::new(ACCEPT_WINDOW);
    let mut moments = RunningMoments::new(dim);

    pb.set_length(n_samples as u64);
    for i in 0..n_samples {
        let transition = match chain.step() {
            Ok(transition) => transition,
            Err(error) => {
                pb.abandon_with_message(format!("diverged at iteration {i}: {error}"));
                return recorder.finish(RunStatus::Diverged { iteration: i, error });
            }
        };
        window.push(transition.accepted);
        moments.push(chain.current_state());
        recorder.record(chain.current_state(), transition);

        pb.inc(1);
        pb.set_message(format!(
            "p(accept)≈{:.2} mean≈{:.3}",
            window.rate(),
            moments.mean()[0]
        ));
    }
    pb.finish_with_message("Done!");
    recorder.finish(RunStatus::Completed)
}

/// [`run_chain_with_progress`] on a fresh progress bar prefixed with `prefix`.
pub fn run_chain_progress<M: MarkovChain>(
    chain: &mut M,
    n_samples: usize,
    prefix: &str,
) -> ChainOutput {
    let pb = ProgressBar::new(n_samples as u64);
    pb.set_style(progress_style());
    pb.set_prefix(prefix.to_string());
    run_chain_with_progress(chain, n_samples, &pb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    /// Walks `+1` per step, rejecting every third proposal, and fails at `fail_at`.
    struct Counter {
        state: Array1<f64>,
        calls: usize,
        fail_at: Option<usize>,
    }

    impl MarkovChain for Counter {
        fn step(&mut self) -> Result<Transition> {
            let call = self.calls;
            self.calls += 1;
            if Some(call) == self.fail_at {
                return Err(SamplerError::NumericInstability { step: 3 });
            }
            let accepted = call % 3 != 2;
            if accepted {
                self.state += 1.0;
            }
            Ok(Transition {
                accepted,
                acceptance_prob: if accepted { 1.0 } else { 0.0 },
                energy: self.state[0],
                momentum: Some(arr1(&[-(call as f64)])),
            })
        }

        fn current_state(&self) -> &Array1<f64> {
            &self.state
        }
    }

    fn counter(fail_at: Option<usize>) -> Counter {
        Counter {
            state: arr1(&[0.0]),
            calls: 0,
            fail_at,
        }
    }

    #[test]
    fn test_run_chain_records_every_iteration() {
        let out = run_chain(&mut counter(None), 6);
        assert!(out.is_completed());
        assert_eq!(out.len(), 6);
        assert_eq!(out.coordinate(0), vec![1.0, 2.0, 2.0, 3.0, 4.0, 4.0]);
        assert_eq!(out.accepted, 4);
        assert_eq!(out.energy, arr1(&[1.0, 2.0, 2.0, 3.0, 4.0, 4.0]));
        let momenta = out.momenta.as_ref().unwrap();
        assert_eq!(momenta[[5, 0]], -5.0);
        assert!((out.acceptance_percent() - 400.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_run_chain_stops_on_divergence() {
        let out = run_chain(&mut counter(Some(4)), 10);
        assert_eq!(
            out.status,
            RunStatus::Diverged {
                iteration: 4,
                error: SamplerError::NumericInstability { step: 3 },
            }
        );
        assert_eq!(out.len(), 4);
        assert_eq!(out.energy.len(), 4);
        assert_eq!(out.momenta.unwrap().nrows(), 4);
    }

    #[test]
    fn test_progress_matches_plain_run() {
        let plain = run_chain(&mut counter(None), 50);
        let pb = ProgressBar::hidden();
        let with_progress = run_chain_with_progress(&mut counter(None), 50, &pb);
        assert_eq!(plain, with_progress);
        assert!(pb.is_finished());
    }

    #[test]
    fn test_cumulative_views() {
        let out = run_chain(&mut counter(None), 3);
        assert_eq!(out.cummean(0), vec![1.0, 1.5, 5.0 / 3.0]);
        assert_eq!(out.cumsigma(0)[0], 0.0);
    }
}
